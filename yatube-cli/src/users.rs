use clap::{App, Arg, ArgMatches, SubCommand};

use std::io::{self, Write};
use yatube_models::{users::*, Connection};

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("users")
        .about("Manage users")
        .subcommand(
            SubCommand::with_name("new")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .alias("username")
                        .takes_value(true)
                        .help("The username of the new user"),
                )
                .arg(
                    Arg::with_name("first-name")
                        .short("f")
                        .long("first-name")
                        .takes_value(true)
                        .help("The first name of the new user"),
                )
                .arg(
                    Arg::with_name("last-name")
                        .short("l")
                        .long("last-name")
                        .takes_value(true)
                        .help("The last name of the new user"),
                )
                .arg(
                    Arg::with_name("email")
                        .short("e")
                        .long("email")
                        .takes_value(true)
                        .help("Email address of the new user"),
                )
                .arg(
                    Arg::with_name("password")
                        .short("p")
                        .long("password")
                        .takes_value(true)
                        .help("The password of the new user"),
                )
                .about("Create a new user"),
        )
        .subcommand(
            SubCommand::with_name("reset-password")
                .arg(
                    Arg::with_name("name")
                        .short("u")
                        .long("user")
                        .alias("username")
                        .takes_value(true)
                        .help("The username of the user whose password is reset"),
                )
                .arg(
                    Arg::with_name("password")
                        .short("p")
                        .long("password")
                        .takes_value(true)
                        .help("The new password"),
                )
                .about("Reset the password of a user"),
        )
        .subcommand(SubCommand::with_name("list").about("List every user"))
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("new", Some(x)) => new(x, conn),
        ("reset-password", Some(x)) => reset_password(x, conn),
        ("list", Some(_)) => list(conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn read_password(args: &ArgMatches<'_>) -> String {
    args.value_of("password").map(String::from).unwrap_or_else(|| {
        print!("Password: ");
        io::stdout().flush().expect("Couldn't flush STDOUT");
        rpassword::read_password().expect("Couldn't read your password.")
    })
}

fn new<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let username = args
        .value_of("name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Username"));
    let first_name = args
        .value_of("first-name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("First name"));
    let last_name = args
        .value_of("last-name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Last name"));
    let email = args
        .value_of("email")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Email address"));
    let password = read_password(args);

    let user = NewUser::new_local(
        conn,
        username,
        first_name,
        last_name,
        email,
        User::hash_pass(&password).expect("Couldn't hash the password"),
    )
    .expect("Couldn't save the new user");
    println!("User {} created with id {}", user.username, user.id);
}

fn reset_password<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let username = args
        .value_of("name")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Username"));
    let user = User::find_by_username(conn, &username).expect("This user doesn't exist");
    let password = read_password(args);
    user.set_password(conn, &password)
        .expect("Couldn't update the password");
}

fn list(conn: &Connection) {
    for user in User::list_all(conn).expect("Couldn't list users") {
        println!("{}\t{}\t{}", user.id, user.username, user.full_name());
    }
}
