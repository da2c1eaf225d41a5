use clap::{App, Arg, ArgMatches, SubCommand};

use yatube_models::{groups::Group, Connection};

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("groups")
        .about("Manage the communities posts can be published in")
        .subcommand(
            SubCommand::with_name("new")
                .arg(
                    Arg::with_name("title")
                        .short("t")
                        .long("title")
                        .takes_value(true)
                        .help("The title of the group"),
                )
                .arg(
                    Arg::with_name("slug")
                        .short("s")
                        .long("slug")
                        .takes_value(true)
                        .help("The identifier used in the address of the group"),
                )
                .arg(
                    Arg::with_name("description")
                        .short("d")
                        .long("description")
                        .takes_value(true)
                        .help("What the group is about"),
                )
                .about("Create a new group"),
        )
        .subcommand(SubCommand::with_name("list").about("List every group"))
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("new", Some(x)) => new(x, conn),
        ("list", Some(_)) => list(conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn new<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let title = args
        .value_of("title")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Title"));
    let slug = args
        .value_of("slug")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Slug"));
    let description = args.value_of("description").unwrap_or("").to_string();

    let group = Group::create(conn, title, slug, description).expect("Couldn't create the group");
    println!("Group {} available at /group/{}/", group, group.slug);
}

fn list(conn: &Connection) {
    for group in Group::list(conn).expect("Couldn't list groups") {
        println!("{}\t{}\t{}", group.id, group.slug, group.title);
    }
}
