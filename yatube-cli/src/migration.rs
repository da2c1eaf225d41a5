use clap::{App, ArgMatches, SubCommand};

use yatube_models::{migrations, Connection};

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("migration")
        .about("Manage migrations")
        .subcommand(SubCommand::with_name("run").about("Run migrations"))
        .subcommand(
            SubCommand::with_name("status").about("Tell whether some migrations are pending"),
        )
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("run", Some(_)) => run_(conn),
        ("status", Some(_)) => status(conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn run_(conn: &Connection) {
    migrations::run_pending_migrations(conn).expect("Failed to run migrations")
}

fn status(conn: &Connection) {
    if migrations::is_pending(conn).expect("Couldn't read the migration state") {
        println!("Some migrations are pending, run `ytb migration run`.");
    } else {
        println!("The database is up to date.");
    }
}
