#![allow(clippy::too_many_arguments)]
#[macro_use]
extern crate rocket;

use crate::fragments::FragmentCache;
use rocket::{figment::Figment, Build, Rocket};
use rocket_dyn_templates::Template;
use std::process::exit;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use yatube_models::{
    db_conn::{init_pool, DbPool},
    migrations::is_pending,
    CONFIG,
};

mod fragments;
mod routes;
mod template_utils;

/// Everything the application serves, ready to be launched.
pub(crate) fn init_rocket(figment: Figment, pool: DbPool, fragments: FragmentCache) -> Rocket<Build> {
    rocket::custom(figment)
        .mount(
            "/",
            routes![
                routes::timelines::index,
                routes::timelines::group,
                routes::timelines::feed,
                routes::timelines::feed_auth,
                routes::user::details,
                routes::user::follow,
                routes::user::follow_auth,
                routes::user::unfollow,
                routes::user::unfollow_auth,
                routes::user::new,
                routes::user::create,
                routes::posts::details,
                routes::posts::new,
                routes::posts::new_auth,
                routes::posts::create,
                routes::posts::create_auth,
                routes::posts::edit,
                routes::posts::edit_auth,
                routes::posts::update,
                routes::posts::update_auth,
                routes::comments::create_on_post,
                routes::comments::details,
                routes::comments::details_auth,
                routes::comments::create,
                routes::comments::create_auth,
                routes::session::new,
                routes::session::create,
                routes::session::delete,
                routes::session::password_change,
                routes::session::password_change_auth,
                routes::session::update_password,
                routes::session::update_password_auth,
                routes::session::password_change_done,
                routes::session::password_change_done_auth,
                routes::about::author,
                routes::about::tech,
                routes::static_files,
            ],
        )
        .register(
            "/",
            catchers![
                routes::errors::forbidden,
                routes::errors::not_found,
                routes::errors::server_error,
            ],
        )
        .manage(pool)
        .manage(fragments)
        .attach(Template::fairing())
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pool = match init_pool(&CONFIG.database_url, CONFIG.db_max_size, CONFIG.db_min_idle) {
        Some(pool) => pool,
        None => {
            error!("Couldn't connect to the database at {}", CONFIG.database_url);
            exit(1);
        }
    };
    match pool.get().map_err(yatube_models::Error::from).and_then(|conn| is_pending(&*conn)) {
        Ok(false) => {}
        Ok(true) => panic!(
            "The database is not up to date. Run migrations with the command\n\
             \tytb migration run\n\
             before starting the server."
        ),
        Err(e) => {
            error!("Couldn't check the database state: {}", e);
            exit(1);
        }
    }

    let settings = match &CONFIG.rocket {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid server configuration: {:?}", e);
            exit(1);
        }
    };
    if settings.secret_key.is_none() {
        warn!("ROCKET_SECRET_KEY is not set, sessions won't survive a restart");
    }

    let fragments = FragmentCache::from_config(&CONFIG.fragment_cache);
    info!(
        "Starting on {}:{}, serving {}",
        settings.address, settings.port, CONFIG.base_url
    );
    let rocket = init_rocket(settings.figment(&CONFIG.template_dir), pool, fragments);
    if let Err(e) = rocket::execute(rocket.launch()) {
        error!("Server stopped: {}", e);
        exit(1);
    }
}
