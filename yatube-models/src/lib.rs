#![allow(proc_macro_derive_resolution_fallback)] // This can be removed after diesel-1.4

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

use std::fmt;

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("Either feature \"sqlite\" or \"postgres\" must be enabled for this crate.");
#[cfg(all(feature = "sqlite", feature = "postgres"))]
compile_error!("Either feature \"sqlite\" or \"postgres\" must be enabled for this crate.");

#[cfg(feature = "postgres")]
pub type Connection = diesel::PgConnection;

#[cfg(feature = "sqlite")]
pub type Connection = diesel::SqliteConnection;

/// All the possible errors that can be encoutered in this crate
#[derive(Debug)]
pub enum Error {
    AlreadyExists,
    Bcrypt(bcrypt::BcryptError),
    Db(diesel::result::Error),
    Forbidden,
    InvalidValue,
    Migrations(diesel_migrations::RunMigrationsError),
    NotFound,
    Pool(diesel::r2d2::PoolError),
    Unauthorized,
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Bcrypt(err)
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            err => Error::Db(err),
        }
    }
}

impl From<diesel_migrations::RunMigrationsError> for Error {
    fn from(err: diesel_migrations::RunMigrationsError) -> Self {
        Error::Migrations(err)
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Error::Pool(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadyExists => write!(f, "an entry with this identifier already exists"),
            Error::Bcrypt(e) => write!(f, "password hashing error: {}", e),
            Error::Db(e) => write!(f, "database error: {}", e),
            Error::Forbidden => write!(f, "only the owner can do this"),
            Error::InvalidValue => write!(f, "invalid value"),
            Error::Migrations(e) => write!(f, "migration error: {}", e),
            Error::NotFound => write!(f, "not found"),
            Error::Pool(e) => write!(f, "connection pool error: {}", e),
            Error::Unauthorized => write!(f, "authentication required"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Adds a function to a model, that returns the first
/// matching row for a given list of fields.
///
/// Usage:
///
/// ```ignore
/// impl Model {
///     find_by!(model_table, name_of_the_function, field1 as String, field2 as i32);
/// }
///
/// // Get the Model with field1 == "", and field2 == 0
/// Model::name_of_the_function(connection, String::new(), 0);
/// ```
macro_rules! find_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Self> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// List all rows of a model, with field-based filtering.
///
/// Usage:
///
/// ```ignore
/// impl Model {
///     list_by!(model_table, name_of_the_function, field1 as String);
/// }
///
/// // To get all Models with field1 == ""
/// Model::name_of_the_function(connection, String::new());
/// ```
macro_rules! list_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Vec<Self>> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .load::<Self>(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to retrieve a row by ID
///
/// # Usage
///
/// ```ignore
/// impl Model {
///     get!(model_table);
/// }
///
/// // Get the Model with ID 1
/// Model::get(connection, 1);
/// ```
macro_rules! get {
    ($table:ident) => {
        pub fn get(conn: &crate::Connection, id: i32) -> Result<Self> {
            $table::table
                .filter($table::id.eq(id))
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to insert a new row
///
/// # Usage
///
/// ```ignore
/// impl Model {
///     insert!(model_table, NewModelType);
/// }
///
/// // Insert a new row
/// Model::insert(connection, NewModelType::new());
/// ```
macro_rules! insert {
    ($table:ident, $from:ty) => {
        last!($table);

        pub fn insert(conn: &crate::Connection, new: $from) -> Result<Self> {
            diesel::insert_into($table::table)
                .values(new)
                .execute(conn)?;
            Self::last(conn)
        }
    };
}

/// Returns the last row of a table.
///
/// # Usage
///
/// ```ignore
/// impl Model {
///     last!(model_table);
/// }
///
/// // Get the last Model
/// Model::last(connection)
/// ```
macro_rules! last {
    ($table:ident) => {
        pub fn last(conn: &crate::Connection) -> Result<Self> {
            $table::table
                .order_by($table::id.desc())
                .first(conn)
                .map_err(Error::from)
        }
    };
}

pub use config::CONFIG;

#[cfg(test)]
mod tests {
    use crate::{db_conn, migrations, Connection as Conn};
    use diesel::Connection;

    /// A fresh database with every migration applied.
    pub fn db() -> Conn {
        #[cfg(feature = "sqlite")]
        let conn = Conn::establish(":memory:").expect("Couldn't connect to the database");
        #[cfg(feature = "postgres")]
        let conn = Conn::establish(crate::CONFIG.database_url.as_str())
            .expect("Couldn't connect to the database");

        db_conn::prepare(&conn).expect("Couldn't configure the connection");
        migrations::run_pending_migrations(&conn).expect("Couldn't run migrations");
        conn
    }
}

pub mod cache;
pub mod comments;
pub mod config;
pub mod db_conn;
pub mod follows;
pub mod groups;
pub mod listings;
pub mod migrations;
pub mod pagination;
pub mod posts;
pub mod schema;
pub mod users;
