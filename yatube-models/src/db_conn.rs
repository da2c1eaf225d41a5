use crate::Connection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Error as ConnError, Pool, PooledConnection};
#[cfg(feature = "sqlite")]
use diesel::{connection::SimpleConnection, sqlite::SqliteConnection};
use rocket::{
    http::Status,
    outcome::{try_outcome, Outcome},
    request::{self, FromRequest},
    Request, State,
};
use std::ops::Deref;

pub type DbPool = Pool<ConnectionManager<Connection>>;

/// Applies per-connection settings that the schema relies on.
#[cfg(feature = "sqlite")]
pub fn prepare(conn: &Connection) -> diesel::QueryResult<()> {
    conn.batch_execute("PRAGMA foreign_keys = on;")
}

#[cfg(feature = "postgres")]
pub fn prepare(_conn: &Connection) -> diesel::QueryResult<()> {
    Ok(())
}

#[derive(Debug)]
pub struct PragmaForeignKey;

#[cfg(feature = "sqlite")]
impl CustomizeConnection<SqliteConnection, ConnError> for PragmaForeignKey {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), ConnError> {
        prepare(conn).map_err(ConnError::QueryError)
    }
}

#[cfg(feature = "postgres")]
impl CustomizeConnection<Connection, ConnError> for PragmaForeignKey {
    fn on_acquire(&self, _conn: &mut Connection) -> Result<(), ConnError> {
        Ok(())
    }
}

/// Builds the connection pool described by the configuration.
pub fn init_pool(database_url: &str, max_size: Option<u32>, min_idle: Option<u32>) -> Option<DbPool> {
    let manager = ConnectionManager::<Connection>::new(database_url);
    let mut builder = DbPool::builder()
        .connection_customizer(Box::new(PragmaForeignKey))
        .min_idle(min_idle);
    if let Some(max_size) = max_size {
        builder = builder.max_size(max_size);
    };
    builder.build(manager).ok()
}

// From rocket documentation

// Connection request guard type: a wrapper around an r2d2 pooled connection.
pub struct DbConn(pub PooledConnection<ConnectionManager<Connection>>);

/// Attempts to retrieve a single connection from the managed database pool. If
/// no pool is currently managed, fails with an `InternalServerError` status. If
/// no connections are available, fails with a `ServiceUnavailable` status.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for DbConn {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let pool = try_outcome!(request.guard::<&State<DbPool>>().await);
        match pool.get() {
            Ok(conn) => Outcome::Success(DbConn(conn)),
            Err(_) => Outcome::Error((Status::ServiceUnavailable, ())),
        }
    }
}

// For the convenience of using an &DbConn as an &Connection.
impl Deref for DbConn {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
