use crate::{Connection, Error, Result};
use migrations_internals::{setup_database, MigrationConnection};
use tracing::info;

#[cfg(feature = "sqlite")]
embed_migrations!("migrations/sqlite");

#[cfg(feature = "postgres")]
embed_migrations!("migrations/postgres");

/// Version of the newest migration shipped with this build.
pub const LATEST_MIGRATION: &str = "20211218000005";

pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    info!("Running pending migrations");
    embedded_migrations::run(conn).map_err(Error::from)
}

pub fn is_pending(conn: &Connection) -> Result<bool> {
    setup_database(conn)?;
    let latest_migration = conn.latest_run_migration_version()?;
    Ok(latest_migration.as_deref() != Some(LATEST_MIGRATION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::db;

    #[test]
    fn nothing_pending_after_setup() {
        let conn = db();
        assert!(!is_pending(&conn).unwrap());
        run_pending_migrations(&conn).unwrap();
        assert!(!is_pending(&conn).unwrap());
    }

    #[test]
    fn latest_migration_is_the_newest_directory() {
        for backend in &["sqlite", "postgres"] {
            let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("migrations")
                .join(backend);
            let newest = std::fs::read_dir(&dir)
                .unwrap()
                .map(|entry| entry.unwrap().file_name().into_string().unwrap())
                .max()
                .unwrap();
            let version = newest.split('_').next().unwrap().replace('-', "");
            assert_eq!(version, LATEST_MIGRATION, "in {}", dir.display());
        }
    }
}
