use crate::{schema::post_groups, Connection, Error, Result};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::Serialize;
use std::fmt;

#[derive(Queryable, Identifiable, Clone, Debug, PartialEq, Serialize)]
#[table_name = "post_groups"]
pub struct Group {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Insertable)]
#[table_name = "post_groups"]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

pub const TITLE_MAX_LENGTH: usize = 200;
pub const SLUG_MAX_LENGTH: usize = 255;

impl Group {
    insert!(post_groups, NewGroup);
    get!(post_groups);
    find_by!(post_groups, find_by_slug, slug as &str);

    pub fn list(conn: &Connection) -> Result<Vec<Group>> {
        post_groups::table
            .order(post_groups::title.asc())
            .load::<Group>(conn)
            .map_err(Error::from)
    }

    /// Checks the length limits and slug uniqueness before inserting.
    pub fn create(
        conn: &Connection,
        title: String,
        slug: String,
        description: String,
    ) -> Result<Group> {
        if title.trim().is_empty() || title.chars().count() > TITLE_MAX_LENGTH {
            return Err(Error::InvalidValue);
        }
        if !is_valid_slug(&slug) {
            return Err(Error::InvalidValue);
        }
        if Group::find_by_slug(conn, &slug).is_ok() {
            return Err(Error::AlreadyExists);
        }
        Group::insert(
            conn,
            NewGroup {
                title,
                slug,
                description,
            },
        )
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= SLUG_MAX_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{tests::db, Connection as Conn};
    use diesel::Connection;

    pub(crate) fn fill_database(conn: &Conn) -> Vec<Group> {
        vec![
            Group::create(
                conn,
                "Cats".to_owned(),
                "cats".to_owned(),
                "All about cats".to_owned(),
            )
            .unwrap(),
            Group::create(
                conn,
                "Dogs".to_owned(),
                "dogs".to_owned(),
                "All about dogs".to_owned(),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn find_by_slug() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let groups = fill_database(&conn);
            assert_eq!(Group::find_by_slug(&conn, "dogs").unwrap(), groups[1]);
            assert!(matches!(
                Group::find_by_slug(&conn, "missing"),
                Err(Error::NotFound)
            ));
            assert_eq!(groups[0].to_string(), "Cats");
            Ok(())
        });
    }

    #[test]
    fn create_checks() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            fill_database(&conn);
            let same_slug = Group::create(&conn, "Cats 2".into(), "cats".into(), String::new());
            assert!(matches!(same_slug, Err(Error::AlreadyExists)));
            let bad_slug = Group::create(&conn, "Birds".into(), "bi rds".into(), String::new());
            assert!(matches!(bad_slug, Err(Error::InvalidValue)));
            let long_title = Group::create(&conn, "x".repeat(201), "long".into(), String::new());
            assert!(matches!(long_title, Err(Error::InvalidValue)));
            assert_eq!(Group::list(&conn).unwrap().len(), 2);
            Ok(())
        });
    }
}
