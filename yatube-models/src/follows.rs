use crate::{schema::follows, users::User, Connection, Error, Result};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::Serialize;
use tracing::info;

#[derive(Clone, Queryable, Identifiable, Debug, PartialEq, Serialize)]
pub struct Follow {
    pub id: i32,
    pub user_id: i32,
    pub author_id: i32,
}

#[derive(Insertable)]
#[table_name = "follows"]
pub struct NewFollow {
    pub user_id: i32,
    pub author_id: i32,
}

impl Follow {
    insert!(follows, NewFollow);
    get!(follows);
    find_by!(follows, find_by_pair, user_id as i32, author_id as i32);
    list_by!(follows, list_for_user, user_id as i32);

    /// Whether the viewer, if any, is subscribed to `author`.
    pub fn exists_for(conn: &Connection, viewer: Option<&User>, author: &User) -> Result<bool> {
        match viewer {
            Some(viewer) => viewer.is_following(conn, author.id),
            None => Ok(false),
        }
    }

    /// Subscribes `user` to the posts of `author_username`.
    ///
    /// Following someone twice is not an error: the existing subscription is returned.
    pub fn follow(conn: &Connection, user: Option<&User>, author_username: &str) -> Result<Follow> {
        let user = user.ok_or(Error::Unauthorized)?;
        let author = User::find_by_username(conn, author_username)?;
        let new = NewFollow {
            user_id: user.id,
            author_id: author.id,
        };

        // a concurrent request may have inserted the same pair
        #[cfg(feature = "sqlite")]
        let inserted = diesel::insert_or_ignore_into(follows::table)
            .values(&new)
            .execute(conn)?;
        #[cfg(feature = "postgres")]
        let inserted = diesel::insert_into(follows::table)
            .values(&new)
            .on_conflict_do_nothing()
            .execute(conn)?;

        if inserted > 0 {
            info!(follower = %user.username, author = %author.username, "New subscription");
        }
        Follow::find_by_pair(conn, user.id, author.id)
    }

    pub fn unfollow(conn: &Connection, user: Option<&User>, author_username: &str) -> Result<()> {
        let user = user.ok_or(Error::Unauthorized)?;
        let author = User::find_by_username(conn, author_username)?;
        let follow = Follow::find_by_pair(conn, user.id, author.id)?;
        diesel::delete(&follow).execute(conn)?;
        info!(follower = %user.username, author = %author.username, "Subscription removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::db, users::tests as user_tests};
    use diesel::Connection;

    #[test]
    fn follow_then_unfollow() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let (author, reader) = (&users[0], &users[1]);
            assert!(!reader.is_following(&conn, author.id).unwrap());

            let follow = Follow::follow(&conn, Some(reader), "author").unwrap();
            assert_eq!(follow.user_id, reader.id);
            assert_eq!(follow.author_id, author.id);
            assert!(reader.is_following(&conn, author.id).unwrap());
            assert!(!author.is_following(&conn, reader.id).unwrap());
            assert!(Follow::exists_for(&conn, Some(reader), author).unwrap());

            Follow::unfollow(&conn, Some(reader), "author").unwrap();
            assert!(!reader.is_following(&conn, author.id).unwrap());
            assert!(Follow::list_for_user(&conn, reader.id).unwrap().is_empty());
            Ok(())
        });
    }

    #[test]
    fn follow_twice_keeps_one_row() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let first = Follow::follow(&conn, Some(&users[1]), "author").unwrap();
            let second = Follow::follow(&conn, Some(&users[1]), "author").unwrap();
            assert_eq!(first, second);
            assert_eq!(Follow::list_for_user(&conn, users[1].id).unwrap().len(), 1);
            Ok(())
        });
    }

    #[test]
    fn follow_keeps_a_row_inserted_meanwhile() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let existing = Follow::insert(
                &conn,
                NewFollow {
                    user_id: users[1].id,
                    author_id: users[0].id,
                },
            )
            .unwrap();
            let follow = Follow::follow(&conn, Some(&users[1]), "author").unwrap();
            assert_eq!(follow, existing);
            assert_eq!(Follow::list_for_user(&conn, users[1].id).unwrap().len(), 1);
            Ok(())
        });
    }

    #[test]
    fn self_follow_is_allowed() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            Follow::follow(&conn, Some(&users[0]), "author").unwrap();
            assert!(users[0].is_following(&conn, users[0].id).unwrap());
            Ok(())
        });
    }

    #[test]
    fn the_pair_is_unique_in_storage() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let pair = || NewFollow {
                user_id: users[1].id,
                author_id: users[0].id,
            };
            Follow::insert(&conn, pair()).unwrap();
            assert!(Follow::insert(&conn, pair()).is_err());
            Ok(())
        });
    }

    #[test]
    fn errors() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            assert!(matches!(
                Follow::follow(&conn, None, "author"),
                Err(Error::Unauthorized)
            ));
            assert!(matches!(
                Follow::follow(&conn, Some(&users[1]), "ghost"),
                Err(Error::NotFound)
            ));
            assert!(matches!(
                Follow::unfollow(&conn, Some(&users[1]), "ghost"),
                Err(Error::NotFound)
            ));
            assert!(matches!(
                Follow::unfollow(&conn, Some(&users[1]), "author"),
                Err(Error::NotFound)
            ));
            assert!(matches!(
                Follow::unfollow(&conn, None, "author"),
                Err(Error::Unauthorized)
            ));
            assert!(!Follow::exists_for(&conn, None, &users[0]).unwrap());
            Ok(())
        });
    }
}
