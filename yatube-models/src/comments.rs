use crate::{posts::Post, schema::comments, users::User, Connection, Error, Result};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Queryable, Identifiable, Clone, Debug, PartialEq, Serialize)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub created: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub created: NaiveDateTime,
}

impl Comment {
    insert!(comments, NewComment);
    get!(comments);

    pub fn list_for_post(conn: &Connection, post: &Post) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::post_id.eq(post.id))
            .order((comments::created.desc(), comments::id.desc()))
            .load::<Comment>(conn)
            .map_err(Error::from)
    }

    pub fn count_for_post(conn: &Connection, post: &Post) -> Result<i64> {
        comments::table
            .filter(comments::post_id.eq(post.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn page_for_post(
        conn: &Connection,
        post: &Post,
        (min, max): (i64, i64),
    ) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::post_id.eq(post.id))
            .order((comments::created.desc(), comments::id.desc()))
            .offset(min)
            .limit(max - min)
            .load::<Comment>(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    /// Leaves a comment from `author` under a post.
    pub fn add(
        conn: &Connection,
        author: Option<&User>,
        post_id: i32,
        text: &str,
    ) -> Result<Comment> {
        let post = Post::get(conn, post_id)?;
        let author = author.ok_or_else(|| {
            warn!(post = post.id, "Rejected an anonymous comment");
            Error::Unauthorized
        })?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidValue);
        }

        let comment = Comment::insert(
            conn,
            NewComment {
                post_id: post.id,
                author_id: author.id,
                text: text.to_owned(),
                created: Utc::now().naive_utc(),
            },
        )?;
        info!(post = post.id, author = %author.username, "New comment");
        Ok(comment)
    }
}
