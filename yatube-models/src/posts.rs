use crate::{
    groups::Group,
    schema::{follows, posts},
    users::User,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Number of characters of the text used when a post is shown as a string.
pub const SHORT_TEXT_LENGTH: usize = 15;

#[derive(Queryable, Identifiable, Clone, Debug, PartialEq, Serialize)]
pub struct Post {
    pub id: i32,
    pub text: String,
    pub created: NaiveDateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub text: String,
    pub created: NaiveDateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

/// What a user submits to publish a post.
#[derive(Clone, Debug, Default)]
pub struct NewPostData {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

impl Post {
    insert!(posts, NewPost);
    get!(posts);

    pub fn list_all(conn: &Connection) -> Result<Vec<Post>> {
        posts::table
            .order((posts::created.desc(), posts::id.desc()))
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_all(conn: &Connection) -> Result<i64> {
        posts::table
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn page_all(conn: &Connection, (min, max): (i64, i64)) -> Result<Vec<Post>> {
        posts::table
            .order((posts::created.desc(), posts::id.desc()))
            .offset(min)
            .limit(max - min)
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn list_for_group(conn: &Connection, group: &Group) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::group_id.eq(group.id))
            .order((posts::created.desc(), posts::id.desc()))
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_for_group(conn: &Connection, group: &Group) -> Result<i64> {
        posts::table
            .filter(posts::group_id.eq(group.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn page_for_group(
        conn: &Connection,
        group: &Group,
        (min, max): (i64, i64),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::group_id.eq(group.id))
            .order((posts::created.desc(), posts::id.desc()))
            .offset(min)
            .limit(max - min)
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn list_for_author(conn: &Connection, author: &User) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author.id))
            .order((posts::created.desc(), posts::id.desc()))
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_for_author(conn: &Connection, author: &User) -> Result<i64> {
        posts::table
            .filter(posts::author_id.eq(author.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn page_for_author(
        conn: &Connection,
        author: &User,
        (min, max): (i64, i64),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author.id))
            .order((posts::created.desc(), posts::id.desc()))
            .offset(min)
            .limit(max - min)
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    /// Posts of every author `follower` is subscribed to.
    ///
    /// The authors are matched with a sub-select, so a post shows up once
    /// whatever the number of follow rows pointing at its author.
    pub fn list_feed(conn: &Connection, follower: &User) -> Result<Vec<Post>> {
        let followed = follows::table
            .filter(follows::user_id.eq(follower.id))
            .select(follows::author_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .order((posts::created.desc(), posts::id.desc()))
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_feed(conn: &Connection, follower: &User) -> Result<i64> {
        let followed = follows::table
            .filter(follows::user_id.eq(follower.id))
            .select(follows::author_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn page_feed(
        conn: &Connection,
        follower: &User,
        (min, max): (i64, i64),
    ) -> Result<Vec<Post>> {
        let followed = follows::table
            .filter(follows::user_id.eq(follower.id))
            .select(follows::author_id);
        posts::table
            .filter(posts::author_id.eq_any(followed))
            .order((posts::created.desc(), posts::id.desc()))
            .offset(min)
            .limit(max - min)
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    pub fn get_group(&self, conn: &Connection) -> Result<Option<Group>> {
        self.group_id.map(|id| Group::get(conn, id)).transpose()
    }

    pub fn is_author(&self, user: &User) -> bool {
        self.author_id == user.id
    }

    /// The first characters of the text, used in titles and admin output.
    pub fn short_text(&self, len: usize) -> String {
        self.text.chars().take(len).collect()
    }

    /// Publishes a post for `author`.
    pub fn create(conn: &Connection, author: Option<&User>, data: NewPostData) -> Result<Post> {
        let author = author.ok_or(Error::Unauthorized)?;
        let text = data.text.trim();
        if text.is_empty() {
            warn!(author = %author.username, "Rejected a post without text");
            return Err(Error::InvalidValue);
        }
        if let Some(group_id) = data.group_id {
            Group::get(conn, group_id)?;
        }

        let post = Post::insert(
            conn,
            NewPost {
                text: text.to_owned(),
                created: Utc::now().naive_utc(),
                author_id: author.id,
                group_id: data.group_id,
                image: data.image,
            },
        )?;
        info!(post = post.id, author = %author.username, "Published a new post");
        Ok(post)
    }

    /// Changes the text and group of a post. Only its author may do so.
    pub fn update_by(
        conn: &Connection,
        editor: Option<&User>,
        post_id: i32,
        text: &str,
        group_id: Option<i32>,
    ) -> Result<Post> {
        let post = Post::get(conn, post_id)?;
        let editor = editor.ok_or(Error::Unauthorized)?;
        if !post.is_author(editor) {
            warn!(post = post.id, editor = %editor.username, "Rejected an edit from someone else than the author");
            return Err(Error::Forbidden);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidValue);
        }
        if let Some(group_id) = group_id {
            Group::get(conn, group_id)?;
        }

        diesel::update(&post)
            .set((posts::text.eq(text), posts::group_id.eq(group_id)))
            .execute(conn)?;
        Post::get(conn, post.id)
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_text(SHORT_TEXT_LENGTH))
    }
}
