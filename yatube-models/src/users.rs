use crate::{db_conn::DbConn, schema::users, Connection, Error, Result};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use rocket::{
    http::Status,
    outcome::{try_outcome, IntoOutcome},
    request::{self, FromRequest, Request},
};
use serde::Serialize;

#[derive(Queryable, Identifiable, Clone, Debug, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Default, Insertable)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hashed_password: String,
    pub creation_date: NaiveDateTime,
}

pub const AUTH_COOKIE: &str = "user_id";

impl User {
    insert!(users, NewUser);
    get!(users);
    find_by!(users, find_by_username, username as &str);

    pub fn list_all(conn: &Connection) -> Result<Vec<User>> {
        users::table
            .order(users::username.asc())
            .load::<User>(conn)
            .map_err(Error::from)
    }

    /// First and last name joined by a space, possibly empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// The name shown to other users.
    pub fn name(&self) -> String {
        let full_name = self.full_name();
        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name
        }
    }

    pub fn hash_pass(pass: &str) -> Result<String> {
        bcrypt::hash(pass, 10).map_err(Error::from)
    }

    pub fn auth(&self, pass: &str) -> bool {
        bcrypt::verify(pass, &self.hashed_password).unwrap_or(false)
    }

    pub fn login(conn: &Connection, username: &str, password: &str) -> Result<User> {
        match User::find_by_username(conn, username) {
            Ok(user) if user.auth(password) => Ok(user),
            Ok(_) => Err(Error::NotFound),
            Err(e) => {
                // keep the response time close to the one of a wrong password
                if let Ok(other) = User::last(conn) {
                    other.auth(password);
                }
                Err(e)
            }
        }
    }

    pub fn set_password(&self, conn: &Connection, pass: &str) -> Result<()> {
        diesel::update(self)
            .set(users::hashed_password.eq(User::hash_pass(pass)?))
            .execute(conn)?;
        Ok(())
    }

    pub fn is_following(&self, conn: &Connection, author_id: i32) -> Result<bool> {
        use crate::schema::follows;
        follows::table
            .filter(follows::user_id.eq(self.id))
            .filter(follows::author_id.eq(author_id))
            .count()
            .get_result::<i64>(conn)
            .map_err(Error::from)
            .map(|r| r > 0)
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<User, ()> {
        let conn = try_outcome!(request.guard::<DbConn>().await);
        request
            .cookies()
            .get_private(AUTH_COOKIE)
            .and_then(|cookie| cookie.value().parse().ok())
            .and_then(|id| User::get(&*conn, id).ok())
            .or_forward(Status::Unauthorized)
    }
}

impl NewUser {
    /// Creates a new local user, refusing an already taken username.
    pub fn new_local(
        conn: &Connection,
        username: String,
        first_name: String,
        last_name: String,
        email: String,
        hashed_password: String,
    ) -> Result<User> {
        if User::find_by_username(conn, &username).is_ok() {
            return Err(Error::AlreadyExists);
        }

        User::insert(
            conn,
            NewUser {
                username,
                first_name,
                last_name,
                email,
                hashed_password,
                creation_date: Utc::now().naive_utc(),
            },
        )
    }
}
