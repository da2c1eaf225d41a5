use crate::{
    fragments::FragmentCache,
    routes::{
        errors::ErrorPage,
        requires_login,
        slashed,
        timelines::{cached_post_list, ListingPage},
        RespondOrRedirect,
    },
    template_utils::{field_error, form_errors, render},
};
use rocket::{form::Form, http::uri::Origin, response::Redirect, State};
use rocket_dyn_templates::{Metadata, Template};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use validator::{validate_email, Validate, ValidationError};
use yatube_models::{
    db_conn::DbConn,
    follows::Follow,
    listings::ProfileListing,
    users::{NewUser, User},
    Error,
};

#[get("/profile/<username>?<page>")]
pub fn details(
    username: String,
    page: Option<String>,
    conn: DbConn,
    account: Option<User>,
    metadata: Metadata<'_>,
    fragments: &State<FragmentCache>,
) -> Result<Template, ErrorPage> {
    let listing = ProfileListing::build(&conn, &username, account.as_ref(), page.as_deref())?;
    let post_list = cached_post_list(
        &metadata,
        fragments,
        &listing.listing.cache_id,
        &listing.listing.page,
    )?;
    Ok(render(
        "posts/profile",
        account.as_ref(),
        ListingPage {
            listing: &listing,
            post_list,
        },
    ))
}

#[get("/profile/<username>/follow")]
pub fn follow(username: String, user: User, conn: DbConn) -> Result<Redirect, ErrorPage> {
    Follow::follow(&conn, Some(&user), &username)?;
    Ok(Redirect::to(slashed(uri!(details(username = username, page = _)))))
}

#[get("/profile/<_username>/follow", rank = 2)]
pub fn follow_auth(_username: String, uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[get("/profile/<username>/unfollow")]
pub fn unfollow(username: String, user: User, conn: DbConn) -> Result<Redirect, ErrorPage> {
    Follow::unfollow(&conn, Some(&user), &username)?;
    Ok(Redirect::to(slashed(uri!(details(username = username, page = _)))))
}

#[get("/profile/<_username>/unfollow", rank = 2)]
pub fn unfollow_auth(_username: String, uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[derive(Default, FromForm, Serialize, Validate)]
#[validate(schema(
    function = "passwords_match",
    skip_on_field_errors = false,
    message = "The two password fields didn't match."
))]
pub struct NewUserForm {
    #[field(default = String::new())]
    pub first_name: String,
    #[field(default = String::new())]
    pub last_name: String,
    #[field(default = String::new())]
    #[validate(
        length(min = 1, max = 150, message = "Enter a username of at most 150 characters."),
        custom(
            function = "validate_username",
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,
    #[field(default = String::new())]
    #[validate(custom(function = "optional_email", message = "Enter a valid email address."))]
    pub email: String,
    #[field(default = String::new())]
    #[serde(skip_serializing)]
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[field(default = String::new())]
    #[serde(skip_serializing)]
    pub password2: String,
}

pub fn passwords_match(form: &NewUserForm) -> Result<(), ValidationError> {
    if form.password1 != form.password2 {
        Err(ValidationError::new("password_mismatch"))
    } else {
        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || "_.@+-".contains(c))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_illegal_char"))
    }
}

fn optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

#[derive(Serialize)]
struct SignupPage<'a> {
    title: &'static str,
    form: &'a NewUserForm,
    errors: HashMap<String, Vec<String>>,
}

fn render_signup(form: &NewUserForm, errors: HashMap<String, Vec<String>>) -> Template {
    render(
        "users/signup",
        None,
        SignupPage {
            title: "Sign up",
            form,
            errors,
        },
    )
}

#[get("/auth/signup")]
pub fn new() -> Template {
    render_signup(&NewUserForm::default(), HashMap::new())
}

#[post("/auth/signup", data = "<form>")]
pub fn create(form: Form<NewUserForm>, conn: DbConn) -> Result<RespondOrRedirect, ErrorPage> {
    let mut form = form.into_inner();
    form.username = form.username.trim().to_owned();
    form.email = form.email.trim().to_owned();
    if let Err(errors) = form.validate() {
        return Ok(render_signup(&form, form_errors(&errors)).into());
    }

    let created = NewUser::new_local(
        &conn,
        form.username.clone(),
        form.first_name.trim().to_owned(),
        form.last_name.trim().to_owned(),
        form.email.clone(),
        User::hash_pass(&form.password1)?,
    );
    match created {
        Ok(user) => {
            info!(user = %user.username, "New user signed up");
            Ok(Redirect::to("/").into())
        }
        Err(Error::AlreadyExists) => {
            let errors = field_error("username", "A user with that username already exists.");
            Ok(render_signup(&form, errors).into())
        }
        Err(e) => Err(e.into()),
    }
}
