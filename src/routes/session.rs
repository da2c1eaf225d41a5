use crate::{
    routes::{errors::ErrorPage, requires_login, safe_next, slashed, RespondOrRedirect},
    template_utils::{field_error, form_errors, render},
};
use rocket::{
    form::Form,
    http::{uri::Origin, Cookie, CookieJar},
    response::Redirect,
};
use rocket_dyn_templates::Template;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};
use validator::{Validate, ValidationError};
use yatube_models::{
    db_conn::DbConn,
    users::{User, AUTH_COOKIE},
};

const INVALID_LOGIN: &str = "Please enter a correct username and password.";

#[derive(Default, FromForm, Serialize)]
pub struct LoginForm {
    #[field(default = String::new())]
    pub username: String,
    #[field(default = String::new())]
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Serialize)]
struct LoginPage<'a> {
    title: &'static str,
    form: &'a LoginForm,
    next: &'a str,
    errors: HashMap<String, Vec<String>>,
}

fn render_login(
    user: Option<&User>,
    form: &LoginForm,
    next: &str,
    errors: HashMap<String, Vec<String>>,
) -> Template {
    render(
        "users/login",
        user,
        LoginPage {
            title: "Log in",
            form,
            next,
            errors,
        },
    )
}

#[get("/auth/login?<next>")]
pub fn new(next: Option<String>, user: Option<User>) -> Template {
    render_login(
        user.as_ref(),
        &LoginForm::default(),
        safe_next(next.as_deref()),
        HashMap::new(),
    )
}

#[post("/auth/login?<next>", data = "<form>")]
pub fn create(
    next: Option<String>,
    form: Form<LoginForm>,
    conn: DbConn,
    cookies: &CookieJar<'_>,
) -> RespondOrRedirect {
    let next = safe_next(next.as_deref());
    match User::login(&conn, form.username.trim(), &form.password) {
        Ok(user) => {
            cookies.add_private(Cookie::new(AUTH_COOKIE, user.id.to_string()));
            info!(user = %user.username, "Logged in");
            Redirect::to(next.to_owned()).into()
        }
        Err(_) => {
            warn!(username = %form.username, "Failed login attempt");
            render_login(None, &form, next, field_error("__all__", INVALID_LOGIN)).into()
        }
    }
}

#[get("/auth/logout")]
pub fn delete(cookies: &CookieJar<'_>) -> Template {
    cookies.remove_private(AUTH_COOKIE);
    render("users/logged_out", None, json!({ "title": "Logged out" }))
}

#[derive(Default, FromForm, Validate)]
#[validate(schema(
    function = "new_passwords_match",
    skip_on_field_errors = false,
    message = "The two password fields didn't match."
))]
pub struct PasswordChangeForm {
    #[field(default = String::new())]
    pub old_password: String,
    #[field(default = String::new())]
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub new_password1: String,
    #[field(default = String::new())]
    pub new_password2: String,
}

pub fn new_passwords_match(form: &PasswordChangeForm) -> Result<(), ValidationError> {
    if form.new_password1 != form.new_password2 {
        Err(ValidationError::new("password_mismatch"))
    } else {
        Ok(())
    }
}

fn render_password_change(user: &User, errors: HashMap<String, Vec<String>>) -> Template {
    render(
        "users/password_change_form",
        Some(user),
        json!({
            "title": "Password change",
            "errors": errors,
        }),
    )
}

#[get("/auth/password_change")]
pub fn password_change(user: User) -> Template {
    render_password_change(&user, HashMap::new())
}

#[get("/auth/password_change", rank = 2)]
pub fn password_change_auth(uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[post("/auth/password_change", data = "<form>")]
pub fn update_password(
    form: Form<PasswordChangeForm>,
    user: User,
    conn: DbConn,
) -> Result<RespondOrRedirect, ErrorPage> {
    let mut errors = match form.validate() {
        Ok(()) => HashMap::new(),
        Err(e) => form_errors(&e),
    };
    if !user.auth(&form.old_password) {
        errors.insert(
            "old_password".to_owned(),
            vec!["Your old password was entered incorrectly. Please enter it again.".to_owned()],
        );
    }
    if !errors.is_empty() {
        return Ok(render_password_change(&user, errors).into());
    }

    user.set_password(&conn, &form.new_password1)?;
    info!(user = %user.username, "Password changed");
    Ok(Redirect::to(slashed(uri!(password_change_done()))).into())
}

#[post("/auth/password_change", rank = 2)]
pub fn update_password_auth(uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[get("/auth/password_change/done")]
pub fn password_change_done(user: User) -> Template {
    render(
        "users/password_change_done",
        Some(&user),
        json!({ "title": "Password changed" }),
    )
}

#[get("/auth/password_change/done", rank = 2)]
pub fn password_change_done_auth(uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}
