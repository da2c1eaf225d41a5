use crate::{
    routes::{errors::ErrorPage, posts::not_blank, requires_login, slashed, RespondOrRedirect},
    template_utils::{field_error, form_errors},
};
use rocket::{form::Form, http::uri::Origin, response::Redirect};
use rocket_dyn_templates::Template;
use std::collections::HashMap;
use validator::Validate;
use yatube_models::{comments::Comment, db_conn::DbConn, posts::Post, users::User, Connection, Error};

#[derive(Default, FromForm, Validate)]
pub struct CommentForm {
    #[field(default = String::new())]
    #[validate(custom(function = "not_blank", message = "This field is required."))]
    pub text: String,
}

/// Saves a comment, or shows the post again with what went wrong.
fn add(
    conn: &Connection,
    id: i32,
    user: Option<&User>,
    form: CommentForm,
) -> Result<RespondOrRedirect, ErrorPage> {
    // the post must exist and the user be known before the form is looked at
    let post = Post::get(conn, id)?;
    let user = user.ok_or(Error::Unauthorized)?;

    if let Err(errors) = form.validate() {
        let errors = form_errors(&errors);
        return Ok(super::posts::render_details(conn, post.id, None, Some(user), &form.text, errors)?.into());
    }
    match Comment::add(conn, Some(user), post.id, &form.text) {
        Ok(_) => Ok(Redirect::to(slashed(uri!(super::posts::details(id = post.id, page = _)))).into()),
        Err(Error::InvalidValue) => {
            let errors = field_error("text", "This field is required.");
            Ok(super::posts::render_details(conn, post.id, None, Some(user), &form.text, errors)?.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Comment form of the post page. Anonymous users are refused, not redirected.
#[post("/posts/<id>", data = "<form>")]
pub fn create_on_post(
    id: i32,
    form: Form<CommentForm>,
    user: Option<User>,
    conn: DbConn,
) -> Result<RespondOrRedirect, ErrorPage> {
    add(&conn, id, user.as_ref(), form.into_inner())
}

/// The post page, for logged in users only.
#[get("/posts/<id>/comment?<page>")]
pub fn details(
    id: i32,
    page: Option<String>,
    user: User,
    conn: DbConn,
) -> Result<Template, ErrorPage> {
    super::posts::render_details(&conn, id, page.as_deref(), Some(&user), "", HashMap::new())
}

#[get("/posts/<_id>/comment", rank = 2)]
pub fn details_auth(_id: i32, uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[post("/posts/<id>/comment", data = "<form>")]
pub fn create(
    id: i32,
    form: Form<CommentForm>,
    user: User,
    conn: DbConn,
) -> Result<RespondOrRedirect, ErrorPage> {
    add(&conn, id, Some(&user), form.into_inner())
}

#[post("/posts/<_id>/comment", rank = 2)]
pub fn create_auth(_id: i32, uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_is_invalid() {
        let form = CommentForm {
            text: " \t".to_owned(),
        };
        let errors = form_errors(&form.validate().unwrap_err());
        assert_eq!(errors["text"], vec!["This field is required.".to_owned()]);
        assert!(CommentForm {
            text: "Thanks!".to_owned()
        }
        .validate()
        .is_ok());
    }
}
