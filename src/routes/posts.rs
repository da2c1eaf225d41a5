use crate::{
    routes::{errors::ErrorPage, requires_login, slashed, RespondOrRedirect},
    template_utils::{field_error, form_errors, render},
};
use rocket::{form::Form, http::uri::Origin, response::Redirect};
use rocket_dyn_templates::Template;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;
use validator::{Validate, ValidationError};
use yatube_models::{
    db_conn::DbConn,
    groups::Group,
    listings::PostDetail,
    posts::{NewPostData, Post},
    users::User,
    Connection, Error,
};

const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

#[derive(Default, FromForm, Validate, Serialize)]
pub struct PostForm {
    #[field(default = String::new())]
    #[validate(custom(function = "not_blank", message = "This field is required."))]
    pub text: String,
    /// Id of the group, empty for none.
    #[field(default = String::new())]
    pub group: String,
}

impl PostForm {
    fn from_post(post: &Post) -> PostForm {
        PostForm {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    /// `Err` when the group is not a number. Unknown ids are rejected when saving.
    fn group_id(&self) -> Result<Option<i32>, ()> {
        let group = self.group.trim();
        if group.is_empty() {
            Ok(None)
        } else {
            group.parse::<i32>().map(Some).map_err(|_| ())
        }
    }
}

#[derive(Serialize)]
struct PostFormPage<'a> {
    title: String,
    form: &'a PostForm,
    errors: HashMap<String, Vec<String>>,
    groups: Vec<Group>,
    is_edit: bool,
    post_id: Option<i32>,
}

fn render_form(
    conn: &Connection,
    user: &User,
    form: &PostForm,
    errors: HashMap<String, Vec<String>>,
    editing: Option<i32>,
) -> Result<Template, ErrorPage> {
    Ok(render(
        "posts/create_post",
        Some(user),
        PostFormPage {
            title: match editing {
                Some(id) => format!("Edit post #{}", id),
                None => "New post".to_owned(),
            },
            form,
            errors,
            groups: Group::list(conn)?,
            is_edit: editing.is_some(),
            post_id: editing,
        },
    ))
}

/// Checks a submitted post form, giving back the chosen group id.
fn clean(form: &PostForm) -> Result<Option<i32>, HashMap<String, Vec<String>>> {
    let mut errors = match form.validate() {
        Ok(()) => HashMap::new(),
        Err(e) => form_errors(&e),
    };
    let group_id = form.group_id();
    if group_id.is_err() {
        errors.insert("group".to_owned(), vec![INVALID_GROUP.to_owned()]);
    }
    match group_id {
        Ok(group_id) if errors.is_empty() => Ok(group_id),
        _ => Err(errors),
    }
}

#[get("/posts/<id>?<page>")]
pub fn details(
    id: i32,
    page: Option<String>,
    conn: DbConn,
    user: Option<User>,
) -> Result<Template, ErrorPage> {
    render_details(&conn, id, page.as_deref(), user.as_ref(), "", HashMap::new())
}

/// The page of a post, with its comments and a comment form.
pub fn render_details(
    conn: &Connection,
    id: i32,
    page: Option<&str>,
    user: Option<&User>,
    comment_text: &str,
    errors: HashMap<String, Vec<String>>,
) -> Result<Template, ErrorPage> {
    let detail = PostDetail::build(conn, id, page)?;
    let is_author = user.map(|u| detail.post.post.is_author(u)).unwrap_or(false);
    let mut ctx = serde_json::to_value(&detail)
        .map_err(|e| ErrorPage::internal(&format!("Couldn't serialize post {}: {}", id, e)))?;
    ctx["is_author"] = json!(is_author);
    ctx["form"] = json!({ "text": comment_text });
    ctx["errors"] = json!(errors);
    Ok(render("posts/post_detail", user, ctx))
}

#[get("/create")]
pub fn new(user: User, conn: DbConn) -> Result<Template, ErrorPage> {
    render_form(&conn, &user, &PostForm::default(), HashMap::new(), None)
}

#[get("/create", rank = 2)]
pub fn new_auth(uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[post("/create", data = "<form>")]
pub fn create(
    form: Form<PostForm>,
    user: User,
    conn: DbConn,
) -> Result<RespondOrRedirect, ErrorPage> {
    let form = form.into_inner();
    let group_id = match clean(&form) {
        Ok(group_id) => group_id,
        Err(errors) => return Ok(render_form(&conn, &user, &form, errors, None)?.into()),
    };

    let data = NewPostData {
        text: form.text.clone(),
        group_id,
        image: None,
    };
    match Post::create(&conn, Some(&user), data) {
        Ok(_) => Ok(Redirect::to(slashed(uri!(super::user::details(
            username = &user.username,
            page = _
        ))))
        .into()),
        Err(Error::InvalidValue) => {
            let errors = field_error("text", "This field is required.");
            Ok(render_form(&conn, &user, &form, errors, None)?.into())
        }
        Err(Error::NotFound) => {
            let errors = field_error("group", INVALID_GROUP);
            Ok(render_form(&conn, &user, &form, errors, None)?.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[post("/create", rank = 2)]
pub fn create_auth(uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[get("/posts/<id>/edit")]
pub fn edit(id: i32, user: User, conn: DbConn) -> Result<RespondOrRedirect, ErrorPage> {
    let post = Post::get(&conn, id)?;
    if !post.is_author(&user) {
        return Ok(Redirect::to(slashed(uri!(details(id = post.id, page = _)))).into());
    }
    Ok(render_form(&conn, &user, &PostForm::from_post(&post), HashMap::new(), Some(post.id))?.into())
}

#[get("/posts/<_id>/edit", rank = 2)]
pub fn edit_auth(_id: i32, uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}

#[post("/posts/<id>/edit", data = "<form>")]
pub fn update(
    id: i32,
    form: Form<PostForm>,
    user: User,
    conn: DbConn,
) -> Result<RespondOrRedirect, ErrorPage> {
    let post = Post::get(&conn, id)?;
    if !post.is_author(&user) {
        warn!(post = post.id, editor = %user.username, "Edit attempted by someone else than the author");
        return Ok(Redirect::to(slashed(uri!(details(id = post.id, page = _)))).into());
    }

    let form = form.into_inner();
    let group_id = match clean(&form) {
        Ok(group_id) => group_id,
        Err(errors) => return Ok(render_form(&conn, &user, &form, errors, Some(post.id))?.into()),
    };

    match Post::update_by(&conn, Some(&user), post.id, &form.text, group_id) {
        Ok(post) => Ok(Redirect::to(slashed(uri!(edit(id = post.id)))).into()),
        Err(Error::Forbidden) => Ok(Redirect::to(slashed(uri!(details(id = post.id, page = _)))).into()),
        Err(Error::InvalidValue) => {
            let errors = field_error("text", "This field is required.");
            Ok(render_form(&conn, &user, &form, errors, Some(post.id))?.into())
        }
        Err(Error::NotFound) => {
            let errors = field_error("group", INVALID_GROUP);
            Ok(render_form(&conn, &user, &form, errors, Some(post.id))?.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[post("/posts/<_id>/edit", rank = 2)]
pub fn update_auth(_id: i32, uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}
