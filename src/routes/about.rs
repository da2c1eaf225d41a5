use crate::template_utils::render;
use rocket_dyn_templates::Template;
use serde_json::json;
use yatube_models::users::User;

#[get("/about/author")]
pub fn author(user: Option<User>) -> Template {
    render(
        "about/author",
        user.as_ref(),
        json!({ "title": "About the author" }),
    )
}

#[get("/about/tech")]
pub fn tech(user: Option<User>) -> Template {
    render(
        "about/tech",
        user.as_ref(),
        json!({ "title": "Technologies" }),
    )
}
