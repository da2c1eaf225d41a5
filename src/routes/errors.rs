use crate::template_utils::render;
use rocket::{
    http::Status,
    response::{self, Responder},
    Request,
};
use rocket_dyn_templates::Template;
use serde_json::json;
use tracing::{error, warn};
use yatube_models::{users::User, Error};

/// A failed request, answered by the matching catcher.
#[derive(Debug)]
pub struct ErrorPage(Status);

impl ErrorPage {
    /// For failures that are not database ones, such as a template that cannot be rendered.
    pub fn internal(what: &str) -> ErrorPage {
        error!("{}", what);
        ErrorPage(Status::InternalServerError)
    }

    pub fn status(&self) -> Status {
        self.0
    }
}

impl From<Error> for ErrorPage {
    fn from(err: Error) -> ErrorPage {
        match err {
            Error::NotFound => ErrorPage(Status::NotFound),
            Error::Unauthorized | Error::Forbidden => {
                warn!("{}", err);
                ErrorPage(Status::Forbidden)
            }
            err => {
                error!("{:?}", err);
                ErrorPage(Status::InternalServerError)
            }
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ErrorPage {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'o> {
        Err(self.0)
    }
}

#[catch(403)]
pub async fn forbidden(req: &Request<'_>) -> Template {
    let user = req.guard::<User>().await.succeeded();
    render("errors/403", user.as_ref(), json!({ "title": "Access denied" }))
}

#[catch(404)]
pub async fn not_found(req: &Request<'_>) -> Template {
    let user = req.guard::<User>().await.succeeded();
    render(
        "errors/404",
        user.as_ref(),
        json!({
            "title": "Page not found",
            "path": req.uri().path().to_string(),
        }),
    )
}

#[catch(500)]
pub fn server_error() -> Template {
    render("errors/500", None, json!({ "title": "Server error" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ErrorPage::from(Error::NotFound).status(), Status::NotFound);
        assert_eq!(
            ErrorPage::from(Error::Unauthorized).status(),
            Status::Forbidden
        );
        assert_eq!(ErrorPage::from(Error::Forbidden).status(), Status::Forbidden);
        assert_eq!(
            ErrorPage::from(Error::InvalidValue).status(),
            Status::InternalServerError
        );
    }
}
