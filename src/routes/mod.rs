use rocket::{
    fs::NamedFile,
    http::{uri::Origin, RawStr},
    response::Redirect,
};
use rocket_dyn_templates::Template;
use std::path::{Path, PathBuf};

/// Where anonymous users are sent when they need to be logged in.
pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Responder)]
pub enum RespondOrRedirect {
    Response(Template),
    Redirect(Redirect),
}

impl From<Template> for RespondOrRedirect {
    fn from(response: Template) -> Self {
        RespondOrRedirect::Response(response)
    }
}

impl From<Redirect> for RespondOrRedirect {
    fn from(redirect: Redirect) -> Self {
        RespondOrRedirect::Redirect(redirect)
    }
}

/// Sends to the login page, which comes back to `origin` once done.
pub fn requires_login(origin: &Origin<'_>) -> Redirect {
    Redirect::to(format!(
        "{}?next={}",
        LOGIN_URL,
        RawStr::new(&origin.to_string()).percent_encode()
    ))
}

/// Links to pages end with a slash, while routes are declared without one.
pub fn slashed(uri: Origin<'_>) -> String {
    let mut link = uri.path().as_str().to_owned();
    if !link.ends_with('/') {
        link.push('/');
    }
    if let Some(query) = uri.query() {
        link.push('?');
        link.push_str(query.as_str());
    }
    link
}

/// Only keeps targets on this site. Browsers read `/\` as `//`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next)
            if next.starts_with('/')
                && !next.starts_with("//")
                && !next.starts_with("/\\")
                && !next.chars().any(char::is_control) =>
        {
            next
        }
        _ => "/",
    }
}

pub mod about;
pub mod comments;
pub mod errors;
pub mod posts;
pub mod session;
pub mod timelines;
pub mod user;

#[get("/static/<file..>", rank = 2)]
pub async fn static_files(file: PathBuf) -> Option<NamedFile> {
    NamedFile::open(Path::new("static/").join(file)).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_stays_on_site() {
        assert_eq!(safe_next(Some("/create/")), "/create/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example/")), "/");
        assert_eq!(safe_next(Some("/\t/evil.example/")), "/");
        assert_eq!(safe_next(Some("/create/?group=1")), "/create/?group=1");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn links_keep_their_slash() {
        let slash = |uri| slashed(Origin::parse(uri).unwrap());
        assert_eq!(slash("/profile/leo"), "/profile/leo/");
        assert_eq!(slash("/posts/3/edit/"), "/posts/3/edit/");
        assert_eq!(slash("/group/cats?page=2"), "/group/cats/?page=2");
    }
}
