use crate::{
    fragments::FragmentCache,
    routes::{errors::ErrorPage, requires_login},
    template_utils::render,
};
use rocket::{http::uri::Origin, response::Redirect, State};
use rocket_dyn_templates::{Metadata, Template};
use serde::Serialize;
use serde_json::json;
use yatube_models::{
    db_conn::DbConn,
    listings::{GroupListing, Listing, PostCard},
    pagination::Page,
    users::User,
};

/// A listing along with its rendered post list.
#[derive(Serialize)]
pub struct ListingPage<'a, L> {
    #[serde(flatten)]
    pub listing: &'a L,
    pub post_list: String,
}

/// The post list of a listing page, taken from the fragment cache when possible.
pub fn cached_post_list(
    metadata: &Metadata<'_>,
    fragments: &FragmentCache,
    cache_id: &str,
    page: &Page<PostCard>,
) -> Result<String, ErrorPage> {
    fragments
        .get_or_render(cache_id, || {
            metadata
                .render("posts/includes/post_list", json!({ "items": &page.items }))
                .map(|(_, html)| html)
        })
        .ok_or_else(|| ErrorPage::internal("Couldn't render the post list"))
}

#[get("/?<page>")]
pub fn index(
    page: Option<String>,
    conn: DbConn,
    user: Option<User>,
    metadata: Metadata<'_>,
    fragments: &State<FragmentCache>,
) -> Result<Template, ErrorPage> {
    let listing = Listing::index(&conn, page.as_deref())?;
    let post_list = cached_post_list(&metadata, fragments, &listing.cache_id, &listing.page)?;
    Ok(render(
        "posts/index",
        user.as_ref(),
        ListingPage {
            listing: &listing,
            post_list,
        },
    ))
}

#[get("/group/<slug>?<page>")]
pub fn group(
    slug: String,
    page: Option<String>,
    conn: DbConn,
    user: Option<User>,
    metadata: Metadata<'_>,
    fragments: &State<FragmentCache>,
) -> Result<Template, ErrorPage> {
    let listing = GroupListing::build(&conn, &slug, page.as_deref())?;
    let post_list = cached_post_list(
        &metadata,
        fragments,
        &listing.listing.cache_id,
        &listing.listing.page,
    )?;
    Ok(render(
        "posts/group_list",
        user.as_ref(),
        ListingPage {
            listing: &listing,
            post_list,
        },
    ))
}

#[get("/follow?<page>")]
pub fn feed(
    page: Option<String>,
    conn: DbConn,
    user: User,
    metadata: Metadata<'_>,
    fragments: &State<FragmentCache>,
) -> Result<Template, ErrorPage> {
    let listing = Listing::feed(&conn, &user, page.as_deref())?;
    let post_list = cached_post_list(&metadata, fragments, &listing.cache_id, &listing.page)?;
    Ok(render(
        "posts/follow",
        Some(&user),
        ListingPage {
            listing: &listing,
            post_list,
        },
    ))
}

#[get("/follow", rank = 2)]
pub fn feed_auth(uri: &Origin<'_>) -> Redirect {
    requires_login(uri)
}
