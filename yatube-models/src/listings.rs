//! Everything a page needs to be rendered, assembled from the database.

use crate::{
    cache::{cache_key, Scope},
    comments::Comment,
    follows::Follow,
    groups::Group,
    pagination::{clean_page_number, Page, Paginator, COMMENTS_PER_PAGE, POSTS_PER_PAGE},
    posts::Post,
    users::User,
    Connection, Result,
};
use serde::Serialize;

/// Number of characters of a post shown in the title of its page.
pub const POST_TITLE_LENGTH: usize = 30;

#[derive(Clone, Debug, Serialize)]
pub struct PostCard {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

impl PostCard {
    pub fn from_post(conn: &Connection, post: Post) -> Result<PostCard> {
        Ok(PostCard {
            author: post.get_author(conn)?,
            group: post.get_group(conn)?,
            post,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CommentCard {
    pub comment: Comment,
    pub author: User,
}

impl CommentCard {
    pub fn from_comment(conn: &Connection, comment: Comment) -> Result<CommentCard> {
        Ok(CommentCard {
            author: comment.get_author(conn)?,
            comment,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Listing<T> {
    pub title: String,
    pub page: Page<T>,
    /// Key of the cached post list of this page.
    pub cache_id: String,
}

/// Runs the count, clamps the requested page and loads the cards of that page.
fn post_page<C, L>(
    conn: &Connection,
    raw_page: Option<&str>,
    count: C,
    load: L,
) -> Result<Page<PostCard>>
where
    C: FnOnce() -> Result<i64>,
    L: FnOnce((i64, i64)) -> Result<Vec<Post>>,
{
    let paginator = Paginator::new(count()?, POSTS_PER_PAGE);
    let number = paginator.validate_number(clean_page_number(raw_page));
    let posts = load(paginator.limits(number))?;
    paginator
        .page(number, posts)
        .try_map(|post| PostCard::from_post(conn, post))
}

impl Listing<PostCard> {
    pub fn index(conn: &Connection, raw_page: Option<&str>) -> Result<Self> {
        let page = post_page(
            conn,
            raw_page,
            || Post::count_all(conn),
            |limits| Post::page_all(conn, limits),
        )?;
        Ok(Listing {
            title: "Latest site updates".to_owned(),
            cache_id: cache_key(Scope::Global, page.number),
            page,
        })
    }

    /// Posts of the authors `follower` is subscribed to.
    pub fn feed(conn: &Connection, follower: &User, raw_page: Option<&str>) -> Result<Self> {
        let page = post_page(
            conn,
            raw_page,
            || Post::count_feed(conn, follower),
            |limits| Post::page_feed(conn, follower, limits),
        )?;
        Ok(Listing {
            title: "Subscriptions".to_owned(),
            cache_id: cache_key(Scope::Feed(follower.id), page.number),
            page,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupListing {
    #[serde(flatten)]
    pub listing: Listing<PostCard>,
    pub group: Group,
}

impl GroupListing {
    pub fn build(conn: &Connection, slug: &str, raw_page: Option<&str>) -> Result<Self> {
        let group = Group::find_by_slug(conn, slug)?;
        let page = post_page(
            conn,
            raw_page,
            || Post::count_for_group(conn, &group),
            |limits| Post::page_for_group(conn, &group, limits),
        )?;
        Ok(GroupListing {
            listing: Listing {
                title: format!("Posts in community {}", group),
                cache_id: cache_key(Scope::Group(group.id), page.number),
                page,
            },
            group,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ProfileListing {
    #[serde(flatten)]
    pub listing: Listing<PostCard>,
    pub author: User,
    /// Whether the viewer follows this author. Always false for anonymous viewers.
    pub following: bool,
}

impl ProfileListing {
    pub fn build(
        conn: &Connection,
        username: &str,
        viewer: Option<&User>,
        raw_page: Option<&str>,
    ) -> Result<Self> {
        let author = User::find_by_username(conn, username)?;
        let page = post_page(
            conn,
            raw_page,
            || Post::count_for_author(conn, &author),
            |limits| Post::page_for_author(conn, &author, limits),
        )?;
        Ok(ProfileListing {
            listing: Listing {
                title: format!("Profile of {}", author.name()),
                cache_id: cache_key(Scope::Author(author.id), page.number),
                page,
            },
            following: Follow::exists_for(conn, viewer, &author)?,
            author,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PostDetail {
    pub title: String,
    pub post: PostCard,
    /// Number of posts of the author, shown next to their name.
    pub author_posts_count: i64,
    pub comments: Page<CommentCard>,
}

impl PostDetail {
    pub fn build(conn: &Connection, post_id: i32, raw_page: Option<&str>) -> Result<Self> {
        let post = Post::get(conn, post_id)?;
        let paginator = Paginator::new(Comment::count_for_post(conn, &post)?, COMMENTS_PER_PAGE);
        let number = paginator.validate_number(clean_page_number(raw_page));
        let comments = paginator
            .page(
                number,
                Comment::page_for_post(conn, &post, paginator.limits(number))?,
            )
            .try_map(|comment| CommentCard::from_comment(conn, comment))?;
        let card = PostCard::from_post(conn, post)?;
        Ok(PostDetail {
            title: format!("Post {}", card.post.short_text(POST_TITLE_LENGTH)),
            author_posts_count: Post::count_for_author(conn, &card.author)?,
            post: card,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        groups::tests as group_tests,
        posts::{tests as post_tests, NewPostData},
        tests::db,
        users::tests as user_tests,
        Error,
    };
    use diesel::Connection;

    #[test]
    fn index_pages() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let posts = post_tests::publish(&conn, &users[0], None, 15);

            let first = Listing::index(&conn, None).unwrap();
            assert_eq!(first.title, "Latest site updates");
            assert_eq!(first.page.items.len(), 10);
            assert_eq!(first.page.items[0].post, posts[14]);
            assert_eq!(first.page.items[0].author, users[0]);
            assert_eq!(first.cache_id, cache_key(Scope::Global, 1));

            let second = Listing::index(&conn, Some("2")).unwrap();
            assert_eq!(second.page.items.len(), 5);
            assert_eq!(second.cache_id, cache_key(Scope::Global, 2));

            let clamped = Listing::index(&conn, Some("100")).unwrap();
            assert_eq!(clamped.page.number, 2);
            assert_eq!(clamped.cache_id, second.cache_id);
            assert_eq!(Listing::index(&conn, Some("junk")).unwrap().page.number, 1);
            Ok(())
        });
    }

    #[test]
    fn group_listing() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let groups = group_tests::fill_database(&conn);
            let grouped = post_tests::publish(&conn, &users[0], Some(&groups[0]), 1);
            post_tests::publish(&conn, &users[0], None, 1);

            let listing = GroupListing::build(&conn, "cats", None).unwrap();
            assert_eq!(listing.listing.title, "Posts in community Cats");
            assert_eq!(listing.group, groups[0]);
            assert_eq!(listing.listing.page.items.len(), 1);
            assert_eq!(listing.listing.page.items[0].post, grouped[0]);
            assert_eq!(
                listing.listing.page.items[0].group,
                Some(groups[0].clone())
            );
            assert_eq!(
                listing.listing.cache_id,
                cache_key(Scope::Group(groups[0].id), 1)
            );

            assert!(matches!(
                GroupListing::build(&conn, "missing", None),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }

    #[test]
    fn profile_listing() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let (author, reader) = (&users[0], &users[1]);
            post_tests::publish(&conn, author, None, 3);

            let anonymous = ProfileListing::build(&conn, "author", None, None).unwrap();
            assert_eq!(anonymous.listing.title, "Profile of Leo Tolstoy");
            assert_eq!(anonymous.listing.page.count, 3);
            assert!(!anonymous.following);

            Follow::follow(&conn, Some(reader), "author").unwrap();
            let followed = ProfileListing::build(&conn, "author", Some(reader), None).unwrap();
            assert!(followed.following);

            let by_username = ProfileListing::build(&conn, "reader", Some(author), None).unwrap();
            assert_eq!(by_username.listing.title, "Profile of reader");
            assert!(!by_username.following);

            assert!(matches!(
                ProfileListing::build(&conn, "ghost", None, None),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }

    #[test]
    fn feed_listing() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let (author, reader, other) = (&users[0], &users[1], &users[2]);
            Follow::follow(&conn, Some(reader), "author").unwrap();
            let post = Post::create(
                &conn,
                Some(author),
                NewPostData {
                    text: "Only for subscribers to see".to_owned(),
                    ..NewPostData::default()
                },
            )
            .unwrap();

            let feed = Listing::feed(&conn, reader, None).unwrap();
            assert_eq!(feed.title, "Subscriptions");
            assert_eq!(feed.page.items.len(), 1);
            assert_eq!(feed.page.items[0].post, post);
            assert_eq!(feed.cache_id, cache_key(Scope::Feed(reader.id), 1));

            let empty = Listing::feed(&conn, other, None).unwrap();
            assert!(empty.page.items.is_empty());
            assert_ne!(empty.cache_id, feed.cache_id);
            Ok(())
        });
    }

    #[test]
    fn post_detail() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let post = Post::create(
                &conn,
                Some(&users[0]),
                NewPostData {
                    text: "A rather long text that goes on well past thirty characters".to_owned(),
                    ..NewPostData::default()
                },
            )
            .unwrap();
            for i in 0..12 {
                Comment::add(&conn, Some(&users[1]), post.id, &format!("comment {}", i)).unwrap();
            }

            let detail = PostDetail::build(&conn, post.id, None).unwrap();
            assert_eq!(detail.title, "Post A rather long text that goes o");
            assert_eq!(detail.post.post, post);
            assert_eq!(detail.author_posts_count, 1);
            assert_eq!(detail.comments.items.len(), 10);
            assert_eq!(detail.comments.num_pages, 2);
            assert_eq!(detail.comments.items[0].author, users[1]);

            let last = PostDetail::build(&conn, post.id, Some("2")).unwrap();
            assert_eq!(last.comments.items.len(), 2);

            assert!(matches!(
                PostDetail::build(&conn, post.id + 1, None),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }

    #[test]
    fn serialized_listing_is_flat() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);
            let groups = group_tests::fill_database(&conn);
            post_tests::publish(&conn, &users[0], Some(&groups[1]), 1);
            let listing = GroupListing::build(&conn, "dogs", None).unwrap();
            let json = serde_json::to_value(&listing).unwrap();
            assert_eq!(json["title"], "Posts in community Dogs");
            assert_eq!(json["group"]["slug"], "dogs");
            assert_eq!(json["page"]["items"][0]["author"]["username"], "author");
            assert!(json["cache_id"].is_string());
            Ok(())
        });
    }
}
