//! Read paths over reels and comments: the sampled feed and the two-level
//! comment tree.

use serde::Serialize;

use crate::models::{Comment, Reel};
use crate::store::{Store, StoreResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 4;

/// Author projection attached to each comment in a thread.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub username: String,
    pub profile_picture: String,
}

/// A reply carries its comment fields plus the author projection.
#[derive(Debug, Serialize)]
pub struct ThreadReply {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<CommentAuthor>,
}

/// A top-level comment with its direct replies, oldest reply first.
#[derive(Debug, Serialize)]
pub struct ThreadComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<CommentAuthor>,
    pub replies: Vec<ThreadReply>,
}

/// One page of the sampled feed. `current_page` is advisory metadata: the
/// sample is drawn fresh from the full Published set on every call, so the
/// same page number can return different reels.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub reels: Vec<Reel>,
    pub total: i64,
    pub current_page: i64,
}

/// Top-level comments for a reel (newest first), each with its direct
/// replies (oldest first). Results are assembled in top-level order.
/// A comment with a parent never appears at the top level.
pub fn list_reel_comments(store: &Store, reel_id: &str) -> StoreResult<Vec<ThreadComment>> {
    let top_level = store.list_top_level_comments(reel_id)?;

    let mut threads = Vec::with_capacity(top_level.len());
    for comment in top_level {
        let replies = store
            .list_replies(&comment.id)?
            .into_iter()
            .map(|reply| {
                let author = author_of(store, &reply);
                ThreadReply {
                    comment: reply,
                    author,
                }
            })
            .collect();

        let author = author_of(store, &comment);
        threads.push(ThreadComment {
            comment,
            author,
            replies,
        });
    }

    Ok(threads)
}

fn author_of(store: &Store, comment: &Comment) -> Option<CommentAuthor> {
    store.get_user(&comment.user).ok().map(|user| CommentAuthor {
        username: user.username,
        profile_picture: user.profile_picture,
    })
}

/// Count the Published reels and draw a fresh uniform sample of up to
/// `limit` of them. When fewer than `limit` are published the sample is all
/// of them in random order.
pub fn sample_feed(store: &Store, page: i64, limit: i64) -> StoreResult<FeedPage> {
    let total = store.count_reels_by_status("Published")?;
    let reels = store.sample_published(limit)?;

    Ok(FeedPage {
        reels,
        total,
        current_page: page,
    })
}

/// Parse a raw query value, falling back to `default` when it is missing,
/// non-numeric, or non-positive.
pub fn parse_param(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}
