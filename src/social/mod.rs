//! Social graph and engagement mutations.
//!
//! Follow/unfollow edits two User records; each save is an independent write
//! and no transaction spans them, so a crash between the two leaves the graph
//! asymmetric. The membership precondition makes a retry safe: reapplying a
//! follow that already landed yields Conflict instead of a duplicate edge.

use crate::store::{Store, StoreError, StoreResult};

/// Make `actor_id` a follower of `target_id`, updating both sides of the
/// edge. Target side is persisted first.
pub fn follow(store: &Store, target_id: &str, actor_id: &str) -> StoreResult<()> {
    let mut target = store.get_user(target_id)?;
    let mut actor = store.get_user(actor_id)?;

    if target.followers.iter().any(|id| id == actor_id) {
        return Err(StoreError::Conflict("Already following".to_string()));
    }

    target.followers.push(actor_id.to_string());
    actor.following.push(target_id.to_string());

    store.update_user(&target)?;
    store.update_user(&actor)?;
    Ok(())
}

/// Remove the follow edge between `actor_id` and `target_id` from both sides.
pub fn unfollow(store: &Store, target_id: &str, actor_id: &str) -> StoreResult<()> {
    let mut target = store.get_user(target_id)?;
    let mut actor = store.get_user(actor_id)?;

    if !target.followers.iter().any(|id| id == actor_id) {
        return Err(StoreError::Conflict(
            "You are not following this user".to_string(),
        ));
    }

    target.followers.retain(|id| id != actor_id);
    actor.following.retain(|id| id != target_id);

    store.update_user(&target)?;
    store.update_user(&actor)?;
    Ok(())
}

/// What a like toggle can apply to.
pub enum LikeTarget {
    Reel,
    Comment,
}

/// Result of a like toggle: whether the like is now present, and the
/// post-mutation size of the like set. Callers must not assume the count
/// grows monotonically.
pub struct ToggleOutcome {
    pub liked: bool,
    pub likes: usize,
}

/// Add `user_id` to the target's like set if absent, remove it if present.
/// Exactly one persistence write either way.
pub fn toggle_like(
    store: &Store,
    target: LikeTarget,
    target_id: &str,
    user_id: &str,
) -> StoreResult<ToggleOutcome> {
    match target {
        LikeTarget::Reel => {
            let mut reel = store.get_reel(target_id)?;
            let liked = toggle(&mut reel.likes, user_id);
            store.update_reel(&reel)?;
            Ok(ToggleOutcome {
                liked,
                likes: reel.likes.len(),
            })
        }
        LikeTarget::Comment => {
            let mut comment = store.get_comment(target_id)?;
            let liked = toggle(&mut comment.likes, user_id);
            store.update_comment(&comment)?;
            Ok(ToggleOutcome {
                liked,
                likes: comment.likes.len(),
            })
        }
    }
}

fn toggle(likes: &mut Vec<String>, user_id: &str) -> bool {
    if likes.iter().any(|id| id == user_id) {
        likes.retain(|id| id != user_id);
        false
    } else {
        likes.push(user_id.to_string());
        true
    }
}
