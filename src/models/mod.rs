use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User owns reels and participates in the social graph.
/// `followers`/`following` hold user ids; both sides of an edge are kept in
/// sync by the graph mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub mobile: String,
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub profile_picture: String,
    pub bio: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
}

/// Reel is a short-form video post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reel {
    pub id: String,
    pub user: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub caption: String,
    pub duration: f64,
    pub music: Option<String>,
    pub status: String,
    pub likes: Vec<String>,
    pub shares: Vec<ShareRecord>,
    pub created_at: DateTime<Utc>,
}

/// One share of a reel, appended in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecord {
    pub shared_by: String,
    pub shared_to: String,
    pub shared_at: DateTime<Utc>,
}

/// Comment on a reel. `parent_comment` is None for top-level comments and
/// holds the parent id for replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user: String,
    pub reel: String,
    pub text: String,
    pub likes: Vec<String>,
    pub parent_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Music track a reel can reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Music {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub url: String,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
}

/// Audit record for a significant mutation. Write-only from this service's
/// perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    pub id: String,
    pub user: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub device: String,
    pub location: ActionLocation,
    pub created_at: DateTime<Utc>,
}

/// Coarse request origin captured alongside an action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionLocation {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub pincode: String,
}

// Request types for the API

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub mobile: String,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub is_suspended: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReelRequest {
    pub user: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub duration: Option<f64>,
    pub music: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReelRequest {
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub duration: Option<f64>,
    pub music: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareReelRequest {
    pub shared_by: Option<String>,
    pub shared_to: Option<String>,
}

/// Body of the like-toggle endpoints. The acting user rides in the payload
/// rather than being taken from the session token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub user_id: Option<String>,
}

/// Body of follow/unfollow: the acting user's id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub user: String,
    pub reel: String,
    pub text: String,
    pub parent_comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMusicRequest {
    pub title: String,
    pub artist: Option<String>,
    pub url: String,
    pub duration: Option<f64>,
}

/// Feed query params arrive as raw strings so that non-numeric values fall
/// back to the defaults instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}
