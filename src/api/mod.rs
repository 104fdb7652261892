use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::audit::{self, ActionEvent};
use crate::auth::{AuthService, AuthUser};
use crate::feed;
use crate::models::*;
use crate::social::{self, LikeTarget};
use crate::store::{Store, StoreError};

pub struct AppState {
    pub store: Arc<Store>,
    pub auth: Arc<AuthService>,
}

/// Unexpected store failure: log the detail locally, answer with a generic
/// message only.
fn server_error(context: &str, e: StoreError) -> HttpResponse {
    log::error!("{}: {}", context, e);
    HttpResponse::InternalServerError().json(json!({ "message": "Server error" }))
}

fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

// ==================== User Endpoints ====================

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> impl Responder {
    if body.username.is_empty() || body.mobile.is_empty() || body.email.is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "Username, mobile, email, and password are required" }));
    }
    if !is_valid_email(&body.email) {
        return HttpResponse::BadRequest().json(json!({ "message": "Invalid email format" }));
    }

    match state.store.get_user_by_email(&body.email) {
        Ok(_) => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "User already exists with this email" }));
        }
        Err(StoreError::NotFound(_)) => {}
        Err(e) => return server_error("Error checking existing user", e),
    }

    let password_hash = match state.auth.hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Error hashing password: {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Server error" }));
        }
    };

    let mut user = User {
        id: String::new(),
        username: body.username.clone(),
        mobile: body.mobile.clone(),
        email: Some(body.email.clone()),
        password_hash,
        profile_picture: body.profile_picture.clone().unwrap_or_default(),
        bio: body.bio.clone().unwrap_or_default(),
        followers: Vec::new(),
        following: Vec::new(),
        is_suspended: false,
        created_at: Utc::now(),
    };

    match state.store.create_user(&mut user) {
        Ok(_) => HttpResponse::Created().json(user),
        Err(e) => HttpResponse::BadRequest()
            .json(json!({ "message": format!("Failed to create user: {}", e) })),
    }
}

pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<LoginRequest>,
) -> impl Responder {
    let user = match state.store.get_user_by_email(&body.email) {
        Ok(u) => u,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid credentials" }));
        }
        Err(e) => return server_error("Error fetching user for login", e),
    };

    if user.is_suspended {
        return HttpResponse::Forbidden().json(json!({ "message": "Account is suspended" }));
    }

    let valid = state
        .auth
        .verify_password(&body.password, &user.password_hash)
        .unwrap_or(false);

    if !valid {
        return HttpResponse::BadRequest().json(json!({ "message": "Invalid credentials" }));
    }

    audit::record(
        &state.store,
        &req,
        ActionEvent {
            user: &user.id,
            action: "login",
            target_type: "User",
            target_id: &user.id,
        },
    );

    let token = match state.auth.generate_token(&user.id) {
        Ok(t) => t,
        Err(e) => {
            log::error!("JWT signing error: {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "message": "Error generating token" }));
        }
    };

    HttpResponse::Ok().json(json!({
        "message": "Login successful!",
        "token": token,
        "user": user,
    }))
}

pub async fn list_users(state: web::Data<AppState>, _auth: AuthUser) -> impl Responder {
    match state.store.list_users() {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => server_error("Error fetching users", e),
    }
}

pub async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.store.get_user(&path.into_inner()) {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "User not found" }))
        }
        Err(e) => server_error("Error fetching user", e),
    }
}

pub async fn update_user(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> impl Responder {
    let mut user = match state.store.get_user(&path.into_inner()) {
        Ok(u) => u,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(json!({ "message": "User not found" }));
        }
        Err(e) => return server_error("Error fetching user", e),
    };

    if let (Some(current), Some(new)) = (&body.current_password, &body.new_password) {
        let matches = state
            .auth
            .verify_password(current, &user.password_hash)
            .unwrap_or(false);
        if !matches {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Current password is incorrect" }));
        }
        user.password_hash = match state.auth.hash_password(new) {
            Ok(hash) => hash,
            Err(e) => {
                log::error!("Error hashing password: {}", e);
                return HttpResponse::InternalServerError()
                    .json(json!({ "message": "Server error" }));
            }
        };
    }

    if let Some(ref username) = body.username {
        user.username = username.clone();
    }
    if let Some(ref picture) = body.profile_picture {
        user.profile_picture = picture.clone();
    }
    if let Some(ref bio) = body.bio {
        user.bio = bio.clone();
    }
    if let Some(suspended) = body.is_suspended {
        user.is_suspended = suspended;
    }

    match state.store.update_user(&user) {
        Ok(_) => HttpResponse::Ok().json(user),
        Err(e) => server_error("Error updating user", e),
    }
}

pub async fn delete_user(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.delete_user(&path.into_inner()) {
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "User not found" }))
        }
        Err(e) => server_error("Error deleting user", e),
    }
}

// ==================== Social Graph Endpoints ====================

pub async fn follow_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<FollowRequest>,
) -> impl Responder {
    let target_id = path.into_inner();
    let actor_id = match body.user_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return HttpResponse::BadRequest().json(json!({ "message": "User ID is required" }));
        }
    };

    match social::follow(&state.store, &target_id, &actor_id) {
        Ok(_) => {
            audit::record(
                &state.store,
                &req,
                ActionEvent {
                    user: &actor_id,
                    action: "follow_user",
                    target_type: "User",
                    target_id: &target_id,
                },
            );
            HttpResponse::Ok().json(json!({ "message": "User followed" }))
        }
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "User not found" }))
        }
        Err(StoreError::Conflict(msg)) => {
            HttpResponse::BadRequest().json(json!({ "message": msg }))
        }
        Err(e) => server_error("Error following user", e),
    }
}

pub async fn unfollow_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<FollowRequest>,
) -> impl Responder {
    let target_id = path.into_inner();
    let actor_id = match body.user_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return HttpResponse::BadRequest().json(json!({ "message": "User ID is required" }));
        }
    };

    match social::unfollow(&state.store, &target_id, &actor_id) {
        Ok(_) => {
            audit::record(
                &state.store,
                &req,
                ActionEvent {
                    user: &actor_id,
                    action: "unfollow_user",
                    target_type: "User",
                    target_id: &target_id,
                },
            );
            HttpResponse::Ok().json(json!({ "message": "User unfollowed" }))
        }
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "User not found" }))
        }
        Err(StoreError::Conflict(msg)) => {
            HttpResponse::BadRequest().json(json!({ "message": msg }))
        }
        Err(e) => server_error("Error unfollowing user", e),
    }
}

// ==================== Reel Endpoints ====================

pub async fn upload_reel(
    state: web::Data<AppState>,
    req: HttpRequest,
    _auth: AuthUser,
    body: web::Json<UploadReelRequest>,
) -> impl Responder {
    if body.user.is_empty() || body.video_url.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "User ID or video URL missing" }));
    }

    let mut reel = Reel {
        id: String::new(),
        user: body.user.clone(),
        video_url: body.video_url.clone(),
        thumbnail_url: body.thumbnail_url.clone().unwrap_or_default(),
        caption: body.caption.clone().unwrap_or_default(),
        duration: body.duration.unwrap_or(0.0),
        music: body.music.clone(),
        status: body.status.clone().unwrap_or_default(),
        likes: Vec::new(),
        shares: Vec::new(),
        created_at: Utc::now(),
    };

    match state.store.create_reel(&mut reel) {
        Ok(_) => {
            audit::record(
                &state.store,
                &req,
                ActionEvent {
                    user: &reel.user,
                    action: "upload_reel",
                    target_type: "Reel",
                    target_id: &reel.id,
                },
            );
            HttpResponse::Created()
                .json(json!({ "message": "Reel saved successfully", "data": reel }))
        }
        Err(e) => server_error("Error in upload reel", e),
    }
}

pub async fn list_reels(state: web::Data<AppState>, _auth: AuthUser) -> impl Responder {
    match state.store.list_reels() {
        Ok(reels) => HttpResponse::Ok().json(reels),
        Err(e) => server_error("Error fetching reels", e),
    }
}

pub async fn show_feed(
    state: web::Data<AppState>,
    _auth: AuthUser,
    query: web::Query<FeedQuery>,
) -> impl Responder {
    let page = feed::parse_param(query.page.as_deref(), feed::DEFAULT_PAGE);
    let limit = feed::parse_param(query.limit.as_deref(), feed::DEFAULT_LIMIT);

    match feed::sample_feed(&state.store, page, limit) {
        Ok(feed_page) => HttpResponse::Ok().json(feed_page),
        Err(e) => server_error("Error fetching random reels", e),
    }
}

pub async fn get_reel(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.get_reel(&path.into_inner()) {
        Ok(reel) => HttpResponse::Ok().json(reel),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Reel not found" }))
        }
        Err(e) => server_error("Error finding reel", e),
    }
}

pub async fn update_reel(
    state: web::Data<AppState>,
    req: HttpRequest,
    _auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateReelRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let mut reel = match state.store.get_reel(&id) {
        Ok(r) => r,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(json!({ "message": "Reel not found" }));
        }
        Err(e) => return server_error("Error finding reel", e),
    };

    if let Some(ref url) = body.video_url {
        reel.video_url = url.clone();
    }
    if let Some(ref thumb) = body.thumbnail_url {
        reel.thumbnail_url = thumb.clone();
    }
    if let Some(ref caption) = body.caption {
        reel.caption = caption.clone();
    }
    if let Some(duration) = body.duration {
        reel.duration = duration;
    }
    if let Some(ref music) = body.music {
        reel.music = Some(music.clone());
    }

    match state.store.update_reel(&reel) {
        Ok(_) => {
            audit::record(
                &state.store,
                &req,
                ActionEvent {
                    user: &reel.user,
                    action: "update_reel",
                    target_type: "Reel",
                    target_id: &reel.id,
                },
            );
            HttpResponse::Ok().json(reel)
        }
        Err(e) => server_error("Error updating reel", e),
    }
}

pub async fn delete_reel(
    state: web::Data<AppState>,
    req: HttpRequest,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();
    let reel = match state.store.get_reel(&id) {
        Ok(r) => r,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(json!({ "message": "Reel not found" }));
        }
        Err(e) => return server_error("Error finding reel", e),
    };

    audit::record(
        &state.store,
        &req,
        ActionEvent {
            user: &reel.user,
            action: "delete_reel",
            target_type: "Reel",
            target_id: &id,
        },
    );

    // Hard delete; comments on the reel are left behind.
    match state.store.delete_reel(&id) {
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "Reel deleted successfully" })),
        Err(e) => server_error("Error in delete reel", e),
    }
}

pub async fn like_reel(
    state: web::Data<AppState>,
    req: HttpRequest,
    _auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<LikeRequest>,
) -> impl Responder {
    let reel_id = path.into_inner();
    let user_id = match body.user_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return HttpResponse::BadRequest().json(json!({ "message": "User ID is required" }));
        }
    };

    match social::toggle_like(&state.store, LikeTarget::Reel, &reel_id, &user_id) {
        Ok(outcome) => {
            audit::record(
                &state.store,
                &req,
                ActionEvent {
                    user: &user_id,
                    action: if outcome.liked { "like_reel" } else { "unlike_reel" },
                    target_type: "Reel",
                    target_id: &reel_id,
                },
            );
            let message = if outcome.liked { "Reel liked" } else { "Reel unliked" };
            HttpResponse::Ok().json(json!({ "message": message, "likes": outcome.likes }))
        }
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Reel not found" }))
        }
        Err(e) => server_error("Error in liking/unliking reel", e),
    }
}

pub async fn share_reel(
    state: web::Data<AppState>,
    req: HttpRequest,
    _auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<ShareReelRequest>,
) -> impl Responder {
    let (shared_by, shared_to) = match (body.shared_by.as_deref(), body.shared_to.as_deref()) {
        (Some(by), Some(to)) if !by.is_empty() && !to.is_empty() => {
            (by.to_string(), to.to_string())
        }
        _ => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Missing sharedBy or sharedTo" }));
        }
    };

    let reel_id = path.into_inner();
    let mut reel = match state.store.get_reel(&reel_id) {
        Ok(r) => r,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(json!({ "message": "Reel not found" }));
        }
        Err(e) => return server_error("Error finding reel", e),
    };

    reel.shares.push(ShareRecord {
        shared_by: shared_by.clone(),
        shared_to,
        shared_at: Utc::now(),
    });

    match state.store.update_reel(&reel) {
        Ok(_) => {
            audit::record(
                &state.store,
                &req,
                ActionEvent {
                    user: &shared_by,
                    action: "share_reel",
                    target_type: "Reel",
                    target_id: &reel_id,
                },
            );
            HttpResponse::Ok().json(json!({ "message": "Reel shared successfully" }))
        }
        Err(e) => server_error("Error sharing reel", e),
    }
}

// ==================== Comment Endpoints ====================

pub async fn create_comment(
    state: web::Data<AppState>,
    _auth: AuthUser,
    body: web::Json<CreateCommentRequest>,
) -> impl Responder {
    if body.user.is_empty() || body.reel.is_empty() || body.text.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "User, reel, and text are required" }));
    }

    let mut comment = Comment {
        id: String::new(),
        user: body.user.clone(),
        reel: body.reel.clone(),
        text: body.text.clone(),
        likes: Vec::new(),
        parent_comment: body.parent_comment.clone(),
        created_at: Utc::now(),
    };

    match state.store.create_comment(&mut comment) {
        Ok(_) => HttpResponse::Created().json(comment),
        Err(e) => server_error("Error creating comment", e),
    }
}

pub async fn list_comments(state: web::Data<AppState>, _auth: AuthUser) -> impl Responder {
    match state.store.list_comments() {
        Ok(comments) => HttpResponse::Ok().json(comments),
        Err(e) => server_error("Error fetching comments", e),
    }
}

pub async fn get_comment(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.get_comment(&path.into_inner()) {
        Ok(comment) => HttpResponse::Ok().json(comment),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Comment not found" }))
        }
        Err(e) => server_error("Error fetching comment", e),
    }
}

pub async fn update_comment(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateCommentRequest>,
) -> impl Responder {
    let mut comment = match state.store.get_comment(&path.into_inner()) {
        Ok(c) => c,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(json!({ "message": "Comment not found" }));
        }
        Err(e) => return server_error("Error fetching comment", e),
    };

    comment.text = body.text.clone();

    match state.store.update_comment(&comment) {
        Ok(_) => HttpResponse::Ok().json(comment),
        Err(e) => server_error("Error updating comment", e),
    }
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.delete_comment_cascade(&path.into_inner()) {
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "Comment deleted successfully" })),
        Err(e) => server_error("Error in delete comment", e),
    }
}

pub async fn reel_comments(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match feed::list_reel_comments(&state.store, &path.into_inner()) {
        Ok(threads) => HttpResponse::Ok().json(threads),
        Err(e) => server_error("Error fetching comments", e),
    }
}

pub async fn like_comment(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<LikeRequest>,
) -> impl Responder {
    let comment_id = path.into_inner();
    let user_id = match body.user_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return HttpResponse::BadRequest().json(json!({ "message": "User ID is required" }));
        }
    };

    match social::toggle_like(&state.store, LikeTarget::Comment, &comment_id, &user_id) {
        Ok(outcome) => {
            let message = if outcome.liked { "Comment liked" } else { "Comment disliked" };
            HttpResponse::Ok().json(json!({ "message": message, "likes": outcome.likes }))
        }
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Comment not found" }))
        }
        Err(e) => server_error("Error in liking/disliking comment", e),
    }
}

// ==================== Music Endpoints ====================

pub async fn add_music(
    state: web::Data<AppState>,
    _auth: AuthUser,
    body: web::Json<CreateMusicRequest>,
) -> impl Responder {
    if body.title.is_empty() || body.url.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "message": "Title and URL are required" }));
    }

    let mut music = Music {
        id: String::new(),
        title: body.title.clone(),
        artist: body.artist.clone().unwrap_or_default(),
        url: body.url.clone(),
        duration: body.duration.unwrap_or(0.0),
        created_at: Utc::now(),
    };

    match state.store.create_music(&mut music) {
        Ok(_) => HttpResponse::Created().json(music),
        Err(e) => server_error("Error adding music", e),
    }
}

pub async fn list_music(state: web::Data<AppState>, _auth: AuthUser) -> impl Responder {
    match state.store.list_music() {
        Ok(tracks) => HttpResponse::Ok().json(tracks),
        Err(e) => server_error("Error fetching music", e),
    }
}

pub async fn get_music(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.get_music(&path.into_inner()) {
        Ok(music) => HttpResponse::Ok().json(music),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Music not found" }))
        }
        Err(e) => server_error("Error fetching music", e),
    }
}

pub async fn delete_music(
    state: web::Data<AppState>,
    _auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.delete_music(&path.into_inner()) {
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "Music deleted successfully" })),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(json!({ "message": "Music not found" }))
        }
        Err(e) => server_error("Error deleting music", e),
    }
}

// ==================== Route Configuration ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Users (register/login/fetch and the graph routes are public)
        .route("/api/users", web::post().to(register))
        .route("/api/users/login", web::post().to(login))
        .route("/api/users", web::get().to(list_users))
        .route("/api/users/{id}/follow", web::put().to(follow_user))
        .route("/api/users/{id}/unfollow", web::put().to(unfollow_user))
        .route("/api/users/{id}", web::get().to(get_user))
        .route("/api/users/{id}", web::put().to(update_user))
        .route("/api/users/{id}", web::delete().to(delete_user))
        // Reels
        .route("/api/reels/upload", web::post().to(upload_reel))
        .route("/api/reels", web::get().to(list_reels))
        .route("/api/reels/show", web::get().to(show_feed))
        .route("/api/reels/update/{id}", web::put().to(update_reel))
        .route("/api/reels/delete/{id}", web::delete().to(delete_reel))
        .route("/api/reels/like/{id}", web::put().to(like_reel))
        .route("/api/reels/{id}/share", web::put().to(share_reel))
        .route("/api/reels/{id}", web::get().to(get_reel))
        // Comments
        .route("/api/comment/new", web::post().to(create_comment))
        .route("/api/comment", web::get().to(list_comments))
        .route("/api/comment/reel/{reelId}", web::get().to(reel_comments))
        .route("/api/comment/update/{id}", web::put().to(update_comment))
        .route("/api/comment/delete/{id}", web::delete().to(delete_comment))
        .route("/api/comment/like/{id}", web::put().to(like_comment))
        .route("/api/comment/{id}", web::get().to(get_comment))
        // Music
        .route("/api/music", web::post().to(add_music))
        .route("/api/music", web::get().to(list_music))
        .route("/api/music/{id}", web::get().to(get_music))
        .route("/api/music/{id}", web::delete().to(delete_music));
}
