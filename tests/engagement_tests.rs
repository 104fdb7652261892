use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;

use reels_server::api::{self, AppState};
use reels_server::auth::AuthService;
use reels_server::models::{Comment, Reel, User};
use reels_server::store::Store;

fn create_app_state(store: Arc<Store>, auth: Arc<AuthService>) -> AppState {
    AppState { store, auth }
}

fn create_test_user_with_token(
    store: &Arc<Store>,
    auth: &Arc<AuthService>,
    username: &str,
) -> (User, String) {
    let mut user = User {
        id: String::new(),
        username: username.to_string(),
        mobile: format!("+1555{}", username),
        email: Some(format!("{}@test.com", username)),
        password_hash: "hash".to_string(),
        profile_picture: String::new(),
        bio: String::new(),
        followers: Vec::new(),
        following: Vec::new(),
        is_suspended: false,
        created_at: chrono::Utc::now(),
    };
    store.create_user(&mut user).unwrap();
    let token = auth.generate_token(&user.id).unwrap();
    (user, token)
}

fn create_test_reel(store: &Arc<Store>, user_id: &str) -> Reel {
    let mut reel = Reel {
        id: String::new(),
        user: user_id.to_string(),
        video_url: "https://cdn.test/v.mp4".to_string(),
        thumbnail_url: String::new(),
        caption: String::new(),
        duration: 15.0,
        music: None,
        status: "Published".to_string(),
        likes: Vec::new(),
        shares: Vec::new(),
        created_at: chrono::Utc::now(),
    };
    store.create_reel(&mut reel).unwrap();
    reel
}

fn create_test_comment(store: &Arc<Store>, user_id: &str, reel_id: &str) -> Comment {
    let mut comment = Comment {
        id: String::new(),
        user: user_id.to_string(),
        reel: reel_id.to_string(),
        text: "nice one".to_string(),
        likes: Vec::new(),
        parent_comment: None,
        created_at: chrono::Utc::now(),
    };
    store.create_comment(&mut comment).unwrap();
    comment
}

macro_rules! init_app {
    ($store:expr, $auth:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($store.clone()))
                .app_data(web::Data::new($auth.clone()))
                .app_data(web::Data::new(create_app_state($store.clone(), $auth.clone())))
                .configure(api::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_reel_like_toggle_roundtrip() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");
    let reel = create_test_reel(&store, &user.id);

    let app = init_app!(store, auth);

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/like/{}", reel.id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "userId": user.id }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["message"], "Reel liked");
    assert_eq!(resp["likes"], 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/like/{}", reel.id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "userId": user.id }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["message"], "Reel unliked");
    assert_eq!(resp["likes"], 0);

    // back to the original membership
    let stored = store.get_reel(&reel.id).unwrap();
    assert!(stored.likes.is_empty());
}

#[actix_web::test]
async fn test_comment_like_toggle_roundtrip() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");
    let reel = create_test_reel(&store, &user.id);
    let comment = create_test_comment(&store, &user.id, &reel.id);

    let app = init_app!(store, auth);

    let req = test::TestRequest::put()
        .uri(&format!("/api/comment/like/{}", comment.id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "userId": user.id }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["message"], "Comment liked");
    assert_eq!(resp["likes"], 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/comment/like/{}", comment.id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "userId": user.id }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["message"], "Comment disliked");
    assert_eq!(resp["likes"], 0);
}

#[actix_web::test]
async fn test_like_missing_reel_is_not_found() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::put()
        .uri("/api/reels/like/no-such-reel")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "userId": user.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_like_requires_user_id() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");
    let reel = create_test_reel(&store, &user.id);

    let app = init_app!(store, auth);

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/like/{}", reel.id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User ID is required");
}

#[actix_web::test]
async fn test_like_requires_auth() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, _token) = create_test_user_with_token(&store, &auth, "alice");
    let reel = create_test_reel(&store, &user.id);

    let app = init_app!(store, auth);

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/like/{}", reel.id))
        .set_json(json!({ "userId": user.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_reel_like_records_action_log() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");
    let reel = create_test_reel(&store, &user.id);

    let app = init_app!(store, auth);

    for _ in 0..2 {
        let req = test::TestRequest::put()
            .uri(&format!("/api/reels/like/{}", reel.id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "userId": user.id }))
            .to_request();
        test::call_service(&app, req).await;
    }

    // one like_reel and one unlike_reel entry
    assert_eq!(store.count_action_logs(&user.id).unwrap(), 2);
}

#[actix_web::test]
async fn test_two_users_like_same_reel() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (alice, alice_token) = create_test_user_with_token(&store, &auth, "alice");
    let (bob, bob_token) = create_test_user_with_token(&store, &auth, "bob");
    let reel = create_test_reel(&store, &alice.id);

    let app = init_app!(store, auth);

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/like/{}", reel.id))
        .insert_header(("Authorization", format!("Bearer {}", alice_token)))
        .set_json(json!({ "userId": alice.id }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["likes"], 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/like/{}", reel.id))
        .insert_header(("Authorization", format!("Bearer {}", bob_token)))
        .set_json(json!({ "userId": bob.id }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["likes"], 2);

    let stored = store.get_reel(&reel.id).unwrap();
    assert_eq!(stored.likes, vec![alice.id, bob.id]);
}
