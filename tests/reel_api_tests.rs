use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;

use reels_server::api::{self, AppState};
use reels_server::auth::AuthService;
use reels_server::models::{Comment, User};
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
async fn test_upload_reel() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/reels/upload")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "user": user.id,
            "videoUrl": "https://cdn.test/v.mp4",
            "caption": "first reel",
            "duration": 14.5,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Reel saved successfully");
    let reel_id = body["data"]["id"].as_str().unwrap();
    assert!(!reel_id.is_empty());
    assert_eq!(body["data"]["status"], "Published");

    // upload is audited
    assert_eq!(store.count_action_logs(&user.id).unwrap(), 1);
}

#[actix_web::test]
async fn test_upload_requires_user_and_video_url() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/reels/upload")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "user": user.id, "videoUrl": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_update_reel_fields() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/reels/upload")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "user": user.id, "videoUrl": "https://cdn.test/v.mp4" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let reel_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/update/{}", reel_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "caption": "better caption" }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["caption"], "better caption");

    let stored = store.get_reel(&reel_id).unwrap();
    assert_eq!(stored.caption, "better caption");
}

#[actix_web::test]
async fn test_share_reel_appends_record() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (alice, token) = create_test_user_with_token(&store, &auth, "alice");
    let (bob, _) = create_test_user_with_token(&store, &auth, "bob");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/reels/upload")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "user": alice.id, "videoUrl": "https://cdn.test/v.mp4" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let reel_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/{}/share", reel_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "sharedBy": alice.id, "sharedTo": bob.id }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["message"], "Reel shared successfully");

    let stored = store.get_reel(&reel_id).unwrap();
    assert_eq!(stored.shares.len(), 1);
    assert_eq!(stored.shares[0].shared_by, alice.id);
    assert_eq!(stored.shares[0].shared_to, bob.id);
}

#[actix_web::test]
async fn test_share_requires_both_parties() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (alice, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/reels/upload")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "user": alice.id, "videoUrl": "https://cdn.test/v.mp4" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let reel_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/reels/{}/share", reel_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "sharedBy": alice.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let resp_body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(resp_body["message"], "Missing sharedBy or sharedTo");
}

#[actix_web::test]
async fn test_delete_reel_leaves_comments_behind() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/reels/upload")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "user": user.id, "videoUrl": "https://cdn.test/v.mp4" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let reel_id = body["data"]["id"].as_str().unwrap().to_string();

    let mut comment = Comment {
        id: String::new(),
        user: user.id.clone(),
        reel: reel_id.clone(),
        text: "still here".to_string(),
        likes: Vec::new(),
        parent_comment: None,
        created_at: chrono::Utc::now(),
    };
    store.create_comment(&mut comment).unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reels/delete/{}", reel_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // the reel is gone but its comments are orphaned, not deleted
    assert!(store.get_reel(&reel_id).is_err());
    assert!(store.get_comment(&comment.id).is_ok());
}

#[actix_web::test]
async fn test_comment_delete_cascades_to_direct_replies() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let mut top = Comment {
        id: String::new(),
        user: user.id.clone(),
        reel: "reel-1".to_string(),
        text: "top".to_string(),
        likes: Vec::new(),
        parent_comment: None,
        created_at: chrono::Utc::now(),
    };
    store.create_comment(&mut top).unwrap();

    let mut reply = Comment {
        id: String::new(),
        user: user.id.clone(),
        reel: "reel-1".to_string(),
        text: "reply".to_string(),
        likes: Vec::new(),
        parent_comment: Some(top.id.clone()),
        created_at: chrono::Utc::now(),
    };
    store.create_comment(&mut reply).unwrap();

    let mut unrelated = Comment {
        id: String::new(),
        user: user.id.clone(),
        reel: "reel-1".to_string(),
        text: "unrelated".to_string(),
        likes: Vec::new(),
        parent_comment: None,
        created_at: chrono::Utc::now(),
    };
    store.create_comment(&mut unrelated).unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/comment/delete/{}", top.id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    assert!(store.get_comment(&top.id).is_err());
    assert!(store.get_comment(&reply.id).is_err());
    assert!(store.get_comment(&unrelated.id).is_ok());
}

#[actix_web::test]
async fn test_create_comment_via_api() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/comment/new")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "user": user.id, "reel": "reel-1", "text": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["text"], "hello");
    assert!(body["parentComment"].is_null());
}

#[actix_web::test]
async fn test_create_comment_requires_text() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));
    let (user, token) = create_test_user_with_token(&store, &auth, "alice");

    let app = init_app!(store, auth);

    let req = test::TestRequest::post()
        .uri("/api/comment/new")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "user": user.id, "reel": "reel-1", "text": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_get_reel_requires_auth() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth = Arc::new(AuthService::new("test_secret".to_string()));

    let app = init_app!(store, auth);

    let req = test::TestRequest::get().uri("/api/reels/some-id").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
