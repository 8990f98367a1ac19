//! End-to-end tests of the `/api/v1/auth` routes

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::json;
use uuid::Uuid;

use wd_api::create_app;

use common::{bearer, TestContext};

#[actix_web::test]
async fn test_health_reports_token_state() {
    let ctx = TestContext::new();
    let user = ctx.principal("ada@example.com", "editor", &[]).await;
    ctx.login(user).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cached_principals"], 1);
    assert_eq!(body["blacklisted_tokens"], 0);
}

#[actix_web::test]
async fn test_refresh_rotates_pair() {
    let ctx = TestContext::new();
    let user = ctx.principal("ada@example.com", "editor", &["posts:read"]).await;
    let tokens = ctx.login(user).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": tokens.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;

    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 600);
    assert_eq!(body["session_id"], tokens.session_id.to_string());
    let new_access = body["access_token"].as_str().unwrap().to_string();
    assert_ne!(new_access, tokens.access_token);

    let old = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&tokens.access_token))
        .to_request();
    assert_eq!(test::call_service(&app, old).await.status(), StatusCode::UNAUTHORIZED);

    let new = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&new_access))
        .to_request();
    assert_eq!(test::call_service(&app, new).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_refresh_token_reuse_is_rejected() {
    let ctx = TestContext::new();
    let user = ctx.principal("ada@example.com", "editor", &[]).await;
    let tokens = ctx.login(user).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let first = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": tokens.refresh_token }))
        .to_request();
    assert_eq!(test::call_service(&app, first).await.status(), StatusCode::OK);

    let replay = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": tokens.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, replay).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn test_refresh_with_access_token_is_rejected() {
    let ctx = TestContext::new();
    let user = ctx.principal("ada@example.com", "editor", &[]).await;
    let tokens = ctx.login(user).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": tokens.access_token }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_malformed_refresh_body_is_bad_request() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "token": "missing field" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[actix_web::test]
async fn test_logout_closes_only_current_session() {
    let ctx = TestContext::new();
    let user = ctx.principal("ada@example.com", "editor", &[]).await;
    let laptop = ctx.login(user).await;
    let phone = ctx.login(user).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(bearer(&laptop.access_token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["session_closed"], true);

    let laptop_me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&laptop.access_token))
        .to_request();
    assert_eq!(
        test::call_service(&app, laptop_me).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let laptop_refresh = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": laptop.refresh_token }))
        .to_request();
    assert_eq!(
        test::call_service(&app, laptop_refresh).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let phone_me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&phone.access_token))
        .to_request();
    assert_eq!(test::call_service(&app, phone_me).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_logout_all_closes_every_session() {
    let ctx = TestContext::new();
    let user = ctx.principal("ada@example.com", "editor", &[]).await;
    let laptop = ctx.login(user).await;
    let phone = ctx.login(user).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout-all")
        .insert_header(bearer(&laptop.access_token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["tokens_revoked"], 4);
    assert_eq!(body["sessions_closed"], 2);

    let phone_me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&phone.access_token))
        .to_request();
    assert_eq!(
        test::call_service(&app, phone_me).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_sessions_lists_callers_sessions() {
    let ctx = TestContext::new();
    let user = ctx.principal("ada@example.com", "editor", &[]).await;
    let other = ctx.principal("bob@example.com", "editor", &[]).await;
    let laptop = ctx.login(user).await;
    ctx.login(user).await;
    ctx.login(other).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/sessions")
        .insert_header(bearer(&laptop.access_token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let sessions = body.as_array().unwrap();

    assert_eq!(sessions.len(), 2);
    let current: Vec<_> = sessions.iter().filter(|s| s["current"] == true).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["id"], laptop.session_id.to_string());
    assert_eq!(current[0]["device_info"], "api-test");
}

#[actix_web::test]
async fn test_principal_sessions_owner_or_permission() {
    let ctx = TestContext::new();
    let owner = ctx.principal("ada@example.com", "editor", &[]).await;
    let stranger = ctx.principal("eve@example.com", "editor", &[]).await;
    let auditor = ctx
        .principal("sam@example.com", "auditor", &["sessions:read"])
        .await;
    ctx.login(owner).await;
    let stranger_tokens = ctx.login(stranger).await;
    let auditor_tokens = ctx.login(auditor).await;
    let app = test::init_service(create_app(ctx.state())).await;
    let uri = format!("/api/v1/auth/principals/{}/sessions", owner);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&stranger_tokens.access_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&auditor_tokens.access_token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_admin_revoke_requires_permission() {
    let ctx = TestContext::new();
    let target = ctx.principal("ada@example.com", "editor", &[]).await;
    let editor = ctx.principal("eve@example.com", "editor", &["posts:write"]).await;
    let target_tokens = ctx.login(target).await;
    let editor_tokens = ctx.login(editor).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/auth/admin/principals/{}/revoke", target))
        .insert_header(bearer(&editor_tokens.access_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["details"]["required"], "sessions:revoke");

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&target_tokens.access_token))
        .to_request();
    assert_eq!(test::call_service(&app, me).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_admin_revoke_with_reason() {
    let ctx = TestContext::new();
    let target = ctx.principal("ada@example.com", "editor", &[]).await;
    let admin = ctx
        .principal("root@example.com", "admin", &["sessions:revoke"])
        .await;
    let target_tokens = ctx.login(target).await;
    let admin_tokens = ctx.login(admin).await;
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/auth/admin/principals/{}/revoke", target))
        .insert_header(bearer(&admin_tokens.access_token))
        .set_json(json!({ "reason": "security_breach" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["tokens_revoked"], 2);
    assert_eq!(body["sessions_closed"], 1);

    let jti = ctx
        .service
        .codec()
        .decode_unverified(&target_tokens.access_token)
        .unwrap()
        .jti;
    let record = ctx.service.revocations().get(jti).unwrap();
    assert_eq!(
        record.reason,
        wd_core::domain::entities::revocation::RevocationReason::SecurityBreach
    );

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&target_tokens.access_token))
        .to_request();
    assert_eq!(test::call_service(&app, me).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_unknown_route_is_json_404() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state())).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/auth/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
}
