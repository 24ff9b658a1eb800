// web-server/tests/auth_flow.rs
mod common;

use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::http::{header, StatusCode};
use actix_web::test;
use vaev_server::build_app;

use common::*;

#[actix_web::test]
async fn test_login_sets_auth_cookie_and_bounces_home() {
    let state = state().await;
    user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let (content_type, body) = multipart(&[
        ("CSRF-Token", CSRF),
        ("username", "ada@example.com"),
        ("password", PASSWORD),
    ]);
    let req = test::TestRequest::post()
        .uri("/auth/validate")
        .cookie(session_cookie())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = response_cookie(&resp, "vaev-auth").expect("auth cookie");
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    let expires = cookie.expires_datetime().expect("expiry");
    assert!(expires > OffsetDateTime::now_utc() + Duration::days(364));

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("event: datastar-execute-script"));
    assert!(body.contains(r#"window.location = "/""#));
}

#[actix_web::test]
async fn test_login_follows_same_origin_next_only() {
    let state = state().await;
    user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    for (next, expected) in [
        ("%2Fproject%2Fabc", r#"window.location = "/project/abc""#),
        ("https%3A%2F%2Fevil.example", r#"window.location = "/""#),
    ] {
        let (content_type, body) = multipart(&[
            ("CSRF-Token", CSRF),
            ("username", "ada@example.com"),
            ("password", PASSWORD),
        ]);
        let req = test::TestRequest::post()
            .uri(&format!("/auth/validate?next={}", next))
            .cookie(session_cookie())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(expected), "{} -> {}", next, body);
    }
}

#[actix_web::test]
async fn test_bad_password_shows_toast_and_resets_form() {
    let state = state().await;
    user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let (content_type, body) = multipart(&[
        ("CSRF-Token", CSRF),
        ("username", "ada@example.com"),
        ("password", "wrong"),
    ]);
    let req = test::TestRequest::post()
        .uri("/auth/validate")
        .cookie(session_cookie())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, "vaev-auth").is_none());

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("selector #toaster"));
    assert!(body.contains("Invalid credentials"));
    assert!(body.contains(r#"document.getElementById("login-form").reset();"#));
}

#[actix_web::test]
async fn test_login_without_csrf_field_is_forbidden() {
    let state = state().await;
    user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let (content_type, body) = multipart(&[("username", "ada@example.com"), ("password", PASSWORD)]);
    let req = test::TestRequest::post()
        .uri("/auth/validate")
        .cookie(session_cookie())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(test::read_body(resp).await, "CSRF token missing");
}

#[actix_web::test]
async fn test_logout_removes_auth_cookie() {
    let state = state().await;
    let ada = user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .cookie(session_cookie())
        .cookie(auth_cookie(&state, &ada))
        .insert_header(("X-CSRF-Token", CSRF))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = response_cookie(&resp, "vaev-auth").expect("removal cookie");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains(r#"window.location = "/login""#));
}

#[actix_web::test]
async fn test_rendered_sign_out_button_logs_out() {
    let state = state().await;
    let ada = user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/dashboard/projects")
        .cookie(session_cookie())
        .cookie(auth_cookie(&state, &ada))
        .to_request();
    let page = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    let token = page
        .split("'X-CSRF-Token': '")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .expect("sign-out action carries a token");
    assert_eq!(token, CSRF);

    // Same shape as the datastar @post the button fires
    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .cookie(session_cookie())
        .cookie(auth_cookie(&state, &ada))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .insert_header(("X-CSRF-Token", token))
        .set_payload("{}")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(response_cookie(&resp, "vaev-auth").unwrap().value(), "");
}

#[actix_web::test]
async fn test_login_page_bounces_signed_in_user() {
    let state = state().await;
    let ada = user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/login?next=%2Fdashboard%2Fprojects")
        .cookie(auth_cookie(&state, &ada))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/dashboard/projects"
    );
}

#[actix_web::test]
async fn test_login_page_clears_stale_auth_cookie() {
    let state = state().await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/login?next=%2Fproject%2Fp1")
        .cookie(actix_web::cookie::Cookie::new("vaev-auth", "stale"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(response_cookie(&resp, "vaev-auth").unwrap().value(), "");

    let session = response_cookie(&resp, "app_session").expect("session cookie");
    let token = vaev_common::SignedCookieCodec::new(SESSION_KEY)
        .decode(session.value())
        .unwrap()
        .csrf_token;

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("/auth/validate?next=%2Fproject%2Fp1"));
    assert!(body.contains(&format!(r#"<meta name="CSRF-Token" content="{}">"#, token)));
}

#[actix_web::test]
async fn test_user_card_fragment() {
    let state = state().await;
    let ada = user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/auth/user")
        .cookie(auth_cookie(&state, &ada))
        .to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains("selector #user-card"));
    assert!(body.contains("Test User"));

    let req = test::TestRequest::get().uri("/auth/user").to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains("guest"));
}

#[actix_web::test]
async fn test_index_redirects_signed_in_user() {
    let state = state().await;
    let ada = user(&state, "ada@example.com").await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/")
        .cookie(auth_cookie(&state, &ada))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/dashboard/projects"
    );

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
