use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{test, App};
use banking_portal_core::shared::constants::{MSG_DUPLICATE_USERNAME, MSG_INVALID_LOGIN};
use banking_portal_core::{
    AccountNumber, AccountRepository, MemoryAccountRepository, PasswordConfig, Username,
};

use crate::infrastructure::config::Config;
use crate::middleware::csrf::CSRF_COOKIE_NAME;
use crate::middleware::{SecurityConfig, SecurityMiddleware, SessionMiddleware};
use crate::AppState;

const TOKEN: &str = "abcdefghijklmnopqrstuvwxyz012345";
const PASSWORD: &str = "violet-Harbour-91";

struct Portal {
    state: AppState,
    accounts: Arc<MemoryAccountRepository>,
}

fn portal() -> Portal {
    let accounts = Arc::new(MemoryAccountRepository::new());
    let state = AppState::with_password_config(
        Config::for_tests(),
        accounts.clone(),
        PasswordConfig::fast_for_tests(),
    )
    .unwrap();
    Portal { state, accounts }
}

macro_rules! init_app {
    ($state:expr) => {{
        let state = $state.clone();
        let login_url = state.config.login_url.clone();
        test::init_service(
            App::new()
                .wrap(SessionMiddleware)
                .wrap(NormalizePath::new(TrailingSlash::Always))
                .wrap(SecurityMiddleware::new(SecurityConfig::new(
                    state.config.effective_allowed_hosts(),
                )))
                .configure(|cfg| state.register(cfg))
                .configure(|cfg| super::configure(cfg, &login_url)),
        )
        .await
    }};
}

fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header((header::HOST, "localhost"))
}

fn post_form(uri: &str, fields: &[(&str, &str)]) -> test::TestRequest {
    let mut form: Vec<(&str, &str)> = fields.to_vec();
    form.push(("csrfmiddlewaretoken", TOKEN));
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::HOST, "localhost"))
        .cookie(Cookie::new(CSRF_COOKIE_NAME, TOKEN))
        .set_form(form)
}

fn registration(username: &str) -> Vec<(&str, &str)> {
    vec![
        ("username", username),
        ("email", ""),
        ("password1", PASSWORD),
        ("password2", PASSWORD),
    ]
}

fn location(resp: &ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn response_cookie(resp: &ServiceResponse, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.into_owned())
}

async fn body_text(resp: ServiceResponse) -> String {
    let body = test::read_body(resp).await;
    String::from_utf8(body.to_vec()).unwrap()
}

#[actix_web::test]
async fn test_register_logs_in_and_home_shows_defaults() {
    let portal = portal();
    let app = init_app!(portal.state);

    let resp = test::call_service(&app, post_form("/users/register/", &registration("alice")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let session = response_cookie(&resp, "sessionid").expect("session cookie");
    assert_eq!(session.http_only(), Some(true));

    let resp = test::call_service(&app, get("/").cookie(session).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Welcome, alice"));
    assert!(html.contains(r#"<dd id="account-number">Not set</dd>"#));
    assert!(html.contains(r#"<dd id="balance">0.00</dd>"#));

    let records = portal.accounts.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].account_number.is_none());
}

#[actix_web::test]
async fn test_form_pages_set_csrf_cookie() {
    let portal = portal();
    let app = init_app!(portal.state);

    for uri in ["/users/register/", "/register/", "/users/login/", "/users/login"] {
        let resp = test::call_service(&app, get(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let cookie = response_cookie(&resp, CSRF_COOKIE_NAME).expect("csrf cookie");
        let html = body_text(resp).await;
        assert!(html.contains(&format!(r#"value="{}""#, cookie.value())), "{uri}");
    }
}

#[actix_web::test]
async fn test_post_without_csrf_token_is_forbidden() {
    let portal = portal();
    let app = init_app!(portal.state);

    let req = test::TestRequest::post()
        .uri("/users/register/")
        .insert_header((header::HOST, "localhost"))
        .set_form(registration("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(portal.accounts.list().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_duplicate_registration_redisplays_form() {
    let portal = portal();
    let app = init_app!(portal.state);

    let resp = test::call_service(&app, post_form("/users/register/", &registration("alice")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let resp = test::call_service(&app, post_form("/users/register/", &registration("Alice")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, "sessionid").is_none());
    let html = body_text(resp).await;
    assert!(html.contains(MSG_DUPLICATE_USERNAME));
    assert!(html.contains(r#"value="Alice""#));
    assert_eq!(portal.accounts.list().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn test_bad_credentials_redisplay_login_form() {
    let portal = portal();
    let app = init_app!(portal.state);
    test::call_service(&app, post_form("/users/register/", &registration("alice")).to_request()).await;

    let resp = test::call_service(
        &app,
        post_form("/users/login/", &[("username", "alice"), ("password", "wrong-password")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, "sessionid").is_none());
    let html = body_text(resp).await;
    assert!(html.contains(MSG_INVALID_LOGIN));
    assert!(html.contains(r#"value="alice""#));
}

#[actix_web::test]
async fn test_login_logout_cycle() {
    let portal = portal();
    let app = init_app!(portal.state);
    test::call_service(&app, post_form("/users/register/", &registration("alice")).to_request()).await;

    let resp = test::call_service(
        &app,
        post_form("/users/login/", &[("username", "alice"), ("password", PASSWORD)]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let session = response_cookie(&resp, "sessionid").expect("session cookie");

    let resp = test::call_service(
        &app,
        post_form("/users/logout/", &[]).cookie(session.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/users/login/");
    let removal = response_cookie(&resp, "sessionid").expect("removal cookie");
    assert_eq!(removal.value(), "");

    // The old token no longer opens the home page.
    let resp = test::call_service(&app, get("/").cookie(session).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/users/login/");
}

#[actix_web::test]
async fn test_logout_post_needs_csrf_but_get_does_not() {
    let portal = portal();
    let app = init_app!(portal.state);
    let resp = test::call_service(&app, post_form("/users/register/", &registration("alice")).to_request()).await;
    let session = response_cookie(&resp, "sessionid").unwrap();

    let req = test::TestRequest::post()
        .uri("/users/logout/")
        .insert_header((header::HOST, "localhost"))
        .cookie(session.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, get("/users/logout/").cookie(session).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/users/login/");
}

#[actix_web::test]
async fn test_anonymous_requests_are_guarded() {
    let portal = portal();
    let app = init_app!(portal.state);

    for uri in ["/", "/users/logout/"] {
        let resp = test::call_service(&app, get(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&resp), "/users/login/", "{uri}");
    }

    let resp = test::call_service(&app, get("/").cookie(Cookie::new("sessionid", "forged.token.value")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let resp = test::call_service(&app, get("/api/me/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_profile_api_returns_summary() {
    let portal = portal();
    let app = init_app!(portal.state);
    let resp = test::call_service(&app, post_form("/users/register/", &registration("alice")).to_request()).await;
    let session = response_cookie(&resp, "sessionid").unwrap();

    let username = Username::try_new("alice").unwrap();
    portal
        .accounts
        .assign_account_number(&username, Some(AccountNumber::try_new("0012345678").unwrap()))
        .await
        .unwrap();
    portal
        .accounts
        .set_balance(&username, "1520.5".parse().unwrap())
        .await
        .unwrap();

    let resp = test::call_service(&app, get("/api/me").cookie(session).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        serde_json::json!({
            "username": "alice",
            "account_number": "0012345678",
            "balance": "1520.50",
        })
    );
}

#[actix_web::test]
async fn test_health_and_host_validation() {
    let portal = portal();
    let app = init_app!(portal.state);

    let resp = test::call_service(&app, get("/health/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "development");

    let req = test::TestRequest::get()
        .uri("/health/")
        .insert_header((header::HOST, "evil.test"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
