use std::sync::Arc;

use actix_web::{
    body::{to_bytes, MessageBody},
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test, web, App,
};
use serde_json::{json, Value};

use crate::{
    middlewares::throttle::{MemoryRateLimiter, Rate, RateLimiter},
    modules::{
        friend::service::FriendService,
        user::{
            model::InsertUser,
            repository::{TokenRepository, UserRepository},
            service::UserService,
        },
    },
    utils::generate_token_key,
};


use memory::MemoryStore;

/// Inserts an active user with an unusable password and issues their token.
pub async fn seed_user(
    store: &MemoryStore,
    username: &str,
    first_name: &str,
    last_name: &str,
) -> (i64, String) {
    let user = store
        .create(&InsertUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            hash_password: "!".to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
        .await
        .unwrap();
    let token = store.get_or_create_token(user.id, &generate_token_key()).await.unwrap();
    (user.id, token)
}

struct TestState {
    store: Arc<MemoryStore>,
    users: UserService,
    friends: FriendService,
    limiter: Arc<dyn RateLimiter>,
}

impl TestState {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let limiter: Arc<dyn RateLimiter> =
            Arc::new(MemoryRateLimiter::new(Rate::parse("3/min").unwrap()));
        TestState {
            users: UserService::with_dependencies(store.clone()),
            friends: FriendService::with_dependencies(store.clone(), store.clone()),
            store,
            limiter,
        }
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.users.clone()))
                .app_data(web::Data::new($state.friends.clone()))
                .app_data(web::Data::from($state.limiter.clone()))
                .configure(crate::api_configure),
        )
        .await
    };
}

struct Reply {
    status: StatusCode,
    retry_after: Option<String>,
    body: Value,
}

/// Middleware errors surface as `Err` from the service; render them the way
/// the server would.
async fn call<S, R, B>(app: &S, req: R) -> Reply
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, retry_after, bytes) = match test::try_call_service(app, req).await {
        Ok(resp) => {
            let retry_after = retry_after(resp.headers());
            (resp.status(), retry_after, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let retry_after = retry_after(resp.headers());
            (resp.status(), retry_after, to_bytes(resp.into_body()).await.unwrap())
        }
    };

    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    Reply { status, retry_after, body }
}

fn retry_after(headers: &actix_web::http::header::HeaderMap) -> Option<String> {
    headers.get(header::RETRY_AFTER).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

fn post(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, format!("Token {token}")))
}

fn get(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, format!("Token {token}")))
}

#[actix_web::test]
async fn health_check_is_public() {
    let state = TestState::new();
    let app = init_app!(state);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn register_login_and_befriend_over_http() {
    let state = TestState::new();
    let app = init_app!(state);

    let mut tokens = Vec::new();
    for (username, first) in [("kong", "Donkey"), ("diddy", "Diddy")] {
        let created = call(
            &app,
            test::TestRequest::post()
                .uri("/connection/create/")
                .set_json(json!({
                    "username": username,
                    "password": "violet-harbour-42",
                    "email": format!("{username}@Example.com"),
                    "first_name": first,
                    "last_name": "Kong",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["success"], true);
        assert_eq!(created.body["status_code"], 201);
        assert_eq!(created.body["data"]["email"], format!("{username}@example.com"));
        assert!(created.body["data"].get("password").is_none());

        let login = call(
            &app,
            test::TestRequest::post()
                .uri("/connection/login/")
                .set_json(json!({ "username": username, "password": "violet-harbour-42" }))
                .to_request(),
        )
        .await;
        assert_eq!(login.status, StatusCode::OK);
        tokens.push(login.body["data"]["token"].as_str().unwrap().to_string());
    }
    let (kong, diddy) = (&tokens[0], &tokens[1]);
    let kong_id = state.store.find_by_username("kong").await.unwrap().unwrap().id;
    let diddy_id = state.store.find_by_username("diddy").await.unwrap().unwrap().id;

    let uri = format!("/connection/send_request/{diddy_id}/");

    let sent = call(&app, post(&uri, kong).to_request()).await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.body["data"]["request_status"], true);
    assert_eq!(sent.body["data"]["friend_status"], false);
    assert_eq!(sent.body["message"], "Friend request sent.");

    let pending = call(&app, get("/connection/pending/", diddy).to_request()).await;
    assert_eq!(pending.body["data"][0]["from_user"]["email"], "kong@example.com");

    let uri = format!("/connection/accept_request/{kong_id}/");

    let accepted = call(&app, post(&uri, diddy).to_request()).await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["data"]["friend_status"], true);

    let kong_friends = call(&app, get("/connection/friends/", kong).to_request()).await;
    assert_eq!(kong_friends.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(kong_friends.body["data"][0]["to_user"]["first_name"], "Diddy");

    let diddy_friends = call(&app, get("/connection/friends/", diddy).to_request()).await;
    assert_eq!(diddy_friends.body["data"][0]["to_user"]["email"], "kong@example.com");

    for token in [kong, diddy] {
        let pending = call(&app, get("/connection/pending/", token).to_request()).await;
        assert_eq!(pending.body["data"], json!([]));
    }

    let uri = format!("/connection/accept_request/{kong_id}/");

    let again = call(&app, post(&uri, diddy).to_request()).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["success"], false);
    assert_eq!(again.body["data"], Value::Null);
}

#[actix_web::test]
async fn weak_password_and_bad_login_are_400() {
    let state = TestState::new();
    let app = init_app!(state);

    let weak = call(
        &app,
        test::TestRequest::post()
            .uri("/connection/create/")
            .set_json(json!({
                "username": "kong",
                "password": "kong",
                "email": "kong@example.com",
                "first_name": "Donkey",
                "last_name": "Kong",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.body["status_code"], 400);

    let login = call(
        &app,
        test::TestRequest::post()
            .uri("/connection/login/")
            .set_json(json!({ "username": "nobody", "password": "whatever-pass" }))
            .to_request(),
    )
    .await;
    assert_eq!(login.status, StatusCode::BAD_REQUEST);
    assert_eq!(login.body["message"], "Incorrect Credentials");
}

#[actix_web::test]
async fn protected_routes_need_a_valid_token() {
    let state = TestState::new();
    let app = init_app!(state);

    let missing =
        call(&app, test::TestRequest::get().uri("/connection/friends/").to_request()).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["success"], false);

    let bogus = call(&app, get("/connection/friends/", "not-a-real-token").to_request()).await;
    assert_eq!(bogus.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bogus.body["message"], "Invalid token.");
}

#[actix_web::test]
async fn transition_errors_map_to_statuses() {
    let state = TestState::new();
    let (alice, alice_token) = seed_user(&state.store, "alice", "Alice", "Liddell").await;
    let (bob, bob_token) = seed_user(&state.store, "bob", "Bob", "Builder").await;
    let app = init_app!(state);

    let uri = format!("/connection/send_request/{alice}/");

    let own = call(&app, post(&uri, &alice_token).to_request()).await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);
    assert_eq!(own.body["message"], "You cannot send a friend request to yourself.");

    let nobody =
        call(&app, post("/connection/send_request/4242/", &alice_token).to_request()).await;
    assert_eq!(nobody.status, StatusCode::NOT_FOUND);

    let uri = format!("/connection/reject_request/{alice}/");

    let missing = call(&app, post(&uri, &bob_token).to_request()).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Friend request not found.");

    let uri = format!("/connection/send_request/{bob}/");
    call(&app, post(&uri, &alice_token).to_request()).await;
    let uri = format!("/connection/reject_request/{alice}/");
    let rejected = call(&app, post(&uri, &bob_token).to_request()).await;
    assert_eq!(rejected.status, StatusCode::OK);
    assert_eq!(rejected.body["data"]["reject_status"], true);
}

#[actix_web::test]
async fn fourth_send_in_a_minute_is_throttled() {
    let state = TestState::new();
    let (_, token) = seed_user(&state.store, "alice", "Alice", "Liddell").await;
    let mut targets = Vec::new();
    for name in ["bob", "carol", "dave"] {
        targets.push(seed_user(&state.store, name, name, "Smith").await.0);
    }
    let app = init_app!(state);

    for target in &targets {
        let uri = format!("/connection/send_request/{target}/");
        let sent = call(&app, post(&uri, &token).to_request()).await;
        assert_eq!(sent.status, StatusCode::CREATED);
    }

    // Throttled before the target is even looked up.
    let fourth = call(&app, post("/connection/send_request/4242/", &token).to_request()).await;
    assert_eq!(fourth.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(fourth.retry_after.is_some());
    assert_eq!(fourth.body["status_code"], 429);

    // Other endpoints are not throttled.
    let friends = call(&app, get("/connection/friends/", &token).to_request()).await;
    assert_eq!(friends.status, StatusCode::OK);
}

#[actix_web::test]
async fn search_requires_token_and_paginates() {
    let state = TestState::new();
    let (_, token) = seed_user(&state.store, "alice", "Alice", "Liddell").await;
    for i in 0..12 {
        seed_user(&state.store, &format!("smith{i}"), "Sam", "Smith").await;
    }
    let app = init_app!(state);

    let first =
        call(&app, get("/connection/search-users/?search=SMITH", &token).to_request()).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["data"]["count"], 12);
    assert_eq!(first.body["data"]["results"].as_array().unwrap().len(), 10);
    assert_eq!(first.body["data"]["next"], 2);

    let sized = call(
        &app,
        get("/connection/search-users/?search=smith&page_size=5&page=3", &token).to_request(),
    )
    .await;
    assert_eq!(sized.body["data"]["results"].as_array().unwrap().len(), 2);
    assert_eq!(sized.body["data"]["previous"], 2);

    let empty = call(&app, get("/connection/search-users/", &token).to_request()).await;
    assert_eq!(empty.body["data"]["count"], 0);

    let past =
        call(&app, get("/connection/search-users/?search=smith&page=9", &token).to_request()).await;
    assert_eq!(past.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_user_id_gets_the_error_envelope() {
    let state = TestState::new();
    let (_, token) = seed_user(&state.store, "alice", "Alice", "Liddell").await;
    let app = init_app!(state);

    for uri in ["/connection/send_request/abc/", "/connection/accept_request/1.5/"] {
        let reply = call(&app, post(uri, &token).to_request()).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["success"], false);
        assert_eq!(reply.body["status_code"], 404);
        assert_eq!(reply.body["data"], Value::Null);
        assert_eq!(reply.body["message"], "Not found.");
    }
}
