use tokio_test::io::{Builder, Mock};

use cupid_app::app::{App, LikeOutcome};
use cupid_auth::AuthServiceImpl;
use cupid_utils::utils::CaseInsensitiveString;
use cupid_web::routing;
use cupid_web::sessions::{Sessions, SESSION_ID_COOKIE};
use http_server::request::Request;
use http_server::response::Response;

type TestApp = App<mock_db::Db, AuthServiceImpl<mock_db::Db>>;

fn make_app() -> TestApp {
    let db_access = mock_db::Db::new();
    App::new(db_access.clone(), AuthServiceImpl::new(db_access))
}

async fn get(path: &str, cookie: Option<&str>) -> Request<Mock> {
    let mut builder = Builder::new();
    builder.read(format!("GET {path} HTTP/1.1\r\n").as_bytes());
    if let Some(session_id) = cookie {
        builder.read(format!("Cookie: {SESSION_ID_COOKIE}={session_id}\r\n").as_bytes());
    }
    builder.read(b"\r\n");
    Request::try_from_stream(builder.build()).await.unwrap()
}

async fn post(path: &str, cookie: Option<&str>, body: Option<&str>) -> Request<Mock> {
    let mut builder = Builder::new();
    builder.read(format!("POST {path} HTTP/1.1\r\n").as_bytes());
    if let Some(session_id) = cookie {
        builder.read(format!("Cookie: {SESSION_ID_COOKIE}={session_id}\r\n").as_bytes());
    }
    match body {
        Some(body) => {
            builder.read(format!("Content-Length: {}\r\n", body.len()).as_bytes());
            builder.read(b"\r\n");
            builder.read(body.as_bytes());
        }
        None => {
            builder.read(b"\r\n");
        }
    }
    Request::try_from_stream(builder.build()).await.unwrap()
}

fn redirect_location(response: &Response) -> &str {
    match response {
        Response::Redirect { location, .. } => location,
        _ => panic!("expected a redirect"),
    }
}

fn html_content(response: &Response) -> &str {
    match response {
        Response::Html { content, .. } => content,
        _ => panic!("expected an html page"),
    }
}

/// Pulls the session id out of the Set-Cookie header of a login response.
fn session_cookie(response: &Response) -> String {
    let headers = match response {
        Response::Redirect { headers, .. } => headers,
        _ => panic!("expected a redirect"),
    };
    let set_cookie_key = CaseInsensitiveString::from("Set-Cookie");
    let (_, value) = headers
        .iter()
        .find(|(key, _)| key == &set_cookie_key)
        .unwrap_or_else(|| panic!("no Set-Cookie header"));
    let (key, session_id) = value.split_once('=').unwrap();
    assert_eq!(key, SESSION_ID_COOKIE);
    session_id.to_owned()
}

async fn login(app: &TestApp, sessions: &Sessions, username: &str, password: &str) -> String {
    let body = format!("username={username}&password={password}");
    let mut request = post("/login", None, Some(&body)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert_eq!(redirect_location(&response), "/profile");
    session_cookie(&response)
}

#[tokio::test]
async fn unauthenticated_requests_redirect_to_login() {
    let app = make_app();
    let sessions = Sessions::new();

    let alice = app
        .create_account("alice", "pw".into(), None)
        .await
        .unwrap()
        .unwrap();
    let bob = app
        .create_account("bob", "pw".into(), None)
        .await
        .unwrap()
        .unwrap();

    for path in ["/profile", "/users", "/messages", "/message/1"] {
        let mut request = get(path, None).await;
        let response = routing::route(&mut request, app.clone(), sessions.clone())
            .await
            .unwrap();
        assert_eq!(redirect_location(&response), "/login");
    }

    // auth is checked before any request body is read
    for path in [format!("/like/{bob}"), format!("/message/{bob}")] {
        let mut request = post(&path, None, None).await;
        let response = routing::route(&mut request, app.clone(), sessions.clone())
            .await
            .unwrap();
        assert_eq!(redirect_location(&response), "/login");
    }

    // the store is untouched: no message arrived, and the like pair is
    // still free to be created
    assert!(app.inbox(bob).await.unwrap().is_empty());
    assert_eq!(app.like_user(alice, bob).await.unwrap(), LikeOutcome::Created);
}

#[tokio::test]
async fn form_post_without_a_body_is_bad_request() {
    let app = make_app();
    let sessions = Sessions::new();

    // no Content-Length header at all
    for path in ["/register", "/login"] {
        let mut request = post(path, None, None).await;
        let response = routing::route(&mut request, app.clone(), sessions.clone())
            .await
            .unwrap();
        assert!(matches!(response, Response::BadRequest));
    }

    app.create_account("alice", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let bob = app
        .create_account("bob", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let session_id = login(&app, &sessions, "alice", "secret").await;

    let mut request = post(&format!("/message/{bob}"), Some(&session_id), None).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert!(matches!(response, Response::BadRequest));

    assert!(app.inbox(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_session_cookie_reads_as_anonymous() {
    let app = make_app();
    let sessions = Sessions::new();

    let mut request = get("/profile", Some("no-such-session")).await;
    let response = routing::route(&mut request, app, sessions).await.unwrap();
    assert_eq!(redirect_location(&response), "/login");
}

#[tokio::test]
async fn unknown_url_is_bad_request() {
    let app = make_app();
    let sessions = Sessions::new();

    for path in ["/no-such-page", "/message", "/like/1/extra"] {
        let mut request = get(path, None).await;
        let response = routing::route(&mut request, app.clone(), sessions.clone())
            .await
            .unwrap();
        assert!(matches!(response, Response::BadRequest));
    }
}

#[tokio::test]
async fn favicon_gets_an_empty_response() {
    let app = make_app();
    let sessions = Sessions::new();

    let mut request = get("/favicon.ico", None).await;
    let response = routing::route(&mut request, app, sessions).await.unwrap();
    assert!(matches!(response, Response::Empty));
}

#[tokio::test]
async fn public_pages_render_without_a_session() {
    let app = make_app();
    let sessions = Sessions::new();

    for path in ["/", "/register", "/login"] {
        let mut request = get(path, None).await;
        let response = routing::route(&mut request, app.clone(), sessions.clone())
            .await
            .unwrap();
        assert!(matches!(response, Response::Html { .. }));
    }
}

#[tokio::test]
async fn register_login_and_profile_flow() {
    let app = make_app();
    let sessions = Sessions::new();

    let mut request = post(
        "/register",
        None,
        Some("username=alice&password=secret&bio=hiking+and+chess"),
    )
    .await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert_eq!(redirect_location(&response), "/login");

    let session_id = login(&app, &sessions, "alice", "secret").await;

    let mut request = get("/profile", Some(&session_id)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    let content = html_content(&response);
    assert!(content.contains("alice"));
    assert!(content.contains("hiking and chess"));
}

#[tokio::test]
async fn login_with_wrong_password_shows_fail_page() {
    let app = make_app();
    let sessions = Sessions::new();

    app.create_account("alice", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();

    let mut request = post("/login", None, Some("username=alice&password=wrong")).await;
    let response = routing::route(&mut request, app, sessions).await.unwrap();
    assert!(html_content(&response).contains("Wrong username or password"));
}

#[tokio::test]
async fn duplicate_registration_shows_fail_page() {
    let app = make_app();
    let sessions = Sessions::new();

    app.create_account("alice", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();

    let mut request = post("/register", None, Some("username=alice&password=other")).await;
    let response = routing::route(&mut request, app, sessions).await.unwrap();
    assert!(html_content(&response).contains("alice"));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = make_app();
    let sessions = Sessions::new();

    app.create_account("alice", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let session_id = login(&app, &sessions, "alice", "secret").await;

    let mut request = get("/logout", Some(&session_id)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert_eq!(redirect_location(&response), "/");

    let mut request = get("/profile", Some(&session_id)).await;
    let response = routing::route(&mut request, app, sessions).await.unwrap();
    assert_eq!(redirect_location(&response), "/login");
}

#[tokio::test]
async fn browsing_and_liking_through_the_router() {
    let app = make_app();
    let sessions = Sessions::new();

    app.create_account("alice", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let bob = app
        .create_account("bob", "secret".into(), Some("tea enthusiast"))
        .await
        .unwrap()
        .unwrap();
    let session_id = login(&app, &sessions, "alice", "secret").await;

    let mut request = get("/users", Some(&session_id)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    let content = html_content(&response);
    assert!(content.contains("bob"));
    assert!(content.contains("tea enthusiast"));

    let mut request = post(&format!("/like/{bob}"), Some(&session_id), None).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert_eq!(redirect_location(&response), "/users");

    // liking again is not an error
    let mut request = post(&format!("/like/{bob}"), Some(&session_id), None).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert_eq!(redirect_location(&response), "/users");

    let mut request = post("/like/9999", Some(&session_id), None).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert!(matches!(response, Response::BadRequest));

    let mut request = post("/like/not-a-number", Some(&session_id), None).await;
    let response = routing::route(&mut request, app, sessions).await.unwrap();
    assert!(matches!(response, Response::BadRequest));
}

#[tokio::test]
async fn messaging_through_the_router() {
    let app = make_app();
    let sessions = Sessions::new();

    app.create_account("alice", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let bob = app
        .create_account("bob", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let alice_session = login(&app, &sessions, "alice", "secret").await;

    let mut request = get(&format!("/message/{bob}"), Some(&alice_session)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert!(html_content(&response).contains("bob"));

    let mut request = post(
        &format!("/message/{bob}"),
        Some(&alice_session),
        Some("content=see+you+at+8"),
    )
    .await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert_eq!(redirect_location(&response), "/messages");

    let bob_session = login(&app, &sessions, "bob", "secret").await;
    let mut request = get("/messages", Some(&bob_session)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    let content = html_content(&response);
    assert!(content.contains("see you at 8"));
    assert!(content.contains("alice"));

    // the sender's own inbox stays empty
    let mut request = get("/messages", Some(&alice_session)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert!(!html_content(&response).contains("see you at 8"));

    // composing to an unknown user is rejected before any form is shown
    let mut request = get("/message/9999", Some(&alice_session)).await;
    let response = routing::route(&mut request, app, sessions).await.unwrap();
    assert!(matches!(response, Response::BadRequest));
}

#[tokio::test]
async fn overlong_message_is_rejected_at_the_router() {
    let app = make_app();
    let sessions = Sessions::new();

    app.create_account("alice", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let bob = app
        .create_account("bob", "secret".into(), None)
        .await
        .unwrap()
        .unwrap();
    let session_id = login(&app, &sessions, "alice", "secret").await;

    let body = format!("content={}", "x".repeat(501));
    let mut request = post(&format!("/message/{bob}"), Some(&session_id), Some(&body)).await;
    let response = routing::route(&mut request, app.clone(), sessions.clone())
        .await
        .unwrap();
    assert!(matches!(response, Response::BadRequest));

    assert!(app.inbox(bob).await.unwrap().is_empty());
}
