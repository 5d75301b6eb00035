mod actions;
mod html;
mod pages;

use std::collections::HashMap;

use anyhow::Result;
use tokio::io::AsyncRead;

use http_server::request::Request;
use http_server::response::Response;

use cupid_app::app::App;
use cupid_app::authorization::AuthService;
use cupid_app::data_access::DataAccess;
use cupid_app::UserId;
use cupid_utils::http::get_cookies_hashmap;
use cupid_utils::utils::{log_internal_error, CaseInsensitiveString};

use crate::request_handler::RequestHandlerError;
use crate::sessions::{SessionId, Sessions, SESSION_ID_COOKIE};

/// Identity resolved once per request from the session cookie and passed to
/// every handler as an explicit parameter.
pub struct RequestContext {
    pub session_id: Option<SessionId>,
    pub user_id: Option<UserId>,
}

impl RequestContext {
    fn anonymous() -> Self {
        RequestContext {
            session_id: None,
            user_id: None,
        }
    }
}

pub async fn route<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    app: App<impl DataAccess, impl AuthService>,
    sessions: Sessions,
) -> Result<Response, RequestHandlerError> {
    let url = request.url();
    let (path, _query) = match url.split_once('?') {
        Some(res) => res,
        None => (url, ""),
    };
    let path = path.to_owned();

    let mut path_segments = path.split('/').filter(|s| !s.is_empty());

    let method = request.method();
    let query = (
        method,
        path_segments.next(),
        path_segments.next(),
        path_segments.next(),
    );

    let ctx = match request_context(request.headers(), &sessions) {
        Ok(ctx) => ctx,
        Err(error) => {
            log_internal_error(error);
            return Ok(Response::InternalServerError);
        }
    };

    use http_server::method::Method::*;
    let response = match query {
        (Get, None, ..) => pages::index(),
        (Get, Some("register"), None, ..) => pages::register(),
        (Post, Some("register"), None, ..) => actions::register(request, app).await,
        (Get, Some("login"), None, ..) => pages::login(),
        (Post, Some("login"), None, ..) => actions::login(request, app, &sessions).await,
        (Get, Some("profile"), None, ..) => pages::profile(app, &ctx).await,
        (Get, Some("users"), None, ..) => pages::users(app, &ctx).await,
        (Post, Some("like"), Some(target), None) => actions::like(app, &ctx, target).await,
        (Get, Some("message"), Some(target), None) => pages::compose(app, &ctx, target).await,
        (Post, Some("message"), Some(target), None) => {
            actions::send_message(request, app, &ctx, target).await
        }
        (Get, Some("messages"), None, ..) => pages::inbox(app, &ctx).await,
        (Get, Some("logout"), None, ..) => actions::logout(&ctx, &sessions),
        (Get, Some("favicon.ico"), None, ..) => Ok(Response::Empty),
        _ => Ok(Response::BadRequest),
    };

    let response = response.unwrap_or_else(|error| {
        log_internal_error(error);
        Response::InternalServerError
    });

    Ok(response)
}

fn unauthorized_redirect() -> Response {
    Response::Redirect {
        location: "/login".into(),
        headers: Vec::new(),
    }
}

fn request_context(
    headers: &HashMap<CaseInsensitiveString, String>,
    sessions: &Sessions,
) -> Result<RequestContext> {
    let cookies = match get_cookies_hashmap(headers) {
        Ok(cookies) => cookies,
        // a malformed cookie header reads as an anonymous request
        Err(_) => return Ok(RequestContext::anonymous()),
    };

    let session_id = match cookies.get(SESSION_ID_COOKIE) {
        Some(session_id) => session_id.clone(),
        None => return Ok(RequestContext::anonymous()),
    };

    let session_info = sessions.get(&session_id)?;
    Ok(RequestContext {
        user_id: session_info.map(|v| v.user_id),
        session_id: Some(session_id),
    })
}
