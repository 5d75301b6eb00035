use anyhow::Result;
use serde::Deserialize;
use tokio::io::AsyncRead;

use cupid_app::app::{App, LikeError, SendMessageError};
use cupid_app::authorization::AuthService;
use cupid_app::data_access::DataAccess;
use cupid_app::UserId;
use cupid_utils::http::header_set_cookie;
use cupid_utils::serde::form_data;
use http_server::request::Request;
use http_server::response::Response;

use crate::routing;
use crate::routing::html;
use crate::routing::RequestContext;
use crate::sessions::{Sessions, SESSION_ID_COOKIE};

pub async fn register<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    app: App<impl DataAccess, impl AuthService>,
) -> Result<Response> {
    // a POST without a usable Content-Length is a malformed client request
    let content = match request.content().await {
        Ok(content) => content,
        Err(_) => return Ok(Response::BadRequest),
    };

    #[derive(Deserialize)]
    struct RegistrationParams {
        username: String,
        password: String,
        bio: Option<String>,
    }

    let params: RegistrationParams = match form_data::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    // browsers submit an untouched bio field as an empty string
    let bio = params.bio.as_deref().filter(|bio| !bio.is_empty());

    match app
        .create_account(&params.username, params.password, bio)
        .await?
    {
        Some(_user_id) => Ok(Response::Redirect {
            location: "/login".into(),
            headers: Vec::new(),
        }),
        None => {
            let content = html::register_fail_page(&params.username)?;
            Ok(Response::Html {
                content,
                headers: Vec::new(),
            })
        }
    }
}

pub async fn login<T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    app: App<impl DataAccess, impl AuthService>,
    sessions: &Sessions,
) -> Result<Response> {
    let content = match request.content().await {
        Ok(content) => content,
        Err(_) => return Ok(Response::BadRequest),
    };

    #[derive(Deserialize)]
    struct LoginParams {
        username: String,
        password: String,
    }

    let params: LoginParams = match form_data::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    match app.verify_user(&params.username, params.password).await? {
        Some(user_id) => {
            let session_id = sessions.open(user_id)?;
            let headers = vec![header_set_cookie(SESSION_ID_COOKIE, &session_id)];

            Ok(Response::Redirect {
                location: "/profile".into(),
                headers,
            })
        }
        None => {
            let content = html::login_fail_page()?;
            Ok(Response::Html {
                content,
                headers: Vec::new(),
            })
        }
    }
}

pub async fn like<D: DataAccess, A>(
    app: App<D, A>,
    ctx: &RequestContext,
    target: &str,
) -> Result<Response> {
    let user_id = match ctx.user_id {
        Some(user_id) => user_id,
        None => return Ok(routing::unauthorized_redirect()),
    };

    let target: UserId = match target.parse() {
        Ok(id) => id,
        Err(_) => return Ok(Response::BadRequest),
    };

    // a repeated like comes back as AlreadyLiked; both outcomes land on the list
    match app.like_user(user_id, target).await {
        Ok(_) => Ok(Response::Redirect {
            location: "/users".into(),
            headers: Vec::new(),
        }),
        Err(LikeError::UnknownUser(_)) => Ok(Response::BadRequest),
        Err(LikeError::Internal(error)) => Err(error),
    }
}

pub async fn send_message<D: DataAccess, A, T: AsyncRead + Unpin>(
    request: &mut Request<T>,
    app: App<D, A>,
    ctx: &RequestContext,
    target: &str,
) -> Result<Response> {
    let user_id = match ctx.user_id {
        Some(user_id) => user_id,
        None => return Ok(routing::unauthorized_redirect()),
    };

    let receiver: UserId = match target.parse() {
        Ok(id) => id,
        Err(_) => return Ok(Response::BadRequest),
    };

    let content = match request.content().await {
        Ok(content) => content,
        Err(_) => return Ok(Response::BadRequest),
    };

    #[derive(Deserialize)]
    struct SendMessageParams {
        content: String,
    }

    let params: SendMessageParams = match form_data::from_str(&content) {
        Ok(params) => params,
        Err(_) => return Ok(Response::BadRequest),
    };

    match app.send_message(params.content, user_id, receiver).await {
        Ok(_message_id) => Ok(Response::Redirect {
            location: "/messages".into(),
            headers: Vec::new(),
        }),
        Err(SendMessageError::ContentTooLong) | Err(SendMessageError::UnknownReceiver(_)) => {
            Ok(Response::BadRequest)
        }
        Err(SendMessageError::Internal(error)) => Err(error),
    }
}

pub fn logout(ctx: &RequestContext, sessions: &Sessions) -> Result<Response> {
    if let Some(session_id) = &ctx.session_id {
        sessions.close(session_id)?;
    }

    Ok(Response::Redirect {
        location: "/".into(),
        headers: Vec::new(),
    })
}
