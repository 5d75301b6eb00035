use anyhow::Result;

use cupid_app::app::App;
use cupid_app::data_access::DataAccess;
use cupid_app::UserId;
use http_server::response::Response;

use crate::routing;
use crate::routing::html;
use crate::routing::RequestContext;

pub fn index() -> Result<Response> {
    let content = html::index_page()?;
    Ok(Response::Html {
        content,
        headers: Vec::new(),
    })
}

pub fn register() -> Result<Response> {
    let content = html::register_page()?;
    Ok(Response::Html {
        content,
        headers: Vec::new(),
    })
}

pub fn login() -> Result<Response> {
    let content = html::login_page()?;
    Ok(Response::Html {
        content,
        headers: Vec::new(),
    })
}

pub async fn profile<D: DataAccess, A>(app: App<D, A>, ctx: &RequestContext) -> Result<Response> {
    let user_id = match ctx.user_id {
        Some(user_id) => user_id,
        None => return Ok(routing::unauthorized_redirect()),
    };

    // a session can outlive its user only if the store was wiped under us
    let user = match app.fetch_user(user_id).await? {
        Some(user) => user,
        None => return Ok(routing::unauthorized_redirect()),
    };

    let content = html::profile_page(&user)?;
    Ok(Response::Html {
        content,
        headers: Vec::new(),
    })
}

pub async fn users<D: DataAccess, A>(app: App<D, A>, ctx: &RequestContext) -> Result<Response> {
    let user_id = match ctx.user_id {
        Some(user_id) => user_id,
        None => return Ok(routing::unauthorized_redirect()),
    };

    let users = app.browse_users(user_id).await?;

    let content = html::users_page(users)?;
    Ok(Response::Html {
        content,
        headers: Vec::new(),
    })
}

pub async fn compose<D: DataAccess, A>(
    app: App<D, A>,
    ctx: &RequestContext,
    target: &str,
) -> Result<Response> {
    if ctx.user_id.is_none() {
        return Ok(routing::unauthorized_redirect());
    }

    let target: UserId = match target.parse() {
        Ok(id) => id,
        Err(_) => return Ok(Response::BadRequest),
    };

    let receiver = match app.fetch_user(target).await? {
        Some(user) => user,
        None => return Ok(Response::BadRequest),
    };

    let content = html::compose_page(&receiver)?;
    Ok(Response::Html {
        content,
        headers: Vec::new(),
    })
}

pub async fn inbox<D: DataAccess, A>(app: App<D, A>, ctx: &RequestContext) -> Result<Response> {
    let user_id = match ctx.user_id {
        Some(user_id) => user_id,
        None => return Ok(routing::unauthorized_redirect()),
    };

    let messages = app.inbox(user_id).await?;

    // storage returns bare messages; sender names are resolved here
    let mut entries = Vec::with_capacity(messages.len());
    for message in messages {
        let sender = app
            .fetch_user(message.from)
            .await?
            .map(|user| user.username)
            .unwrap_or_else(|| format!("user #{}", message.from));
        entries.push(html::InboxEntry {
            sender,
            content: message.content,
            sent_at: message.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        });
    }

    let content = html::inbox_page(entries)?;
    Ok(Response::Html {
        content,
        headers: Vec::new(),
    })
}
