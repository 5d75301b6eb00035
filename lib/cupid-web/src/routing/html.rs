use anyhow::{Context, Result};
use askama::Template;

use cupid_app::User;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage {}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterPage {}

#[derive(Template)]
#[template(path = "register_fail.html")]
struct RegisterFailPage<'a> {
    username: &'a str,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginPage {}

#[derive(Template)]
#[template(path = "login_fail.html")]
struct LoginFailPage {}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfilePage<'a> {
    user: &'a User,
}

#[derive(Template)]
#[template(path = "users.html")]
struct UsersPage {
    users: Vec<User>,
}

#[derive(Template)]
#[template(path = "compose.html")]
struct ComposePage<'a> {
    receiver: &'a User,
}

#[derive(Template)]
#[template(path = "inbox.html")]
struct InboxPage {
    entries: Vec<InboxEntry>,
}

/// One inbox row, with the sender name already resolved.
pub struct InboxEntry {
    pub sender: String,
    pub content: String,
    pub sent_at: String,
}

pub fn index_page() -> Result<String> {
    IndexPage {}.render().context("Could not render index.html")
}

pub fn register_page() -> Result<String> {
    RegisterPage {}
        .render()
        .context("Could not render register.html")
}

pub fn register_fail_page(username: &str) -> Result<String> {
    RegisterFailPage { username }
        .render()
        .context("Could not render register_fail.html")
}

pub fn login_page() -> Result<String> {
    LoginPage {}.render().context("Could not render login.html")
}

pub fn login_fail_page() -> Result<String> {
    LoginFailPage {}
        .render()
        .context("Could not render login_fail.html")
}

pub fn profile_page(user: &User) -> Result<String> {
    ProfilePage { user }
        .render()
        .context("Could not render profile.html")
}

pub fn users_page(users: Vec<User>) -> Result<String> {
    UsersPage { users }
        .render()
        .context("Could not render users.html")
}

pub fn compose_page(receiver: &User) -> Result<String> {
    ComposePage { receiver }
        .render()
        .context("Could not render compose.html")
}

pub fn inbox_page(entries: Vec<InboxEntry>) -> Result<String> {
    InboxPage { entries }
        .render()
        .context("Could not render inbox.html")
}
