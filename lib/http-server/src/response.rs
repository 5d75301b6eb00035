use cupid_utils::http::Header;

/// What a request handler can answer with. Wire-level concerns (status
/// lines, content types, Content-Length) are filled in when the response is
/// written back to the stream.
pub enum Response {
    Html { content: String, headers: Vec<Header> },
    Redirect { location: String, headers: Vec<Header> },
    BadRequest,
    InternalServerError,
    Empty,
}
