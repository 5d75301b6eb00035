mod http_response;
pub mod method;
pub mod request;
pub mod response;
pub mod server;
