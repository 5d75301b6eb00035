use tokio::io::AsyncRead;

use cupid_app::app::App;
use cupid_app::authorization::AuthService;
use cupid_app::data_access::DataAccess;
use http_server::request::Request;
use http_server::response::Response;

use crate::routing;
use crate::sessions::Sessions;

#[derive(Clone)]
pub struct RequestHandler<D: DataAccess, A: AuthService> {
    app: App<D, A>,
    sessions: Sessions,
}

impl<D: DataAccess, A: AuthService> RequestHandler<D, A> {
    pub fn new(data_access: D, authorization_service: A) -> Self {
        RequestHandler {
            app: App::new(data_access, authorization_service),
            sessions: Sessions::new(),
        }
    }
}

#[derive(Debug)]
pub struct RequestHandlerError {
    inner: anyhow::Error,
}

impl From<anyhow::Error> for RequestHandlerError {
    fn from(inner: anyhow::Error) -> Self {
        RequestHandlerError { inner }
    }
}

impl std::fmt::Display for RequestHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for RequestHandlerError {}

impl<D: DataAccess, A: AuthService, T: AsyncRead + Unpin + Sync + Send>
    http_server::server::RequestHandler<Request<T>> for RequestHandler<D, A>
{
    type Error = RequestHandlerError;

    fn handle(
        self,
        request: &mut Request<T>,
    ) -> impl std::future::Future<Output = Result<Response, Self::Error>> + Send {
        routing::route(request, self.app, self.sessions)
    }
}
