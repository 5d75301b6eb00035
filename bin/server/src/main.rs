use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cupid_app::data_access::DataAccess;
use cupid_auth::{AuthServiceImpl, AuthStorage};
use cupid_web::request_handler;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    host: String,
    #[arg(short, long)]
    port: u32,
    #[arg(long, id="CONNECTION URL", help="Database connection url. Format: postgresql://[user[:password]@][host][:port][/dbname][?param1=value1&...]")]
    db: Option<String>,
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let host = args.host;
    let port = args.port;
    let addr = format!("{host}:{port}");

    let cancellation_token = make_cancellation_token();

    if args.mock {
        let db_access = mock_db::Db::new();
        run_server(db_access, &addr, cancellation_token).await?;
    } else {
        let db_connection = args.db.context("Database connection url must be specified")?;
        let db_access = postgres_db::Db::new(&db_connection).await?;
        db_access.check_migrations().await?;
        let db_graceful_shutdown = db_access.graceful_shutdown(cancellation_token.clone());

        run_server(db_access, &addr, cancellation_token).await?;

        db_graceful_shutdown
            .await
            .context("Join error in thread handling database connection shutdown")?;
    }

    Ok(())
}

async fn run_server<T: DataAccess + AuthStorage>(
    data_access: T,
    addr: &str,
    cancellation_token: CancellationToken,
) -> Result<()> {
    let auth_service = AuthServiceImpl::new(data_access.clone());
    let request_handler = request_handler::RequestHandler::new(data_access, auth_service);
    http_server::server::run_server(addr, request_handler, cancellation_token)
        .await
        .with_context(|| format!("Unable to start server at {}", addr))?;
    Ok(())
}

fn make_cancellation_token() -> CancellationToken {
    let cancellation_token = CancellationToken::new();

    let cloned_token = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
            }
            Err(err) => {
                tracing::error!("Unable to listen for shutdown signal: {}", err);
            }
        };
        cloned_token.cancel();
    });

    cancellation_token
}
