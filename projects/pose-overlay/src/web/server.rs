use crate::web::api::{process_get, process_upload};
use crate::web::state::AppState;
use anyhow::{bail, Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{any, post},
    Router,
};
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const PROCESS_PATH: &str = "/process/";

/// Any origin, method and header, with credentials. Mirroring the request is
/// required because wildcards cannot be combined with credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// 307 keeps the method and body, so uploads to `/process` still land.
async fn redirect_to_process() -> Redirect {
    Redirect::temporary(PROCESS_PATH)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(PROCESS_PATH, post(process_upload).get(process_get))
        .route("/process", any(redirect_to_process))
        .layer(DefaultBodyLimit::disable())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the first free port at or above `port`.
async fn bind_with_fallback(host: IpAddr, port: u16) -> Result<TcpListener> {
    for candidate in port..=u16::MAX {
        let addr = SocketAddr::new(host, candidate);
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                warn!("{} is in use, trying the next port", addr);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to bind {}", addr)),
        }
    }
    bail!("No free port at or above {}", port)
}

pub async fn run_server(host: IpAddr, port: u16, state: AppState) -> Result<()> {
    let listener = bind_with_fallback(host, port).await?;
    info!("Pose overlay server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
