//! The HTTP server that hosts the dashboard page and its JSON endpoints.
//!
//! One task per connection, HTTP/1.1 only. Handlers read the published dashboard from
//! `AppState`; reloads and uploads go through `AppState::reload_from`, which serializes them.

mod page;
mod routes;

pub use routes::handle;

use crate::state::AppState;
use crate::Result;
use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Binds the listening socket.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))
}

/// Accepts connections on `listener` until `shutdown` completes.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let local = listener
        .local_addr()
        .context("Unable to read the listening address")?;
    info!("Dashboard available at http://{local}/");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Unable to accept a connection: {e}");
                        continue;
                    }
                };
                debug!("Accepted connection from {peer}");
                let state = state.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(handle(&state, req).await) }
                    });
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("Connection from {peer} ended with an error: {e}");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutting down the dashboard server");
                return Ok(());
            }
        }
    }
}
