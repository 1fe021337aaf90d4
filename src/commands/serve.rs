use crate::commands::Out;
use crate::state::AppState;
use crate::{server, Config, Result};
use tracing::{info, warn};

/// Loads the configured source and serves the dashboard until Ctrl-C.
///
/// A failed first load is not fatal: the server starts anyway and the page can retry with Reload
/// or Upload once the file is fixed.
pub async fn serve(config: Config) -> Result<Out<()>> {
    let addr = config.address()?;
    let state = AppState::new(config);

    if let Err(e) = state.reload().await {
        warn!("Starting without a dashboard: {e:#}");
    }

    let listener = server::bind(addr).await?;
    server::serve(listener, state, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => warn!("Unable to listen for Ctrl-C: {e}"),
        }
    })
    .await?;

    Ok(Out::new_message("Dashboard server stopped"))
}
