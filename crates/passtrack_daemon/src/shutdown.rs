//! Signal handling: Ctrl+C drives the engine lifecycle.

use passtrack::sync::Lifecycle;

/// Install the Ctrl+C handler.
///
/// The first signal asks the engine to drain: loops finish their current
/// cycle boundary (the rescan stops at a committed batch) and exit. A second
/// signal force-quits; the store's idempotent re-derivation makes that safe.
pub fn setup_shutdown_handler(lifecycle: Lifecycle) {
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");

        tracing::warn!("shutdown requested, finishing current operations");
        tracing::warn!("press Ctrl+C again to force quit");
        lifecycle.drain();

        tokio::signal::ctrl_c()
            .await
            .expect("failed to install second Ctrl+C handler");

        tracing::error!("force quit");
        std::process::exit(130);
    });
}
