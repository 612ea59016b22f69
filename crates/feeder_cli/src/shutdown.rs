use feeder::Shutdown;

/// Set up the Ctrl+C handler for graceful shutdown.
///
/// The first Ctrl+C fires `shutdown`: workers stop pulling items and the
/// in-flight ones unwind without being recorded. A second Ctrl+C exits.
pub(crate) fn setup_shutdown_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }

        tracing::warn!("Shutdown requested, finishing current operations (Ctrl+C again to force quit)");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Force quit!");
            std::process::exit(130);
        }
    });
}
