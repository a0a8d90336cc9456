//! Headless event list watcher.
//!
//! Loads the client configuration, fetches the event collection, logs the
//! dashboard counters and rows, and keeps polling until Ctrl+C.

use std::sync::Arc;

use tracing::{info, warn};

use agenda_client::{
    init_tracing, ClientConfig, Collaborators, FixedAnswer, GeoPicker, HeadlessMap, RecordManager,
    TracingNotifier,
};
use agenda_net::ReverseGeocoder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting agenda watcher v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let api = config.records_api()?;
    let geo = GeoPicker::init(
        "map",
        config.default_position,
        config.default_zoom,
        Box::new(HeadlessMap::default()),
    );
    let geocoder = config
        .geocoder()
        .map(|g| Arc::new(g) as Arc<dyn ReverseGeocoder>);

    let manager = RecordManager::new(
        &config,
        api,
        geo,
        Collaborators {
            notifier: Arc::new(TracingNotifier),
            // read-only host: never confirms a deletion
            confirmer: Arc::new(FixedAnswer(false)),
            geocoder,
        },
    );

    manager.refresh_all().await?;
    log_snapshot(&manager)?;

    match manager.spawn_polling(config.poll_interval) {
        Some(mut poller) => {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Received Ctrl+C, shutting down");
                    poller.abort();
                }
                ended = &mut poller => {
                    warn!(?ended, "Polling task stopped");
                }
            }
        }
        None => {
            info!("Polling disabled");
            tokio::signal::ctrl_c().await?;
            info!("Received Ctrl+C, shutting down");
        }
    }

    log_snapshot(&manager)?;
    manager.release();

    Ok(())
}

fn log_snapshot(manager: &RecordManager) -> anyhow::Result<()> {
    let summary = manager.summary()?;
    info!(
        total = summary.total,
        today = summary.today,
        flagged = summary.flagged,
        scheduled = summary.scheduled,
        ongoing = summary.ongoing,
        ended = summary.ended,
        "Summary"
    );
    for row in manager.rows()? {
        info!(
            id = %row.id,
            status = %row.status,
            flagged = row.flagged,
            "{} | {} | {}",
            row.title,
            row.location,
            row.schedule
        );
    }
    Ok(())
}
