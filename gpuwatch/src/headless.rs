//! Headless mode: no terminal UI, one log line per sample.

use tracing::{info, warn};

use crate::config::Settings;
use crate::connection::{ConnectionManager, Dialer};
use crate::error::ConnectionError;
use crate::events::Event;

pub async fn run<D: Dialer>(
    conn: &mut ConnectionManager<D>,
    settings: &Settings,
) -> Result<(), ConnectionError> {
    conn.subscribe(|event| match event {
        Event::Sample(s) => info!(
            time = %s.time_label,
            device = %s.name,
            util_pct = s.utilization_pct,
            memory = %s.memory_label(),
            temp_c = s.temperature_c,
            procs = s.process_count,
            "sample"
        ),
        Event::Closed(reason) => warn!(%reason, "connection closed"),
        Event::Status(_) => {}
    });

    let handle = conn.close_handle();
    let result = tokio::select! {
        res = conn.run_supervised(&settings.endpoint, &settings.reconnect) => res,
        _ = tokio::signal::ctrl_c() => {
            handle.close();
            Ok(())
        }
    };
    conn.shutdown().await;
    result
}
