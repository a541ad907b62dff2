//! One-shot and polling sync commands.

use leadsync_engine::{SyncConfig, SyncService};
use tracing::info;

/// Runs a single reconciliation cycle.
///
/// Exits non-zero when any pass failed to fetch its snapshot;
/// record-level errors are logged but do not fail the command.
pub fn run_once(config: &SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = SyncService::over_rest(config);
    let report = service.run_full_sync_cycle();

    if report.succeeded() {
        info!(
            changed = report.changed(),
            record_errors = report.record_errors(),
            "sync complete"
        );
        Ok(())
    } else {
        let failure = report
            .first_failure()
            .map(ToString::to_string)
            .unwrap_or_else(|| "sync cycle failed".to_string());
        Err(failure.into())
    }
}

/// Runs cycles on the configured poll interval, forever.
pub fn run_poll(config: &SyncConfig) -> ! {
    let service = SyncService::over_rest(config);
    leadsync_server::run_polling_loop(&service, config.poll_interval)
}
