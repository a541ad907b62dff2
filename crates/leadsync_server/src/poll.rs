//! Background polling loop.

use leadsync_engine::{LeadSource, SyncService, TaskBoard};
use std::time::Duration;
use tracing::{error, info};

/// Runs reconciliation cycles forever, one at a time.
///
/// A failed cycle is logged and the loop keeps going; only the process
/// supervisor stops it. Blocking by design: the next cycle starts no
/// sooner than `interval` after the previous one finished.
pub fn run_polling_loop<S, B>(service: &SyncService<S, B>, interval: Duration) -> !
where
    S: LeadSource,
    B: TaskBoard,
{
    info!(interval_secs = interval.as_secs(), "starting polling loop");
    loop {
        let report = service.run_full_sync_cycle();
        if report.succeeded() {
            info!(
                changed = report.changed(),
                record_errors = report.record_errors(),
                "polling cycle complete"
            );
        } else if let Some(failure) = report.first_failure() {
            error!(error = %failure, "polling cycle failed");
        }
        std::thread::sleep(interval);
    }
}
