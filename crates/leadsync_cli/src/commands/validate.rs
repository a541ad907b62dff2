//! Connectivity validation command.

use leadsync_engine::{
    LeadSource, RestLeadSource, RestTaskBoard, SyncConfig, TaskBoard, UreqClient,
};
use tracing::{error, info};

/// Exercises one read call against each external system independently and
/// reports per-system pass/fail.
pub fn run(config: &SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut ok = true;

    let source = RestLeadSource::new(
        config.source.clone(),
        config.retry.clone(),
        UreqClient::new(config.timeout),
    );
    match source.list_leads() {
        Ok(leads) => info!(count = leads.len(), "source OK: fetched leads"),
        Err(err) => {
            ok = false;
            error!(
                error = %err,
                "source connectivity failed; check SOURCE_API_TOKEN scopes, SOURCE_BASE_ID, and SOURCE_TABLE_NAME"
            );
        }
    }

    let board = RestTaskBoard::new(
        config.board.clone(),
        config.retry.clone(),
        UreqClient::new(config.timeout),
    );
    match board.list_tasks() {
        Ok(tasks) => info!(count = tasks.len(), "board OK: fetched tasks across lists"),
        Err(err) => {
            ok = false;
            error!(
                error = %err,
                "board connectivity failed; check BOARD_API_KEY and BOARD_API_TOKEN, and that the list ids belong to a board the token can access"
            );
        }
    }

    if ok {
        info!("validation passed for both systems");
        Ok(())
    } else {
        Err("validation failed; fix the environment and retry".into())
    }
}
