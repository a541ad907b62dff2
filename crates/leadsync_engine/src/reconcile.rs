//! The reconciliation cycle.
//!
//! One cycle is three passes in strict order, each working from a fresh
//! snapshot of the side it reads:
//!
//! 1. **Creation** — every non-terminal lead gets a task (idempotent
//!    upsert-and-converge, not creation-only)
//! 2. **Forward propagation** — tasks follow lead status changes
//! 3. **Reverse propagation** — leads follow task movement
//!
//! Reverse runs strictly after forward, so a task moved by pass 2 in the
//! same cycle is read back and reflected onto its lead in pass 3. The
//! mapping round-trip is stable for every status except `Lost`, so that
//! bounce-back is a no-op; only `Lost` is lossy, and it flows one
//! direction only.
//!
//! Every record-level failure is caught, tagged into the pass report, and
//! processing continues with the next record. A pass fails as a whole only
//! when its snapshot fetch fails, and even then the remaining passes still
//! run; `run_full_sync_cycle` never propagates remote-service errors.

use crate::board::{RestTaskBoard, TaskBoard};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::http::UreqClient;
use crate::source::{LeadSource, RestLeadSource};
use leadsync_model::{lead_to_task, task_to_lead, Lead, LeadStatus, Task, TaskStatus};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// A record that could not be processed, with the error that stopped it.
#[derive(Debug)]
pub struct RecordError {
    /// Id of the record (lead id in passes 1-2, the task's lead id in
    /// pass 3).
    pub record_id: String,
    /// What went wrong.
    pub error: SyncError,
}

/// Per-pass outcome tallies.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Records the pass attempted.
    pub processed: u64,
    /// Writes issued (creates, moves, status updates).
    pub changed: u64,
    /// Records skipped without a write (no mapping entry, no matching
    /// task, already converged, untracked).
    pub skipped: u64,
    /// Records that failed. Never aborts the pass.
    pub errors: Vec<RecordError>,
}

impl PassReport {
    fn record_failure(&mut self, record_id: &str, error: SyncError) {
        self.errors.push(RecordError {
            record_id: record_id.to_string(),
            error,
        });
    }
}

/// A pass either produced a report or failed to fetch its snapshot.
pub type PassOutcome = SyncResult<PassReport>;

/// Outcome of one full reconciliation cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// Creation pass outcome.
    pub creation: PassOutcome,
    /// Forward propagation pass outcome.
    pub forward: PassOutcome,
    /// Reverse propagation pass outcome.
    pub reverse: PassOutcome,
    /// Wall-clock duration of the cycle.
    pub duration: Duration,
}

impl CycleReport {
    fn passes(&self) -> [&PassOutcome; 3] {
        [&self.creation, &self.forward, &self.reverse]
    }

    /// True when every pass fetched its snapshot and ran to completion
    /// (record-level errors do not count against this).
    pub fn succeeded(&self) -> bool {
        self.passes().iter().all(|pass| pass.is_ok())
    }

    /// Total number of record-level errors across the passes that ran.
    pub fn record_errors(&self) -> usize {
        self.passes()
            .iter()
            .filter_map(|pass| pass.as_ref().ok())
            .map(|report| report.errors.len())
            .sum()
    }

    /// Total number of writes issued across the passes that ran.
    pub fn changed(&self) -> u64 {
        self.passes()
            .iter()
            .filter_map(|pass| pass.as_ref().ok())
            .map(|report| report.changed)
            .sum()
    }

    /// The first pass-level failure, if any.
    pub fn first_failure(&self) -> Option<&SyncError> {
        self.passes()
            .into_iter()
            .find_map(|pass| pass.as_ref().err())
    }
}

/// Reconciles the lead store and the task board.
///
/// Holds no cross-cycle state; every cycle recomputes everything from
/// fresh reads. Correctness relies on idempotent upserts rather than
/// exclusion, so callers must serialize invocations of
/// [`SyncService::run_full_sync_cycle`].
pub struct SyncService<S: LeadSource, B: TaskBoard> {
    leads: S,
    board: B,
}

impl<S: LeadSource, B: TaskBoard> SyncService<S, B> {
    /// Creates a service over the two adapters.
    pub fn new(leads: S, board: B) -> Self {
        Self { leads, board }
    }

    /// The lead-source adapter.
    pub fn leads(&self) -> &S {
        &self.leads
    }

    /// The task-board adapter.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Creation pass: ensure every non-terminal lead has a task in the
    /// partition its status maps to.
    pub fn initial_sync(&self) -> PassOutcome {
        let leads = self.leads.list_leads()?;
        let mut report = PassReport::default();

        for lead in leads.iter().filter(|lead| !lead.status.is_terminal()) {
            report.processed += 1;
            match self.create_or_converge(lead) {
                Ok(()) => report.changed += 1,
                Err(err) => {
                    error!(lead_id = %lead.id, error = %err, "creation failed for lead");
                    report.record_failure(&lead.id, err);
                }
            }
        }

        Ok(report)
    }

    fn create_or_converge(&self, lead: &Lead) -> SyncResult<()> {
        let desired = lead_to_task(lead.status).ok_or(SyncError::Unmapped {
            table: "lead-to-task",
            status: lead.status.to_string(),
        })?;

        let title = format!("Follow up: {}", lead.name);
        let notes = format!(
            "Email: {}\nSource: {}",
            lead.email,
            lead.source.as_deref().unwrap_or("")
        );
        self.board
            .ensure_task(&title, &lead.id, desired, Some(&notes))?;
        Ok(())
    }

    /// Forward propagation pass: move each lead's task to the partition
    /// its current status maps to.
    ///
    /// Takes its own fresh snapshot; pass 1 may have mutated board state
    /// that an older lead snapshot would not reflect.
    pub fn lead_to_task_updates(&self) -> PassOutcome {
        let leads = self.leads.list_leads()?;
        let mut report = PassReport::default();

        for lead in &leads {
            report.processed += 1;
            let Some(desired) = lead_to_task(lead.status) else {
                report.skipped += 1;
                continue;
            };
            match self.converge_task(lead, desired) {
                Ok(true) => report.changed += 1,
                Ok(false) => report.skipped += 1,
                Err(err) => {
                    error!(lead_id = %lead.id, error = %err, "forward propagation failed for lead");
                    report.record_failure(&lead.id, err);
                }
            }
        }

        Ok(report)
    }

    fn converge_task(&self, lead: &Lead, desired: TaskStatus) -> SyncResult<bool> {
        let Some(existing) = self.board.find_task_by_lead_id(&lead.id)? else {
            return Ok(false);
        };
        if existing.status == desired {
            return Ok(false);
        }
        self.board.update_task_status(&existing.id, desired)?;
        Ok(true)
    }

    /// Reverse propagation pass: reflect each tracked task's partition
    /// back onto its lead, with a best-effort audit note.
    pub fn task_to_lead_updates(&self) -> PassOutcome {
        let tasks = self.board.list_tasks()?;
        let mut report = PassReport::default();

        for task in &tasks {
            if !task.is_tracked() {
                report.skipped += 1;
                continue;
            }
            report.processed += 1;
            let Some(desired) = task_to_lead(task.status) else {
                report.skipped += 1;
                continue;
            };
            match self.propagate_to_lead(task, desired) {
                Ok(()) => report.changed += 1,
                Err(err) => {
                    error!(
                        task_id = %task.id,
                        lead_id = %task.lead_id,
                        error = %err,
                        "reverse propagation failed for task"
                    );
                    report.record_failure(&task.lead_id, err);
                }
            }
        }

        Ok(report)
    }

    fn propagate_to_lead(&self, task: &Task, desired: LeadStatus) -> SyncResult<()> {
        self.leads.update_lead_status(&task.lead_id, desired)?;

        let audit = format!("{} → {}", task.status, desired);
        if let Err(err) = self.leads.append_note(&task.lead_id, &audit) {
            // The status update already landed; the note is best-effort.
            warn!(lead_id = %task.lead_id, error = %err, "audit note append failed");
        }
        Ok(())
    }

    /// Runs one full cycle: creation, then forward, then reverse.
    ///
    /// Never returns an error for remote-service failures; a pass whose
    /// snapshot fetch failed is recorded in the report and the remaining
    /// passes still run.
    pub fn run_full_sync_cycle(&self) -> CycleReport {
        let start = Instant::now();

        let creation = self.initial_sync();
        if let Err(err) = &creation {
            error!(error = %err, "creation pass aborted");
        }
        let forward = self.lead_to_task_updates();
        if let Err(err) = &forward {
            error!(error = %err, "forward propagation pass aborted");
        }
        let reverse = self.task_to_lead_updates();
        if let Err(err) = &reverse {
            error!(error = %err, "reverse propagation pass aborted");
        }

        let report = CycleReport {
            creation,
            forward,
            reverse,
            duration: start.elapsed(),
        };
        info!(
            changed = report.changed(),
            record_errors = report.record_errors(),
            duration_ms = report.duration.as_millis() as u64,
            "cycle complete"
        );
        report
    }
}

impl SyncService<RestLeadSource<UreqClient>, RestTaskBoard<UreqClient>> {
    /// Wires the two REST adapters from one configuration.
    pub fn over_rest(config: &SyncConfig) -> Self {
        let leads = RestLeadSource::new(
            config.source.clone(),
            config.retry.clone(),
            UreqClient::new(config.timeout),
        );
        let board = RestTaskBoard::new(
            config.board.clone(),
            config.retry.clone(),
            UreqClient::new(config.timeout),
        );
        Self::new(leads, board)
    }
}
