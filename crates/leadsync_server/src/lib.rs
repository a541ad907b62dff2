//! # leadsync Server
//!
//! Process-boundary wrappers around the reconciliation engine:
//!
//! - `GET /health` — liveness probe
//! - `POST /sync` — trigger exactly one reconciliation cycle
//! - a blocking polling loop for daemon deployments
//!
//! These are thin I/O shells with no decision logic; every choice about
//! what to sync lives in `leadsync_engine`. The wrappers serialize cycle
//! invocations — the engine itself has no concurrency guard.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod poll;
mod server;

pub use poll::run_polling_loop;
pub use server::{router, serve};
