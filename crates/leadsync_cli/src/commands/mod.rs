//! Command implementations.

pub mod serve;
pub mod sync;
pub mod validate;
