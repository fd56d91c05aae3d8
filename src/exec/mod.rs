//! Bounded job execution and first-failure tracking.

pub mod executor;
pub mod latch;
