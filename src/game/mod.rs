//! Recorded games and where they come from.

pub mod model;
pub mod provider;
