//! Board themes and the per-run shared GIF palette.

pub mod shared;
pub mod theme;
