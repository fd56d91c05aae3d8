//! The two-phase render/encode pipeline and its scratch lifecycle.

pub mod assembler;
pub mod collector;
pub mod delay;
pub mod encode_stage;
pub mod render_stage;
pub mod run;
pub mod scratch;
