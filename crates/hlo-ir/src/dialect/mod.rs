//! Builders and accessors for the structural dialects every program uses.

pub mod core;
pub mod func;
