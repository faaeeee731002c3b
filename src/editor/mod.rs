//! The editing side of the crate: the buffer seam, reversible
//! operations, and the engine that drives them from classified
//! utterances.

pub mod buffer;
pub mod engine;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod functions;
pub mod op;
pub mod text;
