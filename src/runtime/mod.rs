//! The interactive session loop.

pub mod session;

pub use session::{run, Outcome};
