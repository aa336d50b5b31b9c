//! Terminal frame rendering.

pub mod frame;

pub use frame::{paint, Frame, HighlightStyle};
