//! Interactive line selector for shell pipelines.
//!
//! Lines arrive on stdin, the list is drawn on the controlling terminal in
//! raw mode, and the rows the user picks are emitted on stdout. The
//! terminal never sees anything but the frames; stdout stays clean for the
//! next stage of the pipe.
//!
//! # Public API Overview
//! - Parse input into [`Line`]s and narrow them with [`filter_lines`].
//! - Drive an interactive session with [`run`] against any [`Tty`] backend.
//! - Style the cursor row via [`HighlightStyle`] and the color name maps in
//!   [`config`].
//!
//! The platform backends live in [`platform`]; everything above them talks
//! to the [`Tty`] trait only, which is what the test suites swap out.

pub mod config;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;

/// Line model and query filtering.
pub use crate::core::filter::{filter_lines, Line, MatchSegment};

/// Canonical keystrokes and the escape-sequence decoder.
pub use crate::core::keys::{next_key, Key};

/// Terminal abstraction and its scope guard.
pub use crate::core::tty::{Tty, TtyGuard};

/// Frame painting primitives.
pub use crate::render::{Frame, HighlightStyle};

/// The session loop.
pub use crate::runtime::{run, Outcome};

/// Session configuration.
pub use crate::config::{EnvConfig, Options};
