//! Core interfaces and pure types.

pub mod filter;
pub mod keys;
pub mod text;
pub mod tty;
