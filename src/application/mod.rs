//! Application layer orchestrating the lending rules over injected ports.
//!
//! `LibraryEngine` is the single entry point; the sweep job and notification
//! composition live in their own modules but extend the same engine.

pub mod engine;
pub mod locks;
pub mod notify;
pub mod sweep;
