//! Reply composition
//!
//! Turns the per-step fragments of a finished workflow into the single reply
//! the user sees.

pub mod composer;

pub use composer::{CommunicationStyle, ResponseComposer};
