//! Masking session management module
//!
//! This module contains:
//! - Session state shared by the source and reference canvases
//! - Message types for canvas, view and palette interactions
//! - Keyboard shortcut translation
//! - Color pair reconciliation

pub mod messages;
pub mod pairing;
pub mod shortcuts;
pub mod state;

pub use messages::Msg;
pub use state::{Action, Session, SubmissionStatus};
