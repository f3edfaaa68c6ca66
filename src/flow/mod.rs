//! Session flow controller
//!
//! The state machine that drives one child session: prompt → capture →
//! analyze → await answer → record → submit → respond → finish. Owns the
//! session record, decides every transition, and maps device/service errors
//! into stage-local retry affordances.

pub mod controller;
pub mod state;

pub use controller::SessionFlow;
pub use state::{ErrorInfo, ErrorKind, SessionState, Stage};
