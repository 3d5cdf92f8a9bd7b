//! Location sharing session lifecycle and state stores.
//!
//! Provides:
//! - `SharingSession` - Start, stop, resume and periodic sends
//! - `RepeatingTimer` - The single armed send timer
//! - State store implementations (memory, JSON file)
//! - `diagnose` - Report on which collaborators are wired up

pub mod diagnostics;
pub mod session;
pub mod storage;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use diagnostics::{DiagnosticReport, diagnose};
pub use session::{Bootstrap, Collaborators, SendOutcome, SharingError, SharingSession};
pub use timer::RepeatingTimer;
