//! Typed session events.

use serde::{Deserialize, Serialize};

use crate::{Coordinates, PhoneNumber};

/// Something that happened to a sharing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Sharing resumed from persisted state at startup.
    Resumed { phone_number: PhoneNumber },
    /// Sharing started (or restarted) by the user.
    Started {
        phone_number: PhoneNumber,
        coordinates: Coordinates,
    },
    /// Sharing stopped by the user.
    Stopped,
    /// A sample reached the sink.
    SampleSent { coordinates: Coordinates },
    /// A sample was captured but the sink rejected it.
    SendFailed { reason: String },
    /// No position could be obtained for a scheduled send.
    PositionFailed { reason: String },
    /// A tick fired while the previous send was still running.
    TickSkipped,
    /// The persisted marker was placed on the map.
    MarkerRestored { coordinates: Coordinates },
    /// The persisted marker could not be placed.
    MarkerRestoreSkipped { reason: String },
}

impl SessionEvent {
    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resumed { .. } => "resumed",
            Self::Started { .. } => "started",
            Self::Stopped => "stopped",
            Self::SampleSent { .. } => "sample_sent",
            Self::SendFailed { .. } => "send_failed",
            Self::PositionFailed { .. } => "position_failed",
            Self::TickSkipped => "tick_skipped",
            Self::MarkerRestored { .. } => "marker_restored",
            Self::MarkerRestoreSkipped { .. } => "marker_restore_skipped",
        }
    }
}
