//! Wiring diagnostics.
//!
//! Reports which UI surfaces exist, whether the map is ready and what
//! persisted state a restart would resume from.

use std::fmt;

use locshare_core::{
    MapSurface, SharingUi, StateStore,
    traits::{LAST_PHONE_NUMBER_KEY, LAST_SENT_LOCATION_KEY},
};
use serde::Serialize;
use tracing::{info, warn};

/// Snapshot of the collaborators a session depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiagnosticReport {
    pub phone_entry: bool,
    pub start_control: bool,
    pub stop_control: bool,
    pub stop_visible: bool,
    pub map_ready: bool,
    pub saved_phone: bool,
    pub saved_location: bool,
}

impl DiagnosticReport {
    /// Whether a restart would resume sharing.
    #[must_use]
    pub const fn would_resume(&self) -> bool {
        self.saved_phone && self.saved_location
    }

    /// Log one line per check.
    pub fn log(&self) {
        for (name, present) in self.checks() {
            if present {
                info!("{name}: yes");
            } else {
                warn!("{name}: no");
            }
        }
    }

    const fn checks(&self) -> [(&'static str, bool); 7] {
        [
            ("phone entry", self.phone_entry),
            ("start control", self.start_control),
            ("stop control", self.stop_control),
            ("stop control visible", self.stop_visible),
            ("map ready", self.map_ready),
            ("saved phone number", self.saved_phone),
            ("saved location", self.saved_location),
        ]
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, present) in self.checks() {
            writeln!(f, "{name}: {}", if present { "yes" } else { "no" })?;
        }
        write!(f, "would resume: {}", self.would_resume())
    }
}

/// Inspect the collaborators.
///
/// Store errors count as missing values.
pub async fn diagnose(
    ui: &dyn SharingUi,
    map: &dyn MapSurface,
    store: &dyn StateStore,
) -> DiagnosticReport {
    let present = |key: &'static str| async move {
        match store.get(key).await {
            Ok(value) => value.is_some_and(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, "Failed to read persisted state: {e}");
                false
            }
        }
    };

    DiagnosticReport {
        phone_entry: ui.phone_entry().is_some(),
        start_control: ui.start_control().is_some(),
        stop_control: ui.stop_control().is_some(),
        stop_visible: ui.stop_control().is_some_and(|s| s.is_visible()),
        map_ready: map.is_ready(),
        saved_phone: present(LAST_PHONE_NUMBER_KEY).await,
        saved_location: present(LAST_SENT_LOCATION_KEY).await,
    }
}
