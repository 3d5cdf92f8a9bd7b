//! Abstract UI surface a sharing session drives.
//!
//! Any of the surfaces may be absent (a page without a stop button, a
//! headless run). The session degrades around missing controls instead of
//! failing, except for the phone entry which is required to start sharing.

use std::fmt;

/// User-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The phone number did not validate.
    InvalidPhoneNumber,
    /// No phone-entry surface to read from.
    MissingPhoneEntry,
    /// The user refused location access.
    PermissionDenied,
    /// The location could not be determined.
    LocationUnavailable,
    /// The platform has no geolocation capability.
    GeolocationUnsupported,
    /// Sharing started and will repeat on the timer.
    SharingStarted,
    /// Sharing stopped.
    SharingStopped,
}

impl Notice {
    /// Whether the notice reports a failure.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::SharingStarted | Self::SharingStopped)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidPhoneNumber => {
                "Please enter a valid mobile number: 9 digits starting with 5"
            }
            Self::MissingPhoneEntry => {
                "Error: could not find the phone input field. Please reload and try again."
            }
            Self::PermissionDenied => "Please allow access to your location",
            Self::LocationUnavailable => "Could not determine your location",
            Self::GeolocationUnsupported => "Geolocation is not supported on this device",
            Self::SharingStarted => {
                "Your location was shared successfully and will be updated every 5 minutes"
            }
            Self::SharingStopped => "Location sharing stopped",
        };
        f.write_str(msg)
    }
}

/// Surface where the user types their phone number.
pub trait PhoneEntry: Send + Sync {
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
    fn open(&self);
    fn close(&self);
    fn is_open(&self) -> bool;
}

/// Control that triggers sharing.
pub trait StartControl: Send + Sync {
    fn label(&self) -> String;
    fn set_label(&self, label: &str);
    fn is_disabled(&self) -> bool;
    fn set_disabled(&self, disabled: bool);
}

/// Control that stops sharing. Only visible while sharing.
pub trait StopControl: Send + Sync {
    fn show(&self);
    fn hide(&self);
    fn is_visible(&self) -> bool;
}

/// The UI as seen by a sharing session.
pub trait SharingUi: Send + Sync {
    fn phone_entry(&self) -> Option<&dyn PhoneEntry>;
    fn start_control(&self) -> Option<&dyn StartControl>;
    fn stop_control(&self) -> Option<&dyn StopControl>;

    /// Show a notice to the user.
    fn notify(&self, notice: Notice);
}
