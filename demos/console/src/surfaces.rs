//! Console stand-ins for the device and UI capabilities.

use std::{
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use locshare_core::{
    Coordinates, GeolocationProvider, MapSurface, Notice, Position, PositionOptions, SharingUi,
    traits::{MapError, MarkerId, PhoneEntry, PositionError, StartControl, StopControl},
};
use tracing::{debug, info};

/// Reports the same fix every time, or nothing when unset.
pub struct FixedGeolocation {
    position: Option<Position>,
}

impl FixedGeolocation {
    #[must_use]
    pub const fn new(position: Option<Position>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, PositionError> {
        debug!(?options, "Position requested");
        self.position.ok_or(PositionError::Unsupported)
    }
}

/// Map that logs instead of rendering.
#[derive(Default)]
pub struct LogMap {
    marker: Mutex<Option<MarkerId>>,
}

#[async_trait]
impl MapSurface for LogMap {
    fn is_ready(&self) -> bool {
        true
    }

    async fn ready(&self) {}

    fn place_marker(&self, at: Coordinates) -> Result<MarkerId, MapError> {
        let id = MarkerId::new();
        info!(marker = %id, latitude = at.latitude, longitude = at.longitude, "Placed marker");
        *self.marker.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        Ok(id)
    }

    fn remove_marker(&self, id: MarkerId) -> Result<(), MapError> {
        let mut marker = self.marker.lock().unwrap_or_else(PoisonError::into_inner);
        if *marker != Some(id) {
            return Err(MapError::MarkerNotFound(id));
        }
        *marker = None;
        debug!(marker = %id, "Removed marker");
        Ok(())
    }

    fn fly_to(&self, center: Coordinates, zoom: f64, duration: Duration) -> Result<(), MapError> {
        info!(
            latitude = center.latitude,
            longitude = center.longitude,
            zoom,
            ?duration,
            "Camera moved"
        );
        Ok(())
    }
}

/// Terminal UI: the phone number comes from the command line and notices
/// are printed.
pub struct ConsoleUi {
    phone: Mutex<String>,
    phone_open: AtomicBool,
    label: Mutex<String>,
    disabled: AtomicBool,
    stop_visible: AtomicBool,
}

impl ConsoleUi {
    #[must_use]
    pub fn new(phone: Option<&str>) -> Self {
        Self {
            phone: Mutex::new(phone.unwrap_or_default().to_string()),
            phone_open: AtomicBool::new(false),
            label: Mutex::new("Share my location".to_string()),
            disabled: AtomicBool::new(false),
            stop_visible: AtomicBool::new(false),
        }
    }
}

impl PhoneEntry for ConsoleUi {
    fn value(&self) -> String {
        self.phone
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_value(&self, value: &str) {
        *self.phone.lock().unwrap_or_else(PoisonError::into_inner) = value.to_string();
    }

    fn open(&self) {
        self.phone_open.store(true, Ordering::Relaxed);
    }

    fn close(&self) {
        self.phone_open.store(false, Ordering::Relaxed);
    }

    fn is_open(&self) -> bool {
        self.phone_open.load(Ordering::Relaxed)
    }
}

impl StartControl for ConsoleUi {
    fn label(&self) -> String {
        self.label
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_label(&self, label: &str) {
        debug!(label, "Start control label");
        *self.label.lock().unwrap_or_else(PoisonError::into_inner) = label.to_string();
    }

    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Relaxed);
    }
}

impl StopControl for ConsoleUi {
    fn show(&self) {
        self.stop_visible.store(true, Ordering::Relaxed);
        println!("Sharing is active. Press Ctrl-C to stop.");
    }

    fn hide(&self) {
        self.stop_visible.store(false, Ordering::Relaxed);
    }

    fn is_visible(&self) -> bool {
        self.stop_visible.load(Ordering::Relaxed)
    }
}

impl SharingUi for ConsoleUi {
    fn phone_entry(&self) -> Option<&dyn PhoneEntry> {
        Some(self)
    }

    fn start_control(&self) -> Option<&dyn StartControl> {
        Some(self)
    }

    fn stop_control(&self) -> Option<&dyn StopControl> {
        Some(self)
    }

    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            eprintln!("! {notice}");
        } else {
            println!("* {notice}");
        }
    }
}
