//! Location sharing session.
//!
//! A session is either inactive or active. Active means a repeating send
//! timer is armed under a phone number identity. The last identity and the
//! last sample are persisted so the next process can resume sharing without
//! asking for location permission again.

use std::{
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use locshare_core::{
    Coordinates, EventStore, GeolocationProvider, LocationSample, LocationSink, MapSurface,
    Notice, PhoneNumber, SessionEvent, SharingConfig, SharingUi, StateStore,
    phone::InvalidPhoneNumber,
    traits::{
        LAST_PHONE_NUMBER_KEY, LAST_SENT_LOCATION_KEY, MapError, MarkerId, PositionError,
        StartControl,
    },
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{DiagnosticReport, RepeatingTimer, diagnose};

/// Label shown on the start control while a location request is pending.
pub const BUSY_LABEL: &str = "Locating...";

/// Errors returned to the user-facing caller.
#[derive(Debug, thiserror::Error)]
pub enum SharingError {
    #[error("Missing UI surface: {0}")]
    MissingSurface(&'static str),
    #[error(transparent)]
    Validation(#[from] InvalidPhoneNumber),
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Geolocation is not supported on this platform")]
    PlatformUnsupported,
    #[error("Could not determine location: {0}")]
    Position(PositionError),
}

impl From<PositionError> for SharingError {
    fn from(e: PositionError) -> Self {
        match e {
            PositionError::PermissionDenied => Self::PermissionDenied,
            PositionError::Unsupported => Self::PlatformUnsupported,
            other => Self::Position(other),
        }
    }
}

impl SharingError {
    /// Notice shown to the user for this error.
    #[must_use]
    pub const fn notice(&self) -> Notice {
        match self {
            Self::MissingSurface(_) => Notice::MissingPhoneEntry,
            Self::Validation(_) => Notice::InvalidPhoneNumber,
            Self::PermissionDenied => Notice::PermissionDenied,
            Self::PlatformUnsupported => Notice::GeolocationUnsupported,
            Self::Position(_) => Notice::LocationUnavailable,
        }
    }
}

/// Result of a single send attempt. Failures are already logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// No phone number is set, nothing was attempted.
    NoIdentity,
    /// No position could be obtained.
    PositionFailed,
    /// The sample was persisted but the sink rejected it.
    SendFailed,
    /// The sample reached the sink.
    Sent,
}

/// Result of startup resumption.
#[derive(Debug)]
pub enum Bootstrap {
    /// Nothing to resume.
    Inactive,
    /// Sharing resumed from persisted state.
    Resumed {
        phone_number: PhoneNumber,
        /// Background task placing the persisted marker once the map is
        /// ready. `None` if the persisted location was unusable.
        marker_restore: Option<JoinHandle<()>>,
    },
}

impl Bootstrap {
    #[must_use]
    pub const fn is_resumed(&self) -> bool {
        matches!(self, Self::Resumed { .. })
    }
}

/// External capabilities a session orchestrates.
#[derive(Clone)]
pub struct Collaborators {
    pub geolocation: Arc<dyn GeolocationProvider>,
    pub map: Arc<dyn MapSurface>,
    pub sink: Arc<dyn LocationSink>,
    pub ui: Arc<dyn SharingUi>,
    pub store: Arc<dyn StateStore>,
}

#[derive(Default)]
struct SessionState {
    phone_number: Option<PhoneNumber>,
    // Some iff the session is active.
    timer: Option<RepeatingTimer>,
    marker: Option<MarkerId>,
}

/// The location sharing session.
pub struct SharingSession {
    config: SharingConfig,
    geolocation: Arc<dyn GeolocationProvider>,
    map: Arc<dyn MapSurface>,
    sink: Arc<dyn LocationSink>,
    ui: Arc<dyn SharingUi>,
    store: Arc<dyn StateStore>,
    events: Arc<EventStore>,
    state: Mutex<SessionState>,
    sends_in_flight: AtomicUsize,
}

impl SharingSession {
    /// Create an inactive session.
    #[must_use]
    pub fn new(config: SharingConfig, collaborators: Collaborators) -> Arc<Self> {
        let Collaborators {
            geolocation,
            map,
            sink,
            ui,
            store,
        } = collaborators;

        Arc::new(Self {
            config,
            geolocation,
            map,
            sink,
            ui,
            store,
            events: Arc::new(EventStore::new()),
            state: Mutex::new(SessionState::default()),
            sends_in_flight: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &SharingConfig {
        &self.config
    }

    /// Event store receiving every lifecycle event.
    #[must_use]
    pub fn events(&self) -> Arc<EventStore> {
        Arc::clone(&self.events)
    }

    /// Whether a send timer is armed.
    pub async fn is_active(&self) -> bool {
        self.state.lock().await.timer.is_some()
    }

    /// Current sharing identity.
    pub async fn phone_number(&self) -> Option<PhoneNumber> {
        self.state.lock().await.phone_number.clone()
    }

    /// Resume sharing from persisted state.
    ///
    /// Resumes only if both a phone number and a last location are stored.
    /// The timer is re-armed without a location request. The marker is
    /// restored in the background once the map is ready.
    pub async fn bootstrap(self: &Arc<Self>) -> Bootstrap {
        let saved_phone = self.read_persisted(LAST_PHONE_NUMBER_KEY).await;
        let saved_location = self.read_persisted(LAST_SENT_LOCATION_KEY).await;

        let location_state = if saved_location.is_some() { "exists" } else { "not found" };
        debug!(
            phone = saved_phone.as_deref().unwrap_or("<none>"),
            location = location_state,
            "Read persisted sharing state"
        );

        let (Some(saved_phone), Some(saved_location)) = (saved_phone, saved_location) else {
            info!("No saved phone number or location found, not resuming");
            return Bootstrap::Inactive;
        };

        let phone_number = match PhoneNumber::parse(&saved_phone) {
            Ok(phone) => phone,
            Err(e) => {
                warn!("Ignoring persisted state: {e}");
                return Bootstrap::Inactive;
            }
        };

        let timer = self.arm_timer();
        {
            let mut state = self.state.lock().await;
            state.phone_number = Some(phone_number.clone());
            if let Some(previous) = state.timer.replace(timer) {
                previous.cancel();
            }
        }
        self.show_stop_control();

        info!(phone = %phone_number, "Resumed location sharing");
        self.events.push(SessionEvent::Resumed {
            phone_number: phone_number.clone(),
        });

        let marker_restore = match Coordinates::from_persisted(&saved_location) {
            Ok(Some(at)) => Some(self.spawn_marker_restore(at)),
            Ok(None) => {
                debug!("Persisted location has no coordinates, skipping marker");
                None
            }
            Err(e) => {
                error!("Error parsing last location: {e}");
                self.events.push(SessionEvent::MarkerRestoreSkipped {
                    reason: e.to_string(),
                });
                None
            }
        };

        Bootstrap::Resumed {
            phone_number,
            marker_restore,
        }
    }

    /// Open the phone entry so the user can start sharing.
    ///
    /// The entry is pre-filled with the last identity, if any.
    ///
    /// # Errors
    /// Returns `MissingSurface` if the UI has no phone entry.
    pub async fn request_sharing(&self) -> Result<(), SharingError> {
        let Some(entry) = self.ui.phone_entry() else {
            return Err(self.fail(SharingError::MissingSurface("phone entry")));
        };

        let remembered = match self.phone_number().await {
            Some(phone) => Some(phone.to_string()),
            None => self.read_persisted(LAST_PHONE_NUMBER_KEY).await,
        };
        if let Some(phone) = remembered.filter(|p| entry.value().trim().is_empty() && !p.is_empty())
        {
            entry.set_value(&phone);
        }

        debug!("Opening phone entry");
        entry.open();
        Ok(())
    }

    /// Start (or restart) sharing with the phone number in the phone entry.
    ///
    /// On success the marker is placed, the camera flies to the position,
    /// a fresh repeating timer replaces any existing one and one sample is
    /// sent right away. Returns the coordinates sharing started at.
    ///
    /// # Errors
    /// Returns error if the phone entry is missing or invalid, or no
    /// position could be obtained. The session state is unchanged then.
    pub async fn start_sharing(self: &Arc<Self>) -> Result<Coordinates, SharingError> {
        let Some(entry) = self.ui.phone_entry() else {
            error!("Phone entry not found");
            return Err(self.fail(SharingError::MissingSurface("phone entry")));
        };

        let phone_number = match PhoneNumber::parse(entry.value().trim()) {
            Ok(phone) => phone,
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Err(e) = self
            .store
            .set(LAST_PHONE_NUMBER_KEY, phone_number.as_str())
            .await
        {
            warn!("Failed to persist phone number: {e}");
        }
        self.state.lock().await.phone_number = Some(phone_number.clone());
        entry.close();

        debug!(phone = %phone_number, "Requesting location");
        let position = {
            let _busy = BusyGuard::engage(self.ui.start_control());
            self.geolocation.current_position(&self.config.position).await
        };

        let position = match position {
            Ok(position) => position,
            Err(e) => {
                error!("Error getting location: {e}");
                return Err(self.fail(e.into()));
            }
        };
        let at = position.coordinates();
        debug!(latitude = at.latitude, longitude = at.longitude, "Geolocation success");

        if let Err(e) = self.place_marker(at).await {
            warn!("Could not place marker: {e}");
        }
        if let Err(e) = self
            .map
            .fly_to(at, self.config.capped_zoom(), self.config.fly_duration)
        {
            warn!("Could not move camera: {e}");
        }

        // Active before the first send completes, so a stop issued while it
        // is still in flight takes effect.
        let timer = self.arm_timer();
        if let Some(previous) = self.state.lock().await.timer.replace(timer) {
            previous.cancel();
        }
        self.show_stop_control();

        info!(phone = %phone_number, "Location sharing started");
        self.events.push(SessionEvent::Started {
            phone_number,
            coordinates: at,
        });
        self.ui.notify(Notice::SharingStarted);

        {
            let _in_flight = InFlightGuard::enter(&self.sends_in_flight);
            self.send_location().await;
        }

        Ok(at)
    }

    /// Capture a fresh position and send it to the sink.
    ///
    /// Never fails: every problem is logged and reported in the outcome.
    /// Nothing here touches the timer.
    pub async fn send_location(&self) -> SendOutcome {
        let Some(phone_number) = self.phone_number().await else {
            error!("Phone number not available, skipping send");
            return SendOutcome::NoIdentity;
        };

        let position = match self.geolocation.current_position(&self.config.position).await {
            Ok(position) => position,
            Err(e) => {
                warn!("Error getting location for server update: {e}");
                self.events.push(SessionEvent::PositionFailed {
                    reason: e.to_string(),
                });
                return SendOutcome::PositionFailed;
            }
        };

        let sample = LocationSample::from_position(&position, &phone_number);
        debug!(
            "Got current position for server update: {:.6}, {:.6}",
            sample.latitude, sample.longitude
        );
        self.persist_sample(&sample).await;

        match self.sink.send(&sample).await {
            Ok(response) => {
                debug!(%response, "Location sent successfully");
                if let Err(e) = self.place_marker(sample.coordinates()).await {
                    warn!("Could not update marker: {e}");
                }
                self.events.push(SessionEvent::SampleSent {
                    coordinates: sample.coordinates(),
                });
                SendOutcome::Sent
            }
            Err(e) => {
                warn!("Error sending location: {e}");
                self.events.push(SessionEvent::SendFailed {
                    reason: e.to_string(),
                });
                SendOutcome::SendFailed
            }
        }
    }

    /// Stop sharing. Returns false if nothing was being shared.
    ///
    /// Sends already in flight are not cancelled. Persisted state is kept;
    /// see [`Self::forget`].
    pub async fn stop_sharing(&self) -> bool {
        let Some(timer) = self.state.lock().await.timer.take() else {
            debug!("No active location sharing to stop");
            return false;
        };
        timer.cancel();

        match self.ui.stop_control() {
            Some(stop) => stop.hide(),
            None => warn!("Stop control not found when trying to hide it"),
        }

        info!("Location sharing stopped");
        self.events.push(SessionEvent::Stopped);
        self.ui.notify(Notice::SharingStopped);
        true
    }

    /// Remove persisted state so the next startup does not resume.
    ///
    /// # Errors
    /// Returns error if the store fails.
    pub async fn forget(&self) -> Result<(), locshare_core::traits::StoreError> {
        self.store.remove(LAST_SENT_LOCATION_KEY).await?;
        self.store.remove(LAST_PHONE_NUMBER_KEY).await?;
        info!("Cleared persisted sharing state");
        Ok(())
    }

    /// Report on the wired collaborators and persisted state.
    pub async fn diagnose(&self) -> DiagnosticReport {
        diagnose(self.ui.as_ref(), self.map.as_ref(), self.store.as_ref()).await
    }

    fn arm_timer(self: &Arc<Self>) -> RepeatingTimer {
        let session = Arc::downgrade(self);
        RepeatingTimer::arm(self.config.send_interval, move || {
            let Some(session) = session.upgrade() else {
                return ControlFlow::Break(());
            };
            session.spawn_scheduled_send();
            ControlFlow::Continue(())
        })
    }

    fn spawn_scheduled_send(self: Arc<Self>) {
        if self.sends_in_flight.load(Ordering::Acquire) > 0 {
            warn!("Previous send still in flight, skipping tick");
            self.events.push(SessionEvent::TickSkipped);
            return;
        }

        let guard = InFlightGuard::enter_owned(&self);
        tokio::spawn(async move {
            let _guard = guard;
            self.send_location().await;
        });
    }

    fn spawn_marker_restore(self: &Arc<Self>, at: Coordinates) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            if !session.map.is_ready() {
                debug!("Map is not ready yet, waiting before placing marker");
                let wait = session.config.map_ready_timeout;
                if tokio::time::timeout(wait, session.map.ready()).await.is_err() {
                    warn!(?wait, "Map never became ready, not restoring marker");
                    session.events.push(SessionEvent::MarkerRestoreSkipped {
                        reason: MapError::NotReady.to_string(),
                    });
                    return;
                }
            }

            match session.place_marker(at).await {
                Ok(_) => {
                    debug!(latitude = at.latitude, longitude = at.longitude, "Restored marker");
                    session
                        .events
                        .push(SessionEvent::MarkerRestored { coordinates: at });
                }
                Err(e) => {
                    warn!("Could not restore marker: {e}");
                    session.events.push(SessionEvent::MarkerRestoreSkipped {
                        reason: e.to_string(),
                    });
                }
            }
        })
    }

    /// Place the session's marker, removing the one placed before it.
    async fn place_marker(&self, at: Coordinates) -> Result<MarkerId, MapError> {
        let mut state = self.state.lock().await;
        if let Some(previous) = state.marker.take() {
            if let Err(e) = self.map.remove_marker(previous) {
                warn!(marker = %previous, "Could not remove previous marker: {e}");
            }
        }
        let marker = self.map.place_marker(at)?;
        state.marker = Some(marker);
        Ok(marker)
    }

    async fn persist_sample(&self, sample: &LocationSample) {
        let json = match serde_json::to_string(sample) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize sample: {e}");
                return;
            }
        };
        match self.store.set(LAST_SENT_LOCATION_KEY, &json).await {
            Ok(()) => debug!("Saved last sent location"),
            Err(e) => warn!("Failed to persist last sent location: {e}"),
        }
    }

    async fn read_persisted(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, "Failed to read persisted state: {e}");
                None
            }
        }
    }

    fn show_stop_control(&self) {
        match self.ui.stop_control() {
            Some(stop) => stop.show(),
            None => error!("Stop control not found"),
        }
    }

    fn fail(&self, e: SharingError) -> SharingError {
        self.ui.notify(e.notice());
        e
    }
}

/// Marks the start control busy and restores it on drop.
struct BusyGuard<'a> {
    control: Option<(&'a dyn StartControl, String, bool)>,
}

impl<'a> BusyGuard<'a> {
    fn engage(control: Option<&'a dyn StartControl>) -> Self {
        let control = control.map(|c| {
            let saved = (c, c.label(), c.is_disabled());
            c.set_label(BUSY_LABEL);
            c.set_disabled(true);
            saved
        });
        Self { control }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if let Some((control, label, disabled)) = self.control.take() {
            control.set_label(&label);
            control.set_disabled(disabled);
        }
    }
}

/// Counts a send as in flight until dropped.
enum InFlightGuard<'a> {
    Borrowed(&'a AtomicUsize),
    Owned(Arc<SharingSession>),
}

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self::Borrowed(counter)
    }
}

impl InFlightGuard<'static> {
    fn enter_owned(session: &Arc<SharingSession>) -> Self {
        session.sends_in_flight.fetch_add(1, Ordering::AcqRel);
        Self::Owned(Arc::clone(session))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let counter = match self {
            Self::Borrowed(counter) => *counter,
            Self::Owned(session) => &session.sends_in_flight,
        };
        counter.fetch_sub(1, Ordering::AcqRel);
    }
}
