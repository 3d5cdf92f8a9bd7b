//! Fakes for the collaborator traits.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use locshare_core::{
    Coordinates, GeolocationProvider, LocationSample, LocationSink, MapSurface, Notice, Position,
    PositionOptions, SharingConfig, SharingUi,
    traits::{
        MapError, MarkerId, PhoneEntry, PositionError, SinkError, StartControl, StopControl,
    },
};
use serde_json::{Value, json};
use tokio::sync::{Notify, watch};

use crate::{
    SharingSession,
    session::Collaborators,
    storage::MemoryStore,
};

/// Let spawned tasks run to completion.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct FakeGeolocation {
    queue: Mutex<VecDeque<Result<Position, PositionError>>>,
    default: Mutex<Option<Position>>,
    hook: Mutex<Option<Hook>>,
    calls: AtomicUsize,
}

impl FakeGeolocation {
    pub fn push_ok(&self, position: Position) {
        self.queue.lock().unwrap().push_back(Ok(position));
    }

    pub fn push_err(&self, error: PositionError) {
        self.queue.lock().unwrap().push_back(Err(error));
    }

    /// Position returned once the queue is empty.
    pub fn set_default(&self, position: Position) {
        *self.default.lock().unwrap() = Some(position);
    }

    pub fn on_request(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeolocationProvider for FakeGeolocation {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, PositionError> {
        assert_eq!(*options, PositionOptions::default());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook();
        }

        let queued = self.queue.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            self.default
                .lock()
                .unwrap()
                .ok_or_else(|| PositionError::Unavailable("no fix".into()))
        })
    }
}

pub struct FakeMap {
    ready: watch::Sender<bool>,
    markers: Mutex<Vec<(MarkerId, Coordinates)>>,
    fly_calls: Mutex<Vec<(Coordinates, f64)>>,
    fail_placement: Mutex<bool>,
}

impl Default for FakeMap {
    fn default() -> Self {
        Self {
            ready: watch::Sender::new(true),
            markers: Mutex::default(),
            fly_calls: Mutex::default(),
            fail_placement: Mutex::default(),
        }
    }
}

impl FakeMap {
    pub fn set_ready(&self, ready: bool) {
        self.ready.send_replace(ready);
    }

    pub fn fail_placement(&self, fail: bool) {
        *self.fail_placement.lock().unwrap() = fail;
    }

    pub fn markers(&self) -> Vec<Coordinates> {
        self.markers.lock().unwrap().iter().map(|(_, c)| *c).collect()
    }

    pub fn fly_calls(&self) -> Vec<(Coordinates, f64)> {
        self.fly_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MapSurface for FakeMap {
    fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    async fn ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    fn place_marker(&self, at: Coordinates) -> Result<MarkerId, MapError> {
        if *self.fail_placement.lock().unwrap() {
            return Err(MapError::Internal("placement failed".into()));
        }
        let id = MarkerId::new();
        self.markers.lock().unwrap().push((id, at));
        Ok(id)
    }

    fn remove_marker(&self, id: MarkerId) -> Result<(), MapError> {
        let mut markers = self.markers.lock().unwrap();
        let before = markers.len();
        markers.retain(|(m, _)| *m != id);
        if markers.len() == before {
            return Err(MapError::MarkerNotFound(id));
        }
        Ok(())
    }

    fn fly_to(&self, center: Coordinates, zoom: f64, _duration: Duration) -> Result<(), MapError> {
        self.fly_calls.lock().unwrap().push((center, zoom));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSink {
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
    samples: Mutex<Vec<LocationSample>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSink {
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Make the next send wait until the returned gate is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Number of sends started.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Samples that were accepted.
    pub fn samples(&self) -> Vec<LocationSample> {
        self.samples.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationSink for FakeSink {
    async fn send(&self, sample: &LocationSample) -> Result<Value, SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SinkError::Status(503));
        }

        self.samples.lock().unwrap().push(sample.clone());
        Ok(json!({ "status": "ok" }))
    }
}

#[derive(Default)]
pub struct FakePhoneEntry {
    value: Mutex<String>,
    open: Mutex<bool>,
}

impl PhoneEntry for FakePhoneEntry {
    fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    fn set_value(&self, value: &str) {
        *self.value.lock().unwrap() = value.to_string();
    }

    fn open(&self) {
        *self.open.lock().unwrap() = true;
    }

    fn close(&self) {
        *self.open.lock().unwrap() = false;
    }

    fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }
}

pub struct FakeStartControl {
    label: Mutex<String>,
    disabled: Mutex<bool>,
}

impl Default for FakeStartControl {
    fn default() -> Self {
        Self {
            label: Mutex::new("Share my location".to_string()),
            disabled: Mutex::new(false),
        }
    }
}

impl StartControl for FakeStartControl {
    fn label(&self) -> String {
        self.label.lock().unwrap().clone()
    }

    fn set_label(&self, label: &str) {
        *self.label.lock().unwrap() = label.to_string();
    }

    fn is_disabled(&self) -> bool {
        *self.disabled.lock().unwrap()
    }

    fn set_disabled(&self, disabled: bool) {
        *self.disabled.lock().unwrap() = disabled;
    }
}

#[derive(Default)]
pub struct FakeStopControl {
    visible: Mutex<bool>,
}

impl StopControl for FakeStopControl {
    fn show(&self) {
        *self.visible.lock().unwrap() = true;
    }

    fn hide(&self) {
        *self.visible.lock().unwrap() = false;
    }

    fn is_visible(&self) -> bool {
        *self.visible.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeUi {
    pub phone: Option<FakePhoneEntry>,
    pub start: Option<FakeStartControl>,
    pub stop: Option<FakeStopControl>,
    notices: Mutex<Vec<Notice>>,
}

impl FakeUi {
    pub fn complete() -> Self {
        Self {
            phone: Some(FakePhoneEntry::default()),
            start: Some(FakeStartControl::default()),
            stop: Some(FakeStopControl::default()),
            notices: Mutex::default(),
        }
    }

    pub fn type_phone(&self, value: &str) {
        if let Some(phone) = &self.phone {
            phone.open();
            phone.set_value(value);
        }
    }

    pub fn phone_value(&self) -> String {
        self.phone.as_ref().map(PhoneEntry::value).unwrap_or_default()
    }

    pub fn phone_entry_open(&self) -> bool {
        self.phone.as_ref().is_some_and(PhoneEntry::is_open)
    }

    pub fn start_state(&self) -> (String, bool) {
        self.start
            .as_ref()
            .map(|s| (s.label(), s.is_disabled()))
            .unwrap_or_default()
    }

    pub fn stop_visible(&self) -> bool {
        self.stop.as_ref().is_some_and(StopControl::is_visible)
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl SharingUi for FakeUi {
    fn phone_entry(&self) -> Option<&dyn PhoneEntry> {
        self.phone.as_ref().map(|p| p as &dyn PhoneEntry)
    }

    fn start_control(&self) -> Option<&dyn StartControl> {
        self.start.as_ref().map(|s| s as &dyn StartControl)
    }

    fn stop_control(&self) -> Option<&dyn StopControl> {
        self.stop.as_ref().map(|s| s as &dyn StopControl)
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// A session wired to fakes.
pub struct Harness {
    pub session: Arc<SharingSession>,
    pub geolocation: Arc<FakeGeolocation>,
    pub map: Arc<FakeMap>,
    pub sink: Arc<FakeSink>,
    pub ui: Arc<FakeUi>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(FakeUi::complete(), MemoryStore::new())
    }

    pub fn headless() -> Self {
        Self::build(FakeUi::default(), MemoryStore::new())
    }

    pub fn with_store(pairs: &[(&str, &str)]) -> Self {
        Self::build(
            FakeUi::complete(),
            MemoryStore::with_values(pairs.iter().copied()),
        )
    }

    fn build(ui: FakeUi, store: MemoryStore) -> Self {
        let geolocation = Arc::new(FakeGeolocation::default());
        let map = Arc::new(FakeMap::default());
        let sink = Arc::new(FakeSink::default());
        let ui = Arc::new(ui);
        let store = Arc::new(store);

        let session = SharingSession::new(
            SharingConfig::default(),
            Collaborators {
                geolocation: Arc::clone(&geolocation) as Arc<dyn GeolocationProvider>,
                map: Arc::clone(&map) as Arc<dyn MapSurface>,
                sink: Arc::clone(&sink) as Arc<dyn LocationSink>,
                ui: Arc::clone(&ui) as Arc<dyn SharingUi>,
                store: Arc::clone(&store) as Arc<dyn locshare_core::StateStore>,
            },
        );

        Self {
            session,
            geolocation,
            map,
            sink,
            ui,
            store,
        }
    }

    pub fn store_value(&self, key: &str) -> Option<String> {
        self.store.snapshot().unwrap().get(key).cloned()
    }
}
