//! Map position picker.
//!
//! [`GeoPicker`] owns a single draggable marker on an external map widget.
//! User clicks and marker drags report a rounded coordinate to every
//! registered listener; programmatic moves do not.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use agenda_shared::Coordinates;

/// Interactive map surface (tiles, view, one marker layer).
pub trait MapWidget: Send {
    fn mount(&mut self, container_id: &str, center: Coordinates, zoom: u8);
    fn set_view(&mut self, center: Coordinates, zoom: u8);
    fn place_marker(&mut self, at: Coordinates);
    fn remove_marker(&mut self);
    fn unmount(&mut self) {}
}

/// Device position source (GPS / platform geolocation).
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;

    /// Stop any acquired hardware resource.
    fn release(&self) {}
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    Denied,

    #[error("Location unavailable")]
    Unavailable,

    #[error("Location request timed out")]
    TimedOut,
}

type ChangeListener = Box<dyn Fn(Coordinates) + Send + Sync>;

/// Handle to a mounted map with at most one marker.
pub struct GeoPicker {
    container_id: String,
    widget: Box<dyn MapWidget>,
    marker: Option<Coordinates>,
    listeners: Vec<ChangeListener>,
    locator: Option<Arc<dyn LocationProvider>>,
    locate_timeout: Duration,
    mounted: bool,
}

impl GeoPicker {
    /// Mount `widget` in `container_id` centred on `initial`, with the marker
    /// placed there.
    pub fn init(
        container_id: &str,
        initial: Coordinates,
        zoom: u8,
        mut widget: Box<dyn MapWidget>,
    ) -> Self {
        widget.mount(container_id, initial, zoom);
        let mut picker = Self {
            container_id: container_id.to_string(),
            widget,
            marker: None,
            listeners: Vec::new(),
            locator: None,
            locate_timeout: Duration::from_secs(agenda_shared::constants::GEOLOCATION_TIMEOUT_SECS),
            mounted: true,
        };
        picker.replace_marker(initial);
        debug!(container = %picker.container_id, "Map mounted");
        picker
    }

    pub fn with_locator(mut self, locator: Arc<dyn LocationProvider>, timeout: Duration) -> Self {
        self.locator = Some(locator);
        self.locate_timeout = timeout;
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Current marker position.
    pub fn position(&self) -> Option<Coordinates> {
        self.marker
    }

    /// Move the marker without notifying listeners.
    pub fn set_position(&mut self, at: Coordinates) {
        self.replace_marker(at);
    }

    /// Move the marker and centre the view on it.
    pub fn recenter(&mut self, at: Coordinates, zoom: u8) {
        self.replace_marker(at);
        self.widget.set_view(at, zoom);
    }

    /// Register a listener for user-originated position changes.
    ///
    /// Listeners run synchronously inside the click/drag handler.
    pub fn on_change(&mut self, listener: impl Fn(Coordinates) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Map surface clicked: a new marker replaces the previous one.
    pub fn handle_click(&mut self, raw: Coordinates) -> Coordinates {
        let at = raw.rounded();
        self.replace_marker(at);
        self.notify(at);
        at
    }

    /// Marker dropped after a drag.
    pub fn handle_drag_end(&mut self, raw: Coordinates) -> Coordinates {
        let at = raw.rounded();
        self.marker = Some(at);
        self.notify(at);
        at
    }

    /// Ask the device for its position, waiting at most the configured
    /// timeout.  The returned future owns everything it needs, so the picker
    /// may be borrowed elsewhere while it is pending.
    pub fn locate_device(
        &self,
    ) -> impl Future<Output = Result<Coordinates, GeolocationError>> + Send + 'static {
        let locator = self.locator.clone();
        let timeout = self.locate_timeout;
        async move {
            let locator = locator.ok_or(GeolocationError::Unavailable)?;
            match tokio::time::timeout(timeout, locator.current_position()).await {
                Ok(result) => result.map(Coordinates::rounded),
                Err(_) => {
                    warn!(?timeout, "Device location timed out");
                    Err(GeolocationError::TimedOut)
                }
            }
        }
    }

    /// Tear down: drop the marker, release the location source and unmount
    /// the widget.  Idempotent.
    pub fn release(&mut self) {
        if !self.mounted {
            return;
        }
        if self.marker.take().is_some() {
            self.widget.remove_marker();
        }
        if let Some(locator) = self.locator.take() {
            locator.release();
        }
        self.listeners.clear();
        self.widget.unmount();
        self.mounted = false;
        debug!(container = %self.container_id, "Map released");
    }

    fn replace_marker(&mut self, at: Coordinates) {
        if self.marker.take().is_some() {
            self.widget.remove_marker();
        }
        self.widget.place_marker(at);
        self.marker = Some(at);
    }

    fn notify(&self, at: Coordinates) {
        for listener in &self.listeners {
            listener(at);
        }
    }
}

impl Drop for GeoPicker {
    fn drop(&mut self) {
        self.release();
    }
}

/// Map widget with no rendering, tracking view and marker state only.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMap {
    pub center: Option<Coordinates>,
    pub zoom: u8,
    pub marker: Option<Coordinates>,
}

impl MapWidget for HeadlessMap {
    fn mount(&mut self, _container_id: &str, center: Coordinates, zoom: u8) {
        self.set_view(center, zoom);
    }

    fn set_view(&mut self, center: Coordinates, zoom: u8) {
        self.center = Some(center);
        self.zoom = zoom;
    }

    fn place_marker(&mut self, at: Coordinates) {
        self.marker = Some(at);
    }

    fn remove_marker(&mut self) {
        self.marker = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Mount,
        View(Coordinates, u8),
        Place(Coordinates),
        Remove,
        Unmount,
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Recorder {
        fn live_markers(&self) -> i32 {
            self.calls.lock().unwrap().iter().fold(0, |n, c| match c {
                Call::Place(_) => n + 1,
                Call::Remove => n - 1,
                _ => n,
            })
        }
    }

    impl MapWidget for Recorder {
        fn mount(&mut self, _: &str, _: Coordinates, _: u8) {
            self.calls.lock().unwrap().push(Call::Mount);
        }
        fn set_view(&mut self, center: Coordinates, zoom: u8) {
            self.calls.lock().unwrap().push(Call::View(center, zoom));
        }
        fn place_marker(&mut self, at: Coordinates) {
            self.calls.lock().unwrap().push(Call::Place(at));
        }
        fn remove_marker(&mut self) {
            self.calls.lock().unwrap().push(Call::Remove);
        }
        fn unmount(&mut self) {
            self.calls.lock().unwrap().push(Call::Unmount);
        }
    }

    struct SlowLocator;

    #[async_trait]
    impl LocationProvider for SlowLocator {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Coordinates::new(0.0, 0.0))
        }
    }

    struct FixedLocator(Result<Coordinates, GeolocationError>);

    #[async_trait]
    impl LocationProvider for FixedLocator {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            self.0
        }
    }

    fn start() -> Coordinates {
        Coordinates::new(-1.4558, -48.5039)
    }

    #[test]
    fn test_single_marker_across_clicks() {
        let recorder = Recorder::default();
        let mut picker = GeoPicker::init("map", start(), 13, Box::new(recorder.clone()));
        assert_eq!(recorder.live_markers(), 1);

        picker.handle_click(Coordinates::new(1.0, 2.0));
        picker.handle_click(Coordinates::new(3.0, 4.0));
        picker.set_position(Coordinates::new(5.0, 6.0));

        assert_eq!(recorder.live_markers(), 1);
        assert_eq!(picker.position(), Some(Coordinates::new(5.0, 6.0)));
    }

    #[test]
    fn test_click_and_drag_report_six_decimals() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut picker = GeoPicker::init("map", start(), 13, Box::new(HeadlessMap::default()));
        let sink = seen.clone();
        picker.on_change(move |c| sink.lock().unwrap().push(c));

        picker.handle_click(Coordinates::new(-1.123456789, 48.987654321));
        picker.handle_drag_end(Coordinates::new(10.0000004, -20.9999996));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Coordinates::new(-1.123457, 48.987654));
        assert_eq!(seen[1], Coordinates::new(10.0, -21.0));
        for c in seen.iter() {
            let (lat, lng) = c.to_fixed();
            assert_eq!(lat.parse::<f64>().unwrap(), c.lat);
            assert_eq!(lng.parse::<f64>().unwrap(), c.lng);
        }
    }

    #[test]
    fn test_programmatic_move_is_silent() {
        let calls = Arc::new(Mutex::new(0));
        let mut picker = GeoPicker::init("map", start(), 13, Box::new(HeadlessMap::default()));
        let sink = calls.clone();
        picker.on_change(move |_| *sink.lock().unwrap() += 1);

        picker.set_position(Coordinates::new(1.0, 1.0));
        picker.recenter(Coordinates::new(2.0, 2.0), 15);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let recorder = Recorder::default();
        let mut picker = GeoPicker::init("map", start(), 13, Box::new(recorder.clone()));
        picker.release();
        picker.release();
        drop(picker);

        assert_eq!(recorder.live_markers(), 0);
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| **c == Call::Unmount).count(), 1);
        assert_eq!(calls[0], Call::Mount);
    }

    #[tokio::test]
    async fn test_locate_times_out() {
        let picker = GeoPicker::init("map", start(), 13, Box::new(HeadlessMap::default()))
            .with_locator(Arc::new(SlowLocator), Duration::from_millis(20));
        assert_eq!(picker.locate_device().await, Err(GeolocationError::TimedOut));
    }

    #[tokio::test]
    async fn test_locate_without_provider_is_unavailable() {
        let picker = GeoPicker::init("map", start(), 13, Box::new(HeadlessMap::default()));
        assert_eq!(picker.locate_device().await, Err(GeolocationError::Unavailable));
    }

    #[tokio::test]
    async fn test_locate_passes_through_denial_and_rounds() {
        let denied = GeoPicker::init("map", start(), 13, Box::new(HeadlessMap::default()))
            .with_locator(Arc::new(FixedLocator(Err(GeolocationError::Denied))), Duration::from_secs(1));
        assert_eq!(denied.locate_device().await, Err(GeolocationError::Denied));

        let found = GeoPicker::init("map", start(), 13, Box::new(HeadlessMap::default()))
            .with_locator(
                Arc::new(FixedLocator(Ok(Coordinates::new(0.1234564, 0.0)))),
                Duration::from_secs(1),
            );
        assert_eq!(found.locate_device().await, Ok(Coordinates::new(0.123456, 0.0)));
    }
}
