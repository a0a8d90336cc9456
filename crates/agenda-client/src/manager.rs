//! Record workflow orchestrator.
//!
//! [`RecordManager`] wires the form, the map picker, the REST client, the
//! record cache and the list into the create / edit / delete / refresh
//! workflow.  The cache is only written with server replies, and at most one
//! mutating call (submit or remove) is in flight per manager.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use agenda_net::{RecordsApi, ReverseGeocoder};
use agenda_shared::{Coordinates, DisplayStatus, Record, RecordId};
use agenda_store::Summary;

use crate::config::ClientConfig;
use crate::error::ManagerError;
use crate::form::{EventForm, FormBinder};
use crate::geo::GeoPicker;
use crate::list::{Row, RowAction};
use crate::notify::{Confirmer, Notifier, Severity};
use crate::state::{ManagerState, WorkflowState};

/// Presentation-layer services the manager reports to.
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
    /// Optional; without it the location input is never autofilled.
    pub geocoder: Option<Arc<dyn ReverseGeocoder>>,
}

/// One workflow instance per page view.  Clones share the same state.
#[derive(Clone)]
pub struct RecordManager {
    inner: Arc<Inner>,
}

struct Inner {
    api: RecordsApi,
    binder: FormBinder,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    default_position: Coordinates,
    default_zoom: u8,
    located_zoom: u8,
    busy: AtomicBool,
    state: Mutex<ManagerState>,
}

// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RecordManager {
    pub fn new(
        config: &ClientConfig,
        api: RecordsApi,
        geo: GeoPicker,
        collaborators: Collaborators,
    ) -> Self {
        let mut state = ManagerState::new(geo);
        state
            .geo
            .recenter(config.default_position, config.default_zoom);

        Self {
            inner: Arc::new(Inner {
                api,
                binder: FormBinder::local(),
                notifier: collaborators.notifier,
                confirmer: collaborators.confirmer,
                geocoder: collaborators.geocoder,
                default_position: config.default_position,
                default_zoom: config.default_zoom,
                located_zoom: config.located_zoom,
                busy: AtomicBool::new(false),
                state: Mutex::new(state),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Workflow
    // -----------------------------------------------------------------------

    /// Back to a blank form with the map at its default position.
    pub fn start_create(&self) -> Result<(), ManagerError> {
        let mut state = self.lock()?;
        self.reset_form(&mut state);
        debug!("Form cleared for a new record");
        Ok(())
    }

    /// Load record `id` into the form.  Falls back to the cached copy when
    /// the fetch fails.
    pub async fn start_edit(&self, id: RecordId) -> Result<Record, ManagerError> {
        let result = self.try_start_edit(id).await;
        self.reported("edit", result)
    }

    /// Validate the form and create or update the record on the server.
    ///
    /// On success the store is updated with the server's copy, the list is
    /// re-rendered and the workflow returns to idle.  On failure nothing
    /// changes and the form keeps the user's input.
    pub async fn submit(&self) -> Result<Record, ManagerError> {
        let result = self.try_submit().await;
        self.reported("submit", result)
    }

    /// Delete record `id` after explicit confirmation.  Returns `false` when
    /// the user declined.
    pub async fn remove(&self, id: RecordId) -> Result<bool, ManagerError> {
        let result = self.try_remove(id).await;
        self.reported("remove", result)
    }

    /// Re-fetch the whole collection and replace the cache.  Returns whether
    /// the cached contents changed.
    pub async fn refresh_all(&self) -> Result<bool, ManagerError> {
        let result = self.try_refresh_all().await;
        self.reported("refresh", result)
    }

    /// Fill the participants multi-select options.
    pub async fn load_participants(&self) -> Result<usize, ManagerError> {
        let result = async {
            let participants = self.inner.api.participants().await?;
            let count = participants.len();
            self.lock()?.form.participant_options = participants;
            Ok(count)
        }
        .await;
        self.reported("participants", result)
    }

    /// Route a row button to the matching operation.
    pub async fn dispatch(&self, action: RowAction) -> Result<(), ManagerError> {
        match action {
            RowAction::Edit(id) => self.start_edit(id).await.map(|_| ()),
            RowAction::Delete(id) => self.remove(id).await.map(|_| ()),
        }
    }

    /// Handle row actions until the sending side goes away.
    pub async fn run_actions(&self, mut actions: mpsc::UnboundedReceiver<RowAction>) {
        while let Some(action) = actions.recv().await {
            // failures are already reported to the user
            let _ = self.dispatch(action).await;
        }
    }

    /// Periodic [`RecordManager::refresh_all`].  `None` for a zero interval.
    pub fn spawn_polling(&self, every: Duration) -> Option<JoinHandle<()>> {
        if every.is_zero() {
            return None;
        }
        let manager = self.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // first tick is immediate; callers refresh on their own at start
            interval.tick().await;
            loop {
                interval.tick().await;
                let _ = manager.refresh_all().await;
            }
        }))
    }

    // -----------------------------------------------------------------------
    // Map
    // -----------------------------------------------------------------------

    /// The map surface was clicked.
    pub async fn map_clicked(&self, raw: Coordinates) -> Result<Coordinates, ManagerError> {
        let (at, autofill) = {
            let mut state = self.lock()?;
            let at = state.geo.handle_click(raw);
            (at, Self::bind_position(&mut state, at))
        };
        if autofill {
            self.autofill_location(at).await;
        }
        Ok(at)
    }

    /// The marker was dropped after a drag.
    pub async fn marker_dragged(&self, raw: Coordinates) -> Result<Coordinates, ManagerError> {
        let (at, autofill) = {
            let mut state = self.lock()?;
            let at = state.geo.handle_drag_end(raw);
            (at, Self::bind_position(&mut state, at))
        };
        if autofill {
            self.autofill_location(at).await;
        }
        Ok(at)
    }

    /// Move the marker to the device position.  Failure only produces a
    /// warning notification.
    pub async fn locate_device(&self) -> Option<Coordinates> {
        let pending = match self.lock() {
            Ok(state) => state.geo.locate_device(),
            Err(e) => {
                self.report("locate", &e);
                return None;
            }
        };

        match pending.await {
            Ok(at) => {
                let autofill = match self.lock() {
                    Ok(mut state) => {
                        state.geo.recenter(at, self.inner.located_zoom);
                        Self::bind_position(&mut state, at)
                    }
                    Err(_) => false,
                };
                info!(lat = at.lat, lng = at.lng, "Device located");
                self.inner
                    .notifier
                    .show("Location found", Severity::Success);
                if autofill {
                    self.autofill_location(at).await;
                }
                Some(at)
            }
            Err(e) => {
                warn!(error = %e, "Device location unavailable");
                self.inner.notifier.show(
                    &format!("Could not get your location: {e}"),
                    Severity::Warning,
                );
                None
            }
        }
    }

    /// Register a listener for user-originated map position changes.
    pub fn on_position_change(
        &self,
        listener: impl Fn(Coordinates) + Send + Sync + 'static,
    ) -> Result<(), ManagerError> {
        self.lock()?.geo.on_change(listener);
        Ok(())
    }

    pub fn marker_position(&self) -> Result<Option<Coordinates>, ManagerError> {
        Ok(self.lock()?.geo.position())
    }

    /// Release the map and any location resource.  Call when the page view
    /// goes away.
    pub fn release(&self) {
        match self.lock() {
            Ok(mut state) => state.geo.release(),
            Err(e) => error!(error = %e, "Could not release map resources"),
        }
    }

    // -----------------------------------------------------------------------
    // Form and list access for the presentation layer
    // -----------------------------------------------------------------------

    pub fn workflow(&self) -> Result<WorkflowState, ManagerError> {
        Ok(self.lock()?.workflow)
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    pub fn form(&self) -> Result<EventForm, ManagerError> {
        Ok(self.lock()?.form.clone())
    }

    /// Apply user input to the form.
    pub fn update_form(&self, edit: impl FnOnce(&mut EventForm)) -> Result<(), ManagerError> {
        edit(&mut self.lock()?.form);
        Ok(())
    }

    pub fn records(&self) -> Result<Vec<Record>, ManagerError> {
        Ok(self.lock()?.store.all().to_vec())
    }

    pub fn rows(&self) -> Result<Vec<Row>, ManagerError> {
        Ok(self.lock()?.list.rows().to_vec())
    }

    pub fn visible_rows(&self) -> Result<Vec<Row>, ManagerError> {
        Ok(self.lock()?.list.visible_rows().cloned().collect())
    }

    pub fn summary(&self) -> Result<Summary, ManagerError> {
        Ok(Summary::compute(self.lock()?.store.all(), Local::now()))
    }

    pub fn apply_filter(&self, term: &str) -> Result<(), ManagerError> {
        self.lock()?.list.apply_filter(term);
        Ok(())
    }

    pub fn filter_status(&self, status: Option<DisplayStatus>) -> Result<(), ManagerError> {
        self.lock()?.list.filter_status(status);
        Ok(())
    }

    pub fn toggle_details(&self, id: RecordId) -> Result<Option<bool>, ManagerError> {
        Ok(self.lock()?.list.toggle_expanded(id))
    }

    /// Receive row button actions; see [`RecordManager::run_actions`].
    pub fn subscribe_actions(&self) -> Result<mpsc::UnboundedReceiver<RowAction>, ManagerError> {
        Ok(self.lock()?.list.subscribe())
    }

    /// A row button was pressed.
    pub fn click(&self, action: RowAction) -> Result<bool, ManagerError> {
        Ok(self.lock()?.list.click(action))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn try_start_edit(&self, id: RecordId) -> Result<Record, ManagerError> {
        let record = match self.inner.api.get(id).await {
            Ok(record) => record,
            Err(e) => {
                let cached = self.lock()?.store.get(id).ok().cloned();
                match cached {
                    Some(record) => {
                        warn!(record_id = %id, error = %e, "Fetch failed, editing cached copy");
                        record
                    }
                    None => return Err(e.into()),
                }
            }
        };

        let mut state = self.lock()?;
        self.inner.binder.write(&mut state.form, &record);
        state.form.record_id = Some(id);
        if let Some(at) = record.coordinates {
            state.geo.recenter(at, self.inner.located_zoom);
        }
        state.workflow = WorkflowState::Editing(id);
        debug!(record_id = %id, "Editing record");
        Ok(record)
    }

    async fn try_submit(&self) -> Result<Record, ManagerError> {
        let _flight = self.begin()?;

        let (record, workflow) = {
            let state = self.lock()?;
            (self.inner.binder.read(&state.form)?, state.workflow)
        };

        let saved = match workflow {
            WorkflowState::Editing(id) => self.inner.api.update(id, &record).await?,
            WorkflowState::Idle => self.inner.api.create(&record).await?,
        };

        {
            let mut state = self.lock()?;
            state.store.upsert(saved.clone())?;
            state.rerender();
            if state.workflow == workflow {
                self.reset_form(&mut state);
            } else {
                debug!(?workflow, now = ?state.workflow, "Form rebound while saving, keeping it");
            }
        }

        let message = match workflow {
            WorkflowState::Idle => "Event created",
            WorkflowState::Editing(_) => "Event updated",
        };
        self.inner.notifier.show(message, Severity::Success);
        Ok(saved)
    }

    async fn try_remove(&self, id: RecordId) -> Result<bool, ManagerError> {
        let _flight = self.begin()?;

        let title = self.lock()?.store.get(id)?.title.clone();
        let prompt = format!("Delete the event \"{title}\"?");
        if !self.inner.confirmer.confirm(&prompt).await {
            debug!(record_id = %id, "Deletion declined");
            return Ok(false);
        }

        self.inner.api.delete(id).await?;

        {
            let mut state = self.lock()?;
            if state.store.remove(id).is_err() {
                debug!(record_id = %id, "Deleted record was no longer cached");
            }
            state.rerender();
            if state.workflow == WorkflowState::Editing(id) {
                self.reset_form(&mut state);
            }
        }

        self.inner.notifier.show("Event deleted", Severity::Success);
        Ok(true)
    }

    async fn try_refresh_all(&self) -> Result<bool, ManagerError> {
        let records = self.inner.api.list().await?;
        let mut state = self.lock()?;
        let changed = state.store.replace_all(records);
        state.rerender();
        if changed {
            info!(count = state.store.len(), "Records refreshed");
        }
        Ok(changed)
    }

    async fn autofill_location(&self, at: Coordinates) {
        let Some(geocoder) = self.inner.geocoder.clone() else {
            return;
        };
        match geocoder.reverse(at).await {
            Ok(address) => {
                if let Ok(mut state) = self.lock() {
                    if state.form.location.trim().is_empty() {
                        state.form.location = address;
                    }
                }
            }
            Err(e) => debug!(error = %e, "Location autofill skipped"),
        }
    }

    // Writes the picked position into the form; true when the location
    // input is still blank.
    fn bind_position(state: &mut ManagerState, at: Coordinates) -> bool {
        state.form.set_coordinates(Some(at));
        state.form.location.trim().is_empty()
    }

    fn reset_form(&self, state: &mut ManagerState) {
        state.workflow = WorkflowState::Idle;
        state.form.reset();
        state
            .geo
            .recenter(self.inner.default_position, self.inner.default_zoom);
    }

    fn begin(&self) -> Result<InFlight<'_>, ManagerError> {
        self.inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ManagerError::Busy)?;
        Ok(InFlight(&self.inner.busy))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ManagerState>, ManagerError> {
        self.inner
            .state
            .lock()
            .map_err(|e| ManagerError::Poisoned(e.to_string()))
    }

    fn reported<T>(
        &self,
        operation: &'static str,
        result: Result<T, ManagerError>,
    ) -> Result<T, ManagerError> {
        if let Err(e) = &result {
            self.report(operation, e);
        }
        result
    }

    fn report(&self, operation: &str, err: &ManagerError) {
        match err {
            ManagerError::Busy => {
                debug!(operation, "Ignored while another operation is in flight");
                return;
            }
            ManagerError::Validation(e) => {
                debug!(operation, field = %e.field, reason = %e.reason, "Validation failed");
            }
            ManagerError::Gateway(e) if e.is_client_error() => {
                warn!(operation, error = %e, "Operation rejected by server");
            }
            other => error!(operation, error = %other, "Operation failed"),
        }
        self.inner
            .notifier
            .show(&err.user_message(), err.severity());
    }
}
