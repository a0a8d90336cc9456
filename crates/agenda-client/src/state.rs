//! Mutable workflow state owned by one [`crate::manager::RecordManager`].
//!
//! [`ManagerState`] lives behind a `Mutex` inside the manager; every lock is
//! released before a network or geolocation await.

use chrono::Utc;

use agenda_store::RecordStore;

use crate::form::EventForm;
use crate::geo::GeoPicker;
use crate::list::ListRenderer;

/// Which record, if any, the form is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// Blank form; submitting creates a record.
    #[default]
    Idle,
    /// Form loaded from record `id`; submitting updates it.
    Editing(agenda_shared::RecordId),
}

impl WorkflowState {
    pub fn editing_id(&self) -> Option<agenda_shared::RecordId> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::Editing(id) => Some(*id),
        }
    }
}

/// Central workflow state.
pub struct ManagerState {
    /// Idle or editing a specific record.
    pub workflow: WorkflowState,

    /// Raw values of the event form inputs.
    pub form: EventForm,

    /// Server-confirmed records; the list is rendered from here only.
    pub store: RecordStore,

    /// Row projection of `store`, with filters and row UI state.
    pub list: ListRenderer,

    /// Map picker bound to the form's coordinate inputs.
    pub geo: GeoPicker,
}

impl ManagerState {
    pub fn new(geo: GeoPicker) -> Self {
        Self {
            workflow: WorkflowState::Idle,
            form: EventForm::default(),
            store: RecordStore::new(),
            list: ListRenderer::new(),
            geo,
        }
    }

    /// Re-project the store into rows.
    pub fn rerender(&mut self) {
        self.list.render(self.store.all(), Utc::now());
    }
}
