//! # agenda-client
//!
//! Headless presentation layer of the event administration screens: the
//! event form, the map position picker, the rendered event list and the
//! [`RecordManager`] that keeps them in sync with the REST backend.

pub mod config;
pub mod form;
pub mod geo;
pub mod list;
pub mod manager;
pub mod notify;
pub mod state;

mod error;

pub use config::ClientConfig;
pub use error::ManagerError;
pub use form::{EventForm, FormBinder};
pub use geo::{GeoPicker, GeolocationError, HeadlessMap, LocationProvider, MapWidget};
pub use list::{ListRenderer, Row, RowAction};
pub use manager::{Collaborators, RecordManager};
pub use notify::{Confirmer, FixedAnswer, Notifier, Severity, TracingNotifier};
pub use state::WorkflowState;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber (respects `RUST_LOG`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("agenda_client=debug,agenda_net=debug,agenda_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
