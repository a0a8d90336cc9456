//! # agenda-store
//!
//! In-memory cache of server-confirmed records.  The store is the single
//! source the list is rendered from; it is only ever written with the
//! server's canonical copy of a record, never speculatively.

pub mod store;
pub mod summary;

mod error;

pub use error::StoreError;
pub use store::RecordStore;
pub use summary::Summary;
