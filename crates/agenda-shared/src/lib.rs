//! # agenda-shared
//!
//! Data model shared by every agenda crate: the event [`Record`], its
//! identifiers, map coordinates, the derived [`DisplayStatus`] and the
//! client-side [`ValidationError`].

pub mod constants;
pub mod error;
pub mod status;
pub mod types;

pub use error::{Field, ValidationError};
pub use status::DisplayStatus;
pub use types::*;
