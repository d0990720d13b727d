//! TutorHub Core — domain models, the booking state machine,
//! repository traits and the shared error taxonomy.
//!
//! This crate performs no I/O. Storage lives in `tutorhub-db` and the
//! booking workflows in `tutorhub-booking`.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{TutorError, TutorResult};
