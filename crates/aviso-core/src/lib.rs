//! `aviso-core`: shared configuration, error taxonomy and domain types for
//! the Aviso notification service.
//!
//! Everything in this crate is transport-agnostic: session lifecycle events,
//! notification template kinds, and the settings the adapters need. The
//! actual sending lives in `aviso-notify`; the delayed reminder machinery
//! lives in `aviso-scheduler`.

pub mod config;
pub mod error;
pub mod types;

pub use error::{AvisoError, Result};
