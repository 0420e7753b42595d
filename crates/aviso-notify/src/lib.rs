//! `aviso-notify`: outbound notification transports.
//!
//! Exposes the [`Notifier`] trait (one `send` per recipient/template pair)
//! and two concrete adapters:
//!
//! | Adapter            | Transport                          |
//! |--------------------|------------------------------------|
//! | [`EmailNotifier`]  | Brevo transactional email API      |
//! | [`WhatsAppNotifier`] | Twilio WhatsApp messaging API    |
//!
//! Both adapters are stateless apart from their credentials and an HTTP
//! client; they can be shared across tasks behind an `Arc`.

pub mod email;
pub mod error;
pub mod notifier;
pub mod template;
pub mod whatsapp;

pub use email::EmailNotifier;
pub use error::{NotifyError, Result};
pub use notifier::{Notifier, SendReceipt};
pub use whatsapp::WhatsAppNotifier;
