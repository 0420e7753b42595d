//! Session lifecycle fan-out planning.
//!
//! `plan` turns one [`SessionEvent`] into the list of sends the original
//! product rules call for. It is a pure function over the event so the
//! per-status matrix can be tested without any transport in the loop;
//! the handler executes the plan against the real notifiers.

use std::collections::HashMap;

use tracing::warn;

use aviso_core::types::{SessionEvent, SessionStatus, TemplateKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Email,
    WhatsApp,
}

/// One send the handler should perform.
#[derive(Debug, Clone)]
pub struct PlannedSend {
    pub transport: Transport,
    pub recipient: String,
    pub kind: TemplateKind,
    /// Which party this targets (`"developer"` / `"client"`), for reporting.
    pub target: &'static str,
}

impl PlannedSend {
    fn email(target: &'static str, recipient: &str, kind: TemplateKind) -> Self {
        Self {
            transport: Transport::Email,
            recipient: recipient.to_string(),
            kind,
            target,
        }
    }

    fn whatsapp(target: &'static str, recipient: &str, kind: TemplateKind) -> Self {
        Self {
            transport: Transport::WhatsApp,
            recipient: recipient.to_string(),
            kind,
            target,
        }
    }
}

/// Template variables shared by every send for this event.
pub fn build_context(event: &SessionEvent) -> HashMap<String, String> {
    let mut context = HashMap::from([
        ("session_id".to_string(), event.session_id.clone()),
        ("developer_name".to_string(), event.developer.name.clone()),
        ("client_name".to_string(), event.client.name.clone()),
        ("date".to_string(), event.date.clone()),
        ("time".to_string(), event.time.clone()),
    ]);
    if let Some(reason) = &event.reason {
        context.insert("reason".to_string(), reason.clone());
    }
    if let Some(reply) = &event.reply_message {
        context.insert("reply_message".to_string(), reply.clone());
    }
    context
}

/// Decide which notifications go out for a session event.
///
/// - pending: email the developer (new request) and the client (confirmation)
/// - approved / rejected / cancelled: email both parties; additionally
///   WhatsApp the client when their channel preference asks for it
///
/// Client emails and WhatsApp messages respect `channel_pref`; the developer
/// is always emailed. A WhatsApp send without a phone number on file is
/// skipped with a warning rather than failing the whole event.
pub fn plan(event: &SessionEvent) -> Vec<PlannedSend> {
    let dev = &event.developer;
    let client = &event.client;
    let pref = event.channel_pref;
    let mut sends = Vec::new();

    let push_client_whatsapp = |sends: &mut Vec<PlannedSend>, kind: TemplateKind| {
        if !pref.wants_whatsapp() {
            return;
        }
        match &client.phone {
            Some(phone) if !phone.trim().is_empty() => {
                sends.push(PlannedSend::whatsapp("client", phone, kind));
            }
            _ => warn!(
                session_id = %event.session_id,
                "whatsapp requested but client has no phone number; skipping"
            ),
        }
    };

    match event.status {
        SessionStatus::Pending => {
            sends.push(PlannedSend::email("developer", &dev.email, TemplateKind::NewRequest));
            sends.push(PlannedSend::email("client", &client.email, TemplateKind::Generic));
        }
        SessionStatus::Approved => {
            if pref.wants_email() {
                sends.push(PlannedSend::email("client", &client.email, TemplateKind::Approved));
            }
            sends.push(PlannedSend::email("developer", &dev.email, TemplateKind::Approved));
            push_client_whatsapp(&mut sends, TemplateKind::Approved);
        }
        SessionStatus::Rejected => {
            if pref.wants_email() {
                sends.push(PlannedSend::email("client", &client.email, TemplateKind::Rejected));
            }
            sends.push(PlannedSend::email("developer", &dev.email, TemplateKind::Generic));
            push_client_whatsapp(&mut sends, TemplateKind::Rejected);
        }
        SessionStatus::Cancelled => {
            if pref.wants_email() {
                sends.push(PlannedSend::email("client", &client.email, TemplateKind::Cancelled));
            }
            sends.push(PlannedSend::email("developer", &dev.email, TemplateKind::Cancelled));
            push_client_whatsapp(&mut sends, TemplateKind::Cancelled);
        }
    }

    sends
}
