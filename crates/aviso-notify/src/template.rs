//! Message rendering for both transports.
//!
//! Emails are a per-kind content block wrapped in a shared HTML frame;
//! WhatsApp messages are short plain-text summaries of the same context.
//! Context keys: `developer_name`, `client_name`, `date`, `time`, `reason`,
//! `reply_message`, `session_id`. Missing keys render as neutral fallbacks,
//! so a half-filled template is still deliverable.

use std::collections::HashMap;

use aviso_core::types::TemplateKind;

/// Look up a context value with a fallback for absent or empty entries.
fn ctx<'a>(context: &'a HashMap<String, String>, key: &str, fallback: &'a str) -> &'a str {
    match context.get(key) {
        Some(v) if !v.is_empty() => v.as_str(),
        _ => fallback,
    }
}

/// Email subject line for a template kind.
pub fn subject(kind: TemplateKind, context: &HashMap<String, String>) -> String {
    match kind {
        TemplateKind::NewRequest => format!(
            "New session request from {}",
            ctx(context, "client_name", "a client")
        ),
        TemplateKind::Approved => "Your session has been approved".to_string(),
        TemplateKind::Rejected => "Update on your session request".to_string(),
        TemplateKind::Cancelled => "Session cancelled".to_string(),
        TemplateKind::Reminder => "Reminder: upcoming session".to_string(),
        TemplateKind::Generic => "Notification from Portafolio Devs".to_string(),
    }
}

/// Render the full email for `kind`: `(subject, html_body)`.
pub fn render_email(
    kind: TemplateKind,
    context: &HashMap<String, String>,
    frontend_url: &str,
) -> (String, String) {
    let date = ctx(context, "date", "to be confirmed");
    let time = ctx(context, "time", "to be confirmed");
    let developer = ctx(context, "developer_name", "your developer");
    let client = ctx(context, "client_name", "a client");

    let content = match kind {
        TemplateKind::NewRequest => format!(
            "<h2>New Session Request</h2>\
             <p>Hello <strong>{developer}</strong>,</p>\
             <p>You have a new session request waiting for your approval.</p>\
             <div class=\"info-box\"><ul>\
             <li><strong>Requested by:</strong> {client}</li>\
             <li><strong>Date:</strong> {date}</li>\
             <li><strong>Time:</strong> {time}</li>\
             <li><strong>Reason:</strong> {reason}</li>\
             </ul></div>\
             <p>Open your panel to approve or reject this request.</p>\
             <a href=\"{frontend_url}/developer\" class=\"button\">Open Panel</a>",
            reason = ctx(context, "reason", "not specified"),
        ),
        TemplateKind::Approved => format!(
            "<h2>Session Approved</h2>\
             <p>Hello <strong>{client}</strong>,</p>\
             <p>Good news — your session was approved.</p>\
             <div class=\"info-box\"><ul>\
             <li><strong>Developer:</strong> {developer}</li>\
             <li><strong>Date:</strong> {date}</li>\
             <li><strong>Time:</strong> {time}</li>\
             </ul>\
             <p><em>{reply}</em></p></div>\
             <p>See you soon!</p>",
            reply = ctx(context, "reply_message", "No additional message"),
        ),
        TemplateKind::Rejected => format!(
            "<h2>Request Not Approved</h2>\
             <p>Hello <strong>{client}</strong>,</p>\
             <p>Your session request with {developer} was not approved.</p>\
             <div class=\"info-box\"><p><strong>Reason:</strong></p>\
             <p><em>{reply}</em></p></div>\
             <p>You can try booking a different slot.</p>\
             <a href=\"{frontend_url}\" class=\"button\">Browse Developers</a>",
            reply = ctx(
                context,
                "reply_message",
                "The developer is not available at that time"
            ),
        ),
        TemplateKind::Cancelled => format!(
            "<h2>Session Cancelled</h2>\
             <p>The session scheduled for <strong>{date}</strong> at \
             <strong>{time}</strong> has been cancelled.</p>\
             <div class=\"info-box\"><ul>\
             <li><strong>Developer:</strong> {developer}</li>\
             <li><strong>Client:</strong> {client}</li>\
             </ul></div>"
        ),
        TemplateKind::Reminder => format!(
            "<h2>Session Reminder</h2>\
             <p>Hello,</p>\
             <p>You have a session coming up:</p>\
             <div class=\"info-box\"><ul>\
             <li><strong>Date:</strong> {date}</li>\
             <li><strong>Time:</strong> {time}</li>\
             <li><strong>With:</strong> {developer}</li>\
             </ul></div>\
             <p>Don't forget to connect on time!</p>"
        ),
        TemplateKind::Generic => format!(
            "<h2>Notification</h2><p>{}</p>",
            ctx(context, "message", "You have a new notification.")
        ),
    };

    (subject(kind, context), wrap(&content))
}

/// Plain-text body for WhatsApp delivery.
pub fn render_whatsapp(kind: TemplateKind, context: &HashMap<String, String>) -> String {
    let date = ctx(context, "date", "to be confirmed");
    let time = ctx(context, "time", "to be confirmed");
    let developer = ctx(context, "developer_name", "your developer");

    match kind {
        TemplateKind::Approved => format!(
            "Your session was approved!\nDate: {date} at {time}\nWith: {developer}"
        ),
        TemplateKind::Rejected => format!(
            "Your session request was not approved.\nDeveloper: {developer}\nReason: {}",
            ctx(context, "reply_message", "not specified")
        ),
        TemplateKind::Cancelled => format!(
            "Your session has been cancelled.\nIt was scheduled for {date} at {time}\nWith: {developer}"
        ),
        TemplateKind::Reminder => format!(
            "Reminder: you have a session today at {time} with {developer}."
        ),
        TemplateKind::NewRequest | TemplateKind::Generic => ctx(
            context,
            "message",
            "You have a new notification from Portafolio Devs.",
        )
        .to_string(),
    }
}

/// Shared HTML frame around the per-kind content block.
fn wrap(content: &str) -> String {
    format!(
        "<!DOCTYPE html>\
         <html><head><meta charset=\"UTF-8\">\
         <style>\
         body{{font-family:'Segoe UI',Tahoma,sans-serif;background:#f4f4f4;margin:0;padding:0}}\
         .container{{max-width:600px;margin:20px auto;background:#fff;border-radius:12px;overflow:hidden}}\
         .header{{background:linear-gradient(135deg,#A10000 0%,#7B0000 100%);color:#fff;padding:30px;text-align:center}}\
         .content{{padding:30px;color:#333;line-height:1.6}}\
         .info-box{{background:#f8f9fa;border-left:4px solid #A10000;padding:20px;margin:20px 0}}\
         .button{{display:inline-block;padding:14px 35px;background:#A10000;color:#fff !important;text-decoration:none;border-radius:8px;font-weight:bold}}\
         .footer{{background:#f8f9fa;padding:20px;text-align:center;color:#666;font-size:12px}}\
         </style></head>\
         <body><div class=\"container\">\
         <div class=\"header\"><h1>Portafolio Devs</h1></div>\
         <div class=\"content\">{content}</div>\
         <div class=\"footer\"><p>This is an automated email, please do not reply.</p></div>\
         </div></body></html>"
    )
}
