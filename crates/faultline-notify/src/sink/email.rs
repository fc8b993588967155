// faultline-notify/src/sink/email.rs
// ============================================================================
// Module: Email Sink
// Description: SMTP email delivery with STARTTLS.
// Purpose: Mail alert summaries to configured recipients.
// Dependencies: faultline-core, lettre, serde_json, tokio
// ============================================================================

//! ## Overview
//! Builds a plain-text mail from the alert and submits it over SMTP with
//! STARTTLS and optional credentials. Channel configuration supplies
//! `smtp_host`, `from_email`, and `to_emails`; `smtp_port` defaults to the
//! submission port. The blocking SMTP transport runs on the blocking pool so
//! delivery never stalls the notifier task.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use faultline_core::ActiveAlert;
use faultline_core::ChannelKind;
use lettre::Message;
use lettre::Transport;
use lettre::message::Mailbox;
use lettre::transport::smtp::SmtpTransport;
use lettre::transport::smtp::authentication::Credentials;
use serde_json::Value;

use crate::sink::ChannelSink;
use crate::sink::SinkError;
use crate::sink::optional_str;
use crate::sink::required_str;
use crate::sink::service_label;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default SMTP submission port.
const DEFAULT_SMTP_PORT: u16 = 587;

// ============================================================================
// SECTION: Email Sink
// ============================================================================

/// SMTP email sink.
#[derive(Default)]
pub struct EmailSink {
    /// Password override applied when the channel config omits one.
    password_override: Option<String>,
}

impl EmailSink {
    /// Builds an email sink.
    #[must_use]
    pub const fn new(password_override: Option<String>) -> Self {
        Self { password_override }
    }
}

#[async_trait]
impl ChannelSink for EmailSink {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, config: &Value, alert: &ActiveAlert) -> Result<(), SinkError> {
        let smtp_host = required_str(config, "smtp_host")?.to_string();
        let from_email = required_str(config, "from_email")?.to_string();
        let to_emails: Vec<String> = config
            .get("to_emails")
            .and_then(Value::as_array)
            .map(|values| {
                values.iter().filter_map(Value::as_str).map(str::to_string).collect()
            })
            .unwrap_or_default();
        if to_emails.is_empty() {
            return Err(SinkError::ConfigIncomplete("missing to_emails".to_string()));
        }
        let smtp_port = config
            .get("smtp_port")
            .and_then(Value::as_u64)
            .and_then(|port| u16::try_from(port).ok())
            .unwrap_or(DEFAULT_SMTP_PORT);
        let smtp_user = optional_str(config, "smtp_user").map(str::to_string);
        let smtp_password = optional_str(config, "smtp_password")
            .map(str::to_string)
            .or_else(|| self.password_override.clone());

        let subject = format!("[{}] {}", alert.severity.as_str(), alert.title);
        let mut body = format!(
            "{}\n\n{}\n\nSeverity: {}\nService: {}\n",
            alert.title,
            alert.description,
            alert.severity.as_str(),
            service_label(alert)
        );
        if let Some(value) = alert.metric_value {
            body.push_str(&format!("Metric Value: {value}\n"));
        }

        let from: Mailbox = from_email
            .parse()
            .map_err(|_| SinkError::ConfigIncomplete("invalid from_email".to_string()))?;
        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in &to_emails {
            let mailbox: Mailbox = recipient
                .parse()
                .map_err(|_| SinkError::ConfigIncomplete("invalid to_emails entry".to_string()))?;
            builder = builder.to(mailbox);
        }
        let message =
            builder.body(body).map_err(|err| SinkError::DeliveryFailed(err.to_string()))?;

        // SMTP submission is blocking; keep it off the async workers.
        let send = tokio::task::spawn_blocking(move || {
            let mut transport = SmtpTransport::starttls_relay(&smtp_host)
                .map_err(|err| SinkError::DeliveryFailed(err.to_string()))?
                .port(smtp_port);
            if let (Some(user), Some(password)) = (smtp_user, smtp_password) {
                transport = transport.credentials(Credentials::new(user, password));
            }
            transport
                .build()
                .send(&message)
                .map(|_| ())
                .map_err(|err| SinkError::DeliveryFailed(err.to_string()))
        });
        send.await.map_err(|err| SinkError::DeliveryFailed(err.to_string()))?
    }
}
