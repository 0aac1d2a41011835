// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outgoing email.
//!
//! The reset flow hands a finished [`EmailMessage`] to an [`EmailSender`] and
//! treats any error as a delivery failure. Which sender runs is decided once
//! at startup:
//!
//! | Sender | When |
//! |--------|------|
//! | [`SmtpEmailSender`] | `MAIL_DELIVERY=smtp` (the default) |
//! | [`LogEmailSender`] | `MAIL_DELIVERY=log`, development only |
//! | [`MemoryEmailSender`] | tests |

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use lettre::{
    address::AddressError,
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::config::MailConfig;

pub const RESET_SUBJECT: &str = "Password Reset Request";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// The reset code email.
pub fn reset_code_message(to: &str, code: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: RESET_SUBJECT.to_string(),
        body: format!("Your password reset code is {code}. It will expire in 15 minutes."),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP delivery failed: {0}")]
    Transport(String),

    #[error("invalid email address {0}")]
    Address(String),

    #[error("email delivery disabled")]
    Disabled,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or report why it could not be sent.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Development sender that logs the recipient instead of sending.
///
/// The body is only logged at debug level because it carries the reset code.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(to = %message.to, subject = %message.subject, "email send stub");
        debug!(body = %message.body, "email body");
        Ok(())
    }
}

/// Test sender that keeps every message in an outbox.
#[derive(Debug, Default)]
pub struct MemoryEmailSender {
    outbox: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::Disabled);
        }
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }
}

/// Sends over SMTP with STARTTLS using the configured mail credentials.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build the transport. No connection is made until the first send.
    pub fn new(mail: &MailConfig) -> Result<Self, EmailError> {
        let address: Address = mail
            .from
            .parse()
            .map_err(|e: AddressError| EmailError::Address(format!("{}: {e}", mail.from)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.server)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .port(mail.port)
            .credentials(Credentials::new(
                mail.username.clone(),
                mail.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: Mailbox::new(Some(mail.from_name.clone()), address),
        })
    }

    fn build(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let to: Address = message
            .to
            .parse()
            .map_err(|e: AddressError| EmailError::Address(format!("{}: {e}", message.to)))?;

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to))
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::Transport(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = self.build(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_message_wording() {
        let message = reset_code_message("a@x.com", "Ab3dE9");
        assert_eq!(message.to, "a@x.com");
        assert_eq!(message.subject, "Password Reset Request");
        assert_eq!(
            message.body,
            "Your password reset code is Ab3dE9. It will expire in 15 minutes."
        );
    }

    #[tokio::test]
    async fn memory_sender_records_and_fails_on_demand() {
        let sender = MemoryEmailSender::new();
        sender.send(&reset_code_message("a@x.com", "111111")).await.unwrap();
        sender.send(&reset_code_message("b@x.com", "222222")).await.unwrap();
        sender.send(&reset_code_message("a@x.com", "333333")).await.unwrap();

        assert_eq!(sender.sent().len(), 3);
        assert!(sender.last_to("a@x.com").unwrap().body.contains("333333"));

        sender.set_failing(true);
        let result = sender.send(&reset_code_message("a@x.com", "444444")).await;
        assert!(matches!(result, Err(EmailError::Disabled)));
        assert_eq!(sender.sent().len(), 3);
    }

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        LogEmailSender
            .send(&reset_code_message("a@x.com", "Ab3dE9"))
            .await
            .unwrap();
    }

    fn mail_config() -> MailConfig {
        MailConfig {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "hunter2".to_string(),
            from: "noreply@exhala.app".to_string(),
            from_name: "Recover Exhala Password".to_string(),
        }
    }

    #[tokio::test]
    async fn smtp_sender_builds_plain_text_reset_email() {
        let sender = SmtpEmailSender::new(&mail_config()).unwrap();
        let email = sender.build(&reset_code_message("a@x.com", "Ab3dE9")).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("Subject: Password Reset Request"));
        assert!(raw.contains("Recover Exhala Password"));
        assert!(raw.contains("<noreply@exhala.app>"));
        assert!(raw.contains("a@x.com"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("Your password reset code is Ab3dE9."));
    }

    #[tokio::test]
    async fn smtp_sender_rejects_bad_addresses() {
        let mut mail = mail_config();
        mail.from = "not-an-address".to_string();
        assert!(matches!(SmtpEmailSender::new(&mail), Err(EmailError::Address(_))));

        let sender = SmtpEmailSender::new(&mail_config()).unwrap();
        let result = sender.send(&reset_code_message("nobody", "Ab3dE9")).await;
        assert!(matches!(result, Err(EmailError::Address(_))));
    }
}
