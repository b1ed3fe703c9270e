//! Invitation mailer
//!
//! Guest creation must not block or fail on mail delivery, so emails go
//! through a bounded queue into a background worker. The worker resolves the
//! SMTP profile per message (system settings first, environment fallback
//! second), retries transient failures, and when it gives up logs the PIN so
//! the administrator can pass it on by hand. No SMTP host at all means the
//! mailer runs mocked and just logs what it would have sent.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use mediavault_common::config::SmtpFallback;
use mediavault_common::db::models::SystemSettings;
use mediavault_common::settings::SettingsStore;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const QUEUE_DEPTH: usize = 64;
const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_SENDER: &str = "no-reply@mediavault.local";

/// One invitation to deliver.
#[derive(Debug, Clone)]
pub struct PinEmail {
    pub to: String,
    pub pin: String,
    pub guest_name: Option<String>,
}

/// Cheap handle for enqueueing invitations.
#[derive(Debug, Clone)]
pub struct MailerHandle {
    tx: mpsc::Sender<PinEmail>,
}

impl MailerHandle {
    /// Enqueue without waiting. A full or closed queue drops the message and
    /// logs the PIN so it is not lost.
    pub fn dispatch(&self, email: PinEmail) {
        if let Err(e) = self.tx.try_send(email) {
            let dropped = match &e {
                mpsc::error::TrySendError::Full(m) => m,
                mpsc::error::TrySendError::Closed(m) => m,
            };
            warn!(
                "Mailer queue unavailable ({}); invitation for {} dropped. PIN is {}",
                e, dropped.to, dropped.pin
            );
        }
    }
}

/// Start the delivery worker and return its handle.
pub fn spawn_mailer(settings: SettingsStore, fallback: SmtpFallback) -> MailerHandle {
    let (tx, mut rx) = mpsc::channel::<PinEmail>(QUEUE_DEPTH);
    tokio::spawn(async move {
        while let Some(email) = rx.recv().await {
            deliver_with_retries(&settings, &fallback, &email).await;
        }
    });
    MailerHandle { tx }
}

/// Effective SMTP parameters for one delivery.
#[derive(Debug, Clone)]
struct SmtpProfile {
    host: Option<String>,
    port: u16,
    user: Option<String>,
    password: Option<String>,
    tls: bool,
    sender_email: String,
    sender_name: String,
    domain: Option<String>,
}

/// A non-empty host in system settings selects the whole settings block;
/// otherwise the environment fallback applies. Sender identity falls through
/// settings, then environment, then the compiled default.
fn resolve_profile(settings: &SystemSettings, fallback: &SmtpFallback) -> SmtpProfile {
    let db_host = settings.smtp_host.as_deref().filter(|h| !h.is_empty());

    let (host, port, user, password, tls) = if let Some(host) = db_host {
        (
            Some(host.to_string()),
            u16::try_from(settings.smtp_port).unwrap_or(587),
            settings.smtp_user.clone().filter(|s| !s.is_empty()),
            settings.smtp_password.clone().filter(|s| !s.is_empty()),
            settings.smtp_tls,
        )
    } else {
        (
            fallback.host.clone(),
            fallback.port,
            fallback.user.clone(),
            fallback.password.clone(),
            fallback.tls,
        )
    };

    let sender_email = settings
        .sender_email
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.sender_email.clone())
        .unwrap_or_else(|| DEFAULT_SENDER.to_string());
    let sender_name = settings
        .sender_name
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            if fallback.sender_name.is_empty() {
                "MediaVault".to_string()
            } else {
                fallback.sender_name.clone()
            }
        });

    SmtpProfile {
        host,
        port,
        user,
        password,
        tls,
        sender_email,
        sender_name,
        domain: settings.domain.clone().filter(|d| !d.is_empty()),
    }
}

async fn deliver_with_retries(settings: &SettingsStore, fallback: &SmtpFallback, email: &PinEmail) {
    let profile = resolve_profile(&settings.get().await, fallback);

    let Some(host) = profile.host.clone() else {
        info!(
            "No SMTP host configured; invitation for {} not sent. PIN is {}",
            email.to, email.pin
        );
        return;
    };

    for attempt in 1..=MAX_ATTEMPTS {
        match send(&host, &profile, email).await {
            Ok(()) => {
                info!("Sent invitation email to {}", email.to);
                return;
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "Invitation email to {} failed (attempt {}/{}): {}",
                    email.to, attempt, MAX_ATTEMPTS, e
                );
                tokio::time::sleep(Duration::from_secs(2 * attempt as u64)).await;
            }
            Err(e) => {
                error!(
                    "Giving up on invitation email to {}: {}. PIN is {}",
                    email.to, e, email.pin
                );
            }
        }
    }
}

async fn send(host: &str, profile: &SmtpProfile, email: &PinEmail) -> anyhow::Result<()> {
    let from = Mailbox::new(
        Some(profile.sender_name.clone()),
        profile.sender_email.parse::<Address>()?,
    );
    let to = Mailbox::new(None, email.to.parse::<Address>()?);

    let (plain, html) = invitation_body(email, profile.domain.as_deref());
    let message = Message::builder()
        .from(from)
        .to(to)
        .subject("Your MediaVault access PIN")
        .multipart(MultiPart::alternative_plain_html(plain, html))?;

    let mut builder = if profile.tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
    };
    builder = builder.port(profile.port);
    if let (Some(user), Some(password)) = (&profile.user, &profile.password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    let transport: AsyncSmtpTransport<Tokio1Executor> = builder.build();
    transport.send(message).await?;
    Ok(())
}

/// Settings hold a bare domain more often than a full URL; an explicit
/// http/https scheme passes through, anything else becomes an https link.
fn link_url(domain: &str) -> String {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

fn invitation_body(email: &PinEmail, domain: Option<&str>) -> (String, String) {
    let greeting = email.guest_name.as_deref().unwrap_or("there");

    let mut plain = format!(
        "Hello {},\n\nYou have been invited to a private media vault.\n\
         Your access PIN is: {}\n",
        greeting, email.pin
    );
    let mut html = format!(
        "<p>Hello {},</p><p>You have been invited to a private media vault.</p>\
         <p>Your access PIN is: <strong>{}</strong></p>",
        greeting, email.pin
    );

    if let Some(domain) = domain {
        let url = link_url(domain);
        plain.push_str(&format!("\nSign in at: {}\n", url));
        html.push_str(&format!("<p>Sign in at: <a href=\"{0}\">{0}</a></p>", url));
    }

    (plain, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin_email() -> PinEmail {
        PinEmail {
            to: "guest@example.com".to_string(),
            pin: "04211337".to_string(),
            guest_name: Some("Ada".to_string()),
        }
    }

    #[test]
    fn settings_host_selects_settings_block() {
        let settings = SystemSettings {
            smtp_host: Some("mail.example.com".to_string()),
            smtp_port: 2525,
            smtp_user: Some("mailer".to_string()),
            smtp_tls: false,
            ..SystemSettings::default()
        };
        let fallback = SmtpFallback {
            host: Some("env.example.com".to_string()),
            port: 587,
            tls: true,
            ..SmtpFallback::default()
        };

        let profile = resolve_profile(&settings, &fallback);
        assert_eq!(profile.host.as_deref(), Some("mail.example.com"));
        assert_eq!(profile.port, 2525);
        assert_eq!(profile.user.as_deref(), Some("mailer"));
        assert!(!profile.tls);
    }

    #[test]
    fn empty_settings_host_falls_back_to_environment() {
        let settings = SystemSettings {
            smtp_host: Some(String::new()),
            ..SystemSettings::default()
        };
        let fallback = SmtpFallback {
            host: Some("env.example.com".to_string()),
            port: 25,
            ..SmtpFallback::default()
        };

        let profile = resolve_profile(&settings, &fallback);
        assert_eq!(profile.host.as_deref(), Some("env.example.com"));
        assert_eq!(profile.port, 25);
        assert_eq!(profile.sender_email, DEFAULT_SENDER);
        assert_eq!(profile.sender_name, "MediaVault");
    }

    #[test]
    fn body_carries_pin_and_optional_link() {
        let (plain, html) = invitation_body(&pin_email(), None);
        assert!(plain.contains("04211337"));
        assert!(html.contains("<strong>04211337</strong>"));
        assert!(!plain.contains("Sign in at"));

        let (plain, html) = invitation_body(&pin_email(), Some("https://vault.example.com"));
        assert!(plain.contains("Sign in at: https://vault.example.com"));
        assert!(html.contains("href=\"https://vault.example.com\""));
    }

    #[test]
    fn scheme_less_domain_links_as_https() {
        let (plain, html) = invitation_body(&pin_email(), Some("vault.example.com"));
        assert!(plain.contains("Sign in at: https://vault.example.com"));
        assert!(html.contains("href=\"https://vault.example.com\""));

        // An explicit scheme is kept as supplied
        let (_, html) = invitation_body(&pin_email(), Some("http://intranet.local"));
        assert!(html.contains("href=\"http://intranet.local\""));
    }

    #[test]
    fn dispatch_on_closed_queue_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = MailerHandle { tx };
        handle.dispatch(pin_email());
    }
}
