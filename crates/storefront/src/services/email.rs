//! Email service for password recovery messages.
//!
//! Uses SMTP via lettre with Askama HTML and plain text templates. SMTP
//! settings come from the admin configuration, so a service is built per
//! request rather than held in application state.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::models::SmtpSettings;
use crate::services::auth::RECOVERY_TOKEN_TTL_HOURS;

/// Display name on outgoing mail.
const SENDER_NAME: &str = "EduJuegos";

const RECOVERY_SUBJECT: &str = "🔐 Recuperación de Contraseña - EduJuegos";

/// HTML template for the password recovery email.
#[derive(Template)]
#[template(path = "email/password_recovery.html")]
struct PasswordRecoveryHtml<'a> {
    name: &'a str,
    link: &'a str,
    expires_in_hours: i64,
}

/// Plain text template for the password recovery email.
#[derive(Template)]
#[template(path = "email/password_recovery.txt")]
struct PasswordRecoveryText<'a> {
    name: &'a str,
    link: &'a str,
    expires_in_hours: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// The SMTP server did not accept the connection.
    #[error("SMTP connection check failed")]
    ConnectionRejected,

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Create an email service from the stored SMTP settings.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::InvalidAddress` if the sender address is invalid.
    /// Returns `EmailError::Smtp` if the relay cannot be configured.
    /// Must be called inside a Tokio runtime; the transport pool spawns a task.
    pub fn new(settings: &SmtpSettings) -> Result<Self, EmailError> {
        let address = settings
            .email
            .parse()
            .map_err(|_| EmailError::InvalidAddress(settings.email.clone()))?;

        let credentials = Credentials::new(
            settings.email.clone(),
            settings.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from: Mailbox::new(Some(SENDER_NAME.to_string()), address),
        })
    }

    /// Check that the SMTP server accepts our connection and credentials.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` or `EmailError::ConnectionRejected` on failure.
    pub async fn verify(&self) -> Result<(), EmailError> {
        if self.mailer.test_connection().await? {
            Ok(())
        } else {
            Err(EmailError::ConnectionRejected)
        }
    }

    /// Send the password recovery email.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_recovery(
        &self,
        to: &str,
        name: &str,
        link: &str,
    ) -> Result<(), EmailError> {
        let html = PasswordRecoveryHtml {
            name,
            link,
            expires_in_hours: RECOVERY_TOKEN_TTL_HOURS,
        }
        .render()?;
        let text = PasswordRecoveryText {
            name,
            link,
            expires_in_hours: RECOVERY_TOKEN_TTL_HOURS,
        }
        .render()?;

        self.send_multipart_email(to, RECOVERY_SUBJECT, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_recovery_templates_include_name_and_link() {
        let link = "http://localhost:5000/password-recovery?token=abc123";
        let html = PasswordRecoveryHtml {
            name: "Ana",
            link,
            expires_in_hours: 1,
        }
        .render()
        .unwrap();
        assert!(html.contains("Hola Ana"));
        assert!(html.contains("token=abc123"));

        let text = PasswordRecoveryText {
            name: "Ana",
            link,
            expires_in_hours: 1,
        }
        .render()
        .unwrap();
        assert!(text.contains(link));
        assert!(text.contains("expira en 1 hora"));
    }

    #[test]
    fn test_html_template_escapes_name() {
        let html = PasswordRecoveryHtml {
            name: "<script>",
            link: "http://localhost",
            expires_in_hours: 1,
        }
        .render()
        .unwrap();
        assert!(!html.contains("<script>"));
    }

    fn settings(email: &str) -> SmtpSettings {
        SmtpSettings {
            email: email.to_string(),
            password: SecretString::from("secret"),
            host: "smtp.gmail.com".to_string(),
            port: 587,
        }
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_sender() {
        assert!(matches!(
            EmailService::new(&settings("not an address")),
            Err(EmailError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_invalid_sender_is_rejected_before_transport_is_built() {
        // No runtime here: building the pooled transport would panic.
        assert!(matches!(
            EmailService::new(&settings("not an address")),
            Err(EmailError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_new_uses_sender_mailbox() {
        let service = EmailService::new(&settings("tienda@edujuegos.com")).unwrap();
        assert_eq!(service.from.email.to_string(), "tienda@edujuegos.com");
        assert_eq!(service.from.name.as_deref(), Some(SENDER_NAME));
    }
}
