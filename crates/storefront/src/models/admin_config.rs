//! Runtime-editable store configuration.
//!
//! A single `admin_config` row holds business details, the SMTP account used
//! for password recovery mail and the Mercado Pago credentials. Secrets are
//! masked whenever the row is sent back to the browser; a masked value posted
//! back unchanged keeps the stored secret.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use edujuegos_core::{AdminConfigId, Email};

use super::non_blank;

/// Prefix of every masked secret.
pub const SECRET_MASK: &str = "********";

/// Default SMTP relay when none is configured.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// The stored configuration row.
#[derive(Clone, sqlx::FromRow)]
pub struct AdminConfig {
    pub id: AdminConfigId,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub logo_url: Option<String>,
    pub smtp_email: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub mp_access_token: Option<String>,
    pub mp_public_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("id", &self.id)
            .field("business_name", &self.business_name)
            .field("smtp_email", &self.smtp_email)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field(
                "mp_access_token",
                &self.mp_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("mp_public_key", &self.mp_public_key)
            .finish_non_exhaustive()
    }
}

/// SMTP account used to send transactional mail.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Login and sender address.
    pub email: String,
    pub password: SecretString,
    pub host: String,
    pub port: u16,
}

impl AdminConfig {
    /// SMTP settings, if both the account and its password are configured.
    #[must_use]
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        let email = self.smtp_email.clone().filter(|v| !v.is_empty())?;
        let password = self.smtp_password.clone().filter(|v| !v.is_empty())?;
        let host = self
            .smtp_host
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let port = self
            .smtp_port
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(DEFAULT_SMTP_PORT);

        Some(SmtpSettings {
            email,
            password: SecretString::from(password),
            host,
            port,
        })
    }

    /// Mercado Pago access token, if configured.
    #[must_use]
    pub fn mercadopago_access_token(&self) -> Option<SecretString> {
        self.mp_access_token
            .clone()
            .filter(|v| !v.is_empty())
            .map(SecretString::from)
    }

    /// Whether both Mercado Pago keys are present.
    #[must_use]
    pub fn mercadopago_configured(&self) -> bool {
        self.mercadopago_access_token().is_some()
            && self.mp_public_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// The configuration as shown to admins, with secrets masked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfigView {
    pub id: AdminConfigId,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub logo_url: Option<String>,
    pub smtp_email: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub mp_access_token: Option<String>,
    pub mp_public_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AdminConfig> for AdminConfigView {
    fn from(config: &AdminConfig) -> Self {
        Self {
            id: config.id,
            business_name: config.business_name.clone(),
            business_address: config.business_address.clone(),
            business_phone: config.business_phone.clone(),
            business_email: config.business_email.clone(),
            logo_url: config.logo_url.clone(),
            smtp_email: config.smtp_email.clone(),
            smtp_password: config.smtp_password.as_deref().map(mask_secret),
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            mp_access_token: config.mp_access_token.as_deref().map(mask_secret),
            mp_public_key: config.mp_public_key.clone(),
            created_at: config.created_at,
            updated_at: config.updated_at,
        }
    }
}

/// Mask a secret, keeping the last four characters of long values.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return SECRET_MASK.to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{SECRET_MASK}{tail}")
}

/// An SMTP port sent either as a number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortInput {
    Number(i64),
    Text(String),
}

/// Payload for `POST /api/admin/config`.
///
/// Empty strings clear a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfigInput {
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub logo_url: Option<String>,
    pub smtp_email: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<PortInput>,
    pub mp_access_token: Option<String>,
    pub mp_public_key: Option<String>,
}

/// Normalized values ready to be stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminConfigValues {
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub logo_url: Option<String>,
    pub smtp_email: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub mp_access_token: Option<String>,
    pub mp_public_key: Option<String>,
}

impl AdminConfigInput {
    /// Blank strings become `None`, masked secrets resolve to the stored value,
    /// and email and port fields are validated.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for an invalid email or port.
    pub fn normalize(self, existing: Option<&AdminConfig>) -> Result<AdminConfigValues, String> {
        let business_email = validate_email("businessEmail", non_blank(self.business_email))?;
        let smtp_email = validate_email("smtpEmail", non_blank(self.smtp_email))?;
        let smtp_port = match self.smtp_port {
            None => None,
            Some(PortInput::Number(n)) => Some(validate_port(n)?),
            Some(PortInput::Text(s)) => match s.trim() {
                "" => None,
                t => Some(validate_port(
                    t.parse::<i64>()
                        .map_err(|_| "Puerto SMTP inválido".to_string())?,
                )?),
            },
        };

        Ok(AdminConfigValues {
            business_name: non_blank(self.business_name),
            business_address: non_blank(self.business_address),
            business_phone: non_blank(self.business_phone),
            business_email,
            logo_url: non_blank(self.logo_url),
            smtp_email,
            smtp_password: keep_masked(
                non_blank(self.smtp_password),
                existing.and_then(|c| c.smtp_password.clone()),
            ),
            smtp_host: non_blank(self.smtp_host),
            smtp_port,
            mp_access_token: keep_masked(
                non_blank(self.mp_access_token),
                existing.and_then(|c| c.mp_access_token.clone()),
            ),
            mp_public_key: non_blank(self.mp_public_key),
        })
    }
}

fn validate_email(field: &str, value: Option<String>) -> Result<Option<String>, String> {
    value
        .map(|v| {
            Email::parse(&v)
                .map(Email::into_inner)
                .map_err(|_| format!("El campo {field} debe ser un email válido"))
        })
        .transpose()
}

fn validate_port(port: i64) -> Result<i32, String> {
    if (1..=i64::from(u16::MAX)).contains(&port) {
        i32::try_from(port).map_err(|_| "Puerto SMTP inválido".to_string())
    } else {
        Err("Puerto SMTP inválido".to_string())
    }
}

/// A value that still carries the mask was not edited.
fn keep_masked(submitted: Option<String>, stored: Option<String>) -> Option<String> {
    match submitted {
        Some(value) if value.starts_with(SECRET_MASK) => stored,
        other => other,
    }
}
