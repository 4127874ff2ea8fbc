//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, bearer tokens and password recovery
//! - `email` - SMTP delivery of password recovery mail
//! - `mercadopago` - Checkout preference creation

pub mod auth;
pub mod email;
pub mod mercadopago;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use mercadopago::{MercadoPagoClient, MercadoPagoError, Preference};
