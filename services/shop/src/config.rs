use serde::Deserialize;

use bazaar_auth_types::cookie::CookieSettings;
use bazaar_core::config::Config;

use crate::usecase::token::TokenSettings;

/// Shop service configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct ShopConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for access, refresh and password-reset tokens.
    pub jwt_secret: String,
    /// TCP port to listen on. Env var: `SHOP_PORT`.
    #[serde(default = "default_port")]
    pub shop_port: u16,
    /// `Secure` attribute on the refresh cookie. Disable only for local http.
    #[serde(default = "default_true")]
    pub cookie_secure: bool,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: i64,
    /// Emails are only logged when unset.
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
    /// Root directory of uploaded payment screenshots.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

impl Config for ShopConfig {}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_access_ttl() -> i64 {
    15 * 60
}

fn default_refresh_ttl() -> i64 {
    10 * 24 * 60 * 60
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "Bazaar <no-reply@bazaar.local>".to_owned()
}

fn default_upload_dir() -> String {
    "media".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ShopConfig {
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt_secret.clone(),
            access_ttl_secs: self.access_token_ttl_secs,
            refresh_ttl_secs: self.refresh_token_ttl_secs,
        }
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.cookie_secure,
            max_age_secs: self.refresh_token_ttl_secs,
        }
    }

    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.smtp_host.as_deref().map(str::trim).filter(|h| !h.is_empty())?;
        Some(SmtpSettings {
            host: host.to_owned(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
        })
    }
}
