//! One-time passwords for account activation and password reset.
//!
//! Activation codes are time-based: HMAC-SHA256 over the 5-minute window counter,
//! dynamically truncated to 6 digits. Reset codes are random 6-digit strings stored on
//! the [`PasswordReset`] record together with their attempt and send counters.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngExt;
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::types::{ActivationOtp, PasswordReset};

type HmacSha256 = Hmac<Sha256>;

const SECRET_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const SECRET_LEN: usize = 32;
const CODE_DIGITS: u32 = 6;

/// Limits and windows of both OTP flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpSettings {
    pub activation_step_secs: i64,
    pub activation_max_attempts: i32,
    pub activation_resend_cooldown_secs: i64,
    pub reset_ttl_secs: i64,
    pub reset_max_otp_attempts: i32,
    pub reset_max_emails_per_day: i32,
    pub reset_email_gap_secs: i64,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            activation_step_secs: 300,
            activation_max_attempts: 5,
            activation_resend_cooldown_secs: 60,
            reset_ttl_secs: 15 * 60,
            reset_max_otp_attempts: 3,
            reset_max_emails_per_day: 3,
            reset_email_gap_secs: 60,
        }
    }
}

// ── Activation (time-based) ──────────────────────────────────────────────────

fn random_secret() -> String {
    let mut rng = rand::rng();
    (0..SECRET_LEN)
        .map(|_| SECRET_CHARSET[rng.random_range(0..SECRET_CHARSET.len())] as char)
        .collect()
}

/// RFC 4226 dynamic truncation of HMAC-SHA256(secret, counter).
fn hotp(secret: &str, counter: u64) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(hash[offset] & 0x7f) << 24)
        | (u32::from(hash[offset + 1]) << 16)
        | (u32::from(hash[offset + 2]) << 8)
        | u32::from(hash[offset + 3]);
    let code = binary % 10u32.pow(CODE_DIGITS);
    Ok(format!("{code:0width$}", width = CODE_DIGITS as usize))
}

fn window(now: DateTime<Utc>, step_secs: i64) -> u64 {
    u64::try_from(now.timestamp().div_euclid(step_secs)).unwrap_or(0)
}

impl ActivationOtp {
    pub fn generate(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            secret: random_secret(),
            attempts: 0,
            is_verified: false,
            created_at: now,
        }
    }

    /// Code for the window containing `now`.
    pub fn code_at(
        &self,
        now: DateTime<Utc>,
        settings: &OtpSettings,
    ) -> Result<String, hmac::digest::InvalidLength> {
        hotp(&self.secret, window(now, settings.activation_step_secs))
    }

    pub fn can_attempt(&self, settings: &OtpSettings) -> bool {
        !self.is_verified && self.attempts < settings.activation_max_attempts
    }

    /// Accepts the code of the current or the previous window. A code is therefore
    /// accepted for at least one step and at most two steps after its window opens
    /// (5 to 10 minutes with the default 300 s step).
    pub fn matches(
        &self,
        code: &str,
        now: DateTime<Utc>,
        settings: &OtpSettings,
    ) -> Result<bool, hmac::digest::InvalidLength> {
        let current = window(now, settings.activation_step_secs);
        let code = code.trim();
        for counter in [current, current.saturating_sub(1)] {
            if hotp(&self.secret, counter)? == code {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn resend_allowed_at(&self, settings: &OtpSettings) -> DateTime<Utc> {
        self.created_at + Duration::seconds(settings.activation_resend_cooldown_secs)
    }
}

// ── Password reset ───────────────────────────────────────────────────────────

/// Why another reset email cannot be sent right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendBlocked {
    DailyLimit,
    TooSoon,
}

fn random_reset_code() -> String {
    let mut rng = rand::rng();
    rng.random_range(100_000..=999_999u32).to_string()
}

impl PasswordReset {
    /// New record with a fresh code; counts as the first email send.
    pub fn issue(user_id: Uuid, now: DateTime<Utc>, settings: &OtpSettings) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            otp: random_reset_code(),
            token: None,
            otp_attempts: 0,
            email_attempts: 1,
            last_attempt_at: None,
            last_email_at: Some(now),
            expires_at: now + Duration::seconds(settings.reset_ttl_secs),
            is_verified: false,
            is_used: false,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// False once the record is used or its attempts are spent. Never becomes true again.
    pub fn can_attempt_otp(&self, settings: &OtpSettings) -> bool {
        !self.is_used && self.otp_attempts < settings.reset_max_otp_attempts
    }

    pub fn check_resend(
        &self,
        now: DateTime<Utc>,
        settings: &OtpSettings,
    ) -> Result<(), ResendBlocked> {
        if self.email_attempts >= settings.reset_max_emails_per_day {
            return Err(ResendBlocked::DailyLimit);
        }
        if let Some(last) = self.last_email_at {
            if now < last + Duration::seconds(settings.reset_email_gap_secs) {
                return Err(ResendBlocked::TooSoon);
            }
        }
        Ok(())
    }

    /// Replace the code and restart the expiry clock. Attempt counters carry over.
    pub fn reissue(&mut self, now: DateTime<Utc>, settings: &OtpSettings) {
        self.otp = random_reset_code();
        self.token = None;
        self.is_verified = false;
        self.email_attempts += 1;
        self.last_email_at = Some(now);
        self.expires_at = now + Duration::seconds(settings.reset_ttl_secs);
    }

    /// Compares against the stored code. The attempt must already be claimed through
    /// the repository so the cap holds across concurrent requests.
    pub fn otp_matches(&self, code: &str, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired(now) && self.otp == code.trim()
    }

    /// Whether the record may still be redeemed with its signed token.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.is_verified && !self.is_used && !self.is_expired(now)
    }
}
