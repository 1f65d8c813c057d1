//! One-time passcodes keyed by purpose and target.

use std::fmt;

use tracing::info;
use uuid::Uuid;

use crate::duration::Ttl;
use crate::error::Result;
use crate::facade::Cache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    PhoneLogin,
    EmailLogin,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::PhoneLogin => "PHONE_LOGIN",
            OtpPurpose::EmailLogin => "EMAIL_LOGIN",
        }
    }

    /// How long a code for this purpose stays valid.
    pub fn default_ttl(&self) -> Ttl {
        match self {
            OtpPurpose::PhoneLogin => Ttl::from("5m"),
            OtpPurpose::EmailLogin => Ttl::from("30m"),
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issued code and its lifetime in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub code: String,
    pub expiry_ms: i64,
}

#[derive(Debug, Clone)]
pub struct OtpCodes {
    cache: Cache,
}

impl OtpCodes {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Issues a code with the purpose's default lifetime, replacing any
    /// code already pending for `target`.
    pub async fn generate(&self, purpose: OtpPurpose, target: &str) -> Result<Otp> {
        self.generate_with_ttl(purpose, target, purpose.default_ttl())
            .await
    }

    pub async fn generate_with_ttl(
        &self,
        purpose: OtpPurpose,
        target: &str,
        ttl: Ttl,
    ) -> Result<Otp> {
        let expiry_ms = ttl.to_millis()?;
        let otp = Otp {
            code: six_digit_code(),
            expiry_ms,
        };
        self.cache
            .set(otp_key(purpose, target), otp.code.as_str(), Some(Ttl::Millis(expiry_ms)))
            .await?;

        info!(%purpose, target, expiry_ms, "One-time passcode issued");
        Ok(otp)
    }

    /// True when `code` matches the pending code. The code is not consumed.
    pub async fn verify(&self, purpose: OtpPurpose, target: &str, code: &str) -> bool {
        self.cache
            .get(&otp_key(purpose, target))
            .await
            .is_some_and(|stored| stored.as_str() == Some(code))
    }
}

fn otp_key(purpose: OtpPurpose, target: &str) -> String {
    format!("{purpose}::{target}")
}

fn six_digit_code() -> String {
    (Uuid::new_v4().as_u128() % 900_000 + 100_000).to_string()
}
