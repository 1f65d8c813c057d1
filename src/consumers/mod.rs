//! Boundary Consumers
//!
//! Small stores the application builds on top of the [`Cache`](crate::facade::Cache)
//! handle: login tokens and one-time passcodes.

mod login_token;
mod otp;

pub use login_token::{AuthError, LoginTokenPayload, LoginTokens, TokenStatus, LOGIN_TOKEN_PREFIX};
pub use otp::{Otp, OtpCodes, OtpPurpose};
