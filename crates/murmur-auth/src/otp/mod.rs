//! One-time passcodes.
//!
//! [`ChallengeStore`] holds at most one challenge per identifier,
//! [`RateLimiter`] meters issuance per identifier and per client address,
//! and [`OtpService`] combines them with outbound delivery.

pub mod challenge;
pub mod error;
pub mod normalize;
pub mod notice;
pub mod rate_limit;
pub mod service;
pub mod store;
pub mod sweep;

pub use challenge::OtpChallenge;
pub use error::{OtpError, RateLimited};
pub use normalize::normalize_identifier;
pub use notice::TracingNoticeSender;
pub use rate_limit::{RateLimitWindow, RateLimiter};
pub use service::{OtpService, SentCode};
pub use store::ChallengeStore;
pub use sweep::run_sweep;
