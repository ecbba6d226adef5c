//! Request DTOs with validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use murmur_core::types::ChatId;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    /// Display name.
    #[validate(length(min = 1, max = 50, message = "Display name must be 1-50 characters"))]
    pub display_name: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// OTP issuance request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    /// Email or phone number.
    #[validate(length(min = 1, max = 254, message = "Identifier is required"))]
    pub identifier: String,
}

/// OTP verification request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    /// Email or phone number the code was sent to.
    #[validate(length(min = 1, max = 254, message = "Identifier is required"))]
    pub identifier: String,
    /// The six-digit code.
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

/// Partial update of notification settings. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateNotificationSettingsRequest {
    /// Direct message notifications.
    pub message_enabled: Option<bool>,
    /// Mention notifications.
    pub mention_enabled: Option<bool>,
    /// File notifications.
    pub file_enabled: Option<bool>,
    /// Group invitation notifications.
    pub group_invite_enabled: Option<bool>,
    /// Do-not-disturb switch.
    pub dnd_enabled: Option<bool>,
    /// DND start, `HH:MM`.
    pub dnd_start: Option<String>,
    /// DND end, `HH:MM`.
    pub dnd_end: Option<String>,
    /// Offset of the user's local time from UTC.
    #[validate(range(min = -720, max = 840, message = "Offset must be within -12:00..+14:00"))]
    pub dnd_utc_offset_minutes: Option<i32>,
    /// Replacement mute list.
    pub muted_chat_ids: Option<BTreeSet<ChatId>>,
    /// Notification sound.
    pub sound_enabled: Option<bool>,
}
