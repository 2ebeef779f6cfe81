//! Lock identity types: who holds a lock, which class of operation it guards,
//! and the key it occupies in the coordination store.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the lock name and the user id in a [`LockKey`].
const KEY_INFIX: &str = ":lock:";

/// Errors raised when constructing identity types from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A user identity must never be empty.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// Lock names are short lowercase tags.
    #[error("invalid lock name '{0}': use lowercase letters, digits, '-' or '_'")]
    InvalidLockName(String),
}

/// Opaque, non-empty user identifier taken from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Wrap a subject claim. Empty or whitespace-only values are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdentityError::EmptyUserId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Symbolic tag for a class of guarded operation (`tts`, `stt`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LockName(String);

impl LockName {
    /// Lock guarding a speech-synthesis session.
    pub const TTS: &'static str = "tts";
    /// Lock guarding a speech-recognition session.
    pub const STT: &'static str = "stt";

    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if valid {
            Ok(Self(value))
        } else {
            Err(IdentityError::InvalidLockName(value))
        }
    }

    pub fn tts() -> Self {
        Self(Self::TTS.to_string())
    }

    pub fn stt() -> Self {
        Self(Self::STT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-facing label used in rejection messages (`TTS`, `STT`).
    pub fn display_label(&self) -> String {
        self.0.to_uppercase()
    }
}

impl TryFrom<String> for LockName {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LockName> for String {
    fn from(name: LockName) -> Self {
        name.0
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Concrete key a lock occupies in the store: `<lock-name>:lock:<user-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    pub fn new(lock_name: &LockName, user_id: &UserId) -> Self {
        Self(format!("{}{KEY_INFIX}{}", lock_name.as_str(), user_id.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
