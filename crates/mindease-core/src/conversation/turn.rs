//! Conversation turn types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MindEaseError, Result};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Typed or spoken input from the person using the app.
    User,
    /// Reply generated by the completion backend (or a synthetic greeting/fallback).
    Assistant,
}

impl TurnRole {
    /// Label used when a transcript is rendered into prompt text.
    pub fn label(self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
        }
    }
}

/// A single message in a conversation.
///
/// Turns are immutable once created; the text is guaranteed non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    role: TurnRole,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn stamped with the current time.
    ///
    /// Returns `MindEaseError::InvalidInput` if `text` is empty or whitespace only.
    pub fn new(role: TurnRole, text: impl Into<String>) -> Result<Self> {
        Self::at(role, text, Utc::now())
    }

    /// Creates a turn with an explicit creation time.
    pub fn at(role: TurnRole, text: impl Into<String>, created_at: DateTime<Utc>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(MindEaseError::invalid_input(format!(
                "{} turn text must not be empty",
                role.label()
            )));
        }
        Ok(Self {
            role,
            text,
            created_at,
        })
    }

    pub fn user(text: impl Into<String>) -> Result<Self> {
        Self::new(TurnRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Result<Self> {
        Self::new(TurnRole::Assistant, text)
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}
