#![forbid(unsafe_code)]

//! Control-message codec.
//!
//! The host's extension surface talks to a page through small JSON messages
//! tagged by `type`:
//!
//! ```json
//! { "type": "TOGGLE_DASHBOARD_EDIT" }       -> { "active": true }
//! { "type": "GET_DASHBOARD_EDIT_STATE" }    -> { "hasDashboard": true, "active": false }
//! ```
//!
//! Extra fields on a request are ignored. An unknown `type` is a
//! [`ControlMessageError::UnknownType`], distinct from malformed JSON, so the
//! bridge can log which sender is out of date.

use dashgrid_runtime::EditState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding a control message.
#[derive(Debug, Error)]
pub enum ControlMessageError {
    #[error("malformed control message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown control message type: {0}")]
    UnknownType(String),
}

/// Request from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Flip the edit gate.
    ToggleDashboardEdit,
    /// Report the edit gate without changing it.
    GetDashboardEditState,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
}

impl ControlMessage {
    /// Wire name of this message type.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::ToggleDashboardEdit => "TOGGLE_DASHBOARD_EDIT",
            Self::GetDashboardEditState => "GET_DASHBOARD_EDIT_STATE",
        }
    }

    /// Decode a JSON request.
    pub fn decode(json: &str) -> Result<Self, ControlMessageError> {
        let raw: RawMessage = serde_json::from_str(json)?;
        [Self::ToggleDashboardEdit, Self::GetDashboardEditState]
            .into_iter()
            .find(|message| message.type_name() == raw.kind)
            .ok_or(ControlMessageError::UnknownType(raw.kind))
    }

    /// Encode as JSON.
    pub fn encode(self) -> Result<String, ControlMessageError> {
        Ok(serde_json::to_string(&self)?)
    }
}

/// Reply to [`ControlMessage::ToggleDashboardEdit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleReply {
    pub active: bool,
}

/// Reply to [`ControlMessage::GetDashboardEditState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditStateReply {
    pub has_dashboard: bool,
    pub active: bool,
}

impl From<EditState> for EditStateReply {
    fn from(state: EditState) -> Self {
        Self {
            has_dashboard: state.has_dashboard,
            active: state.active,
        }
    }
}

/// Any reply the bridge sends back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlReply {
    Toggle(ToggleReply),
    EditState(EditStateReply),
}

impl ControlReply {
    /// Encode as JSON.
    pub fn encode(self) -> Result<String, ControlMessageError> {
        Ok(serde_json::to_string(&self)?)
    }
}
