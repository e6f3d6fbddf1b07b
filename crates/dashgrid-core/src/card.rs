#![forbid(unsafe_code)]

//! Card identity and handles.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Stable identifier for a dashboard card.
///
/// Either the host's native identifier or a token derived by
/// [`IdentityResolver`](crate::IdentityResolver). Serialized as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for CardId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl Borrow<str> for CardId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One rearrangeable region on the page.
///
/// The node belongs to the page. The engine only moves it between positions
/// inside the grid container; it is never cloned or recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub node: NodeId,
    /// Inserted by a collaborator rather than rendered by the host app.
    pub synthetic: bool,
}

impl Card {
    #[must_use]
    pub fn new(id: CardId, node: NodeId, synthetic: bool) -> Self {
        Self {
            id,
            node,
            synthetic,
        }
    }
}
