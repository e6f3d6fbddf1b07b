#![forbid(unsafe_code)]

//! Card drag lifecycle.
//!
//! ```text
//! Idle --start--> Dragging { card } --end--> Idle
//!                    |  ^
//!                    +--+ over / drop
//! ```
//!
//! Whether an event is allowed (edit gate, partitions, geometry) is decided
//! by the interaction controller; every event answers with a
//! [`DragDispatch`].

use dashgrid_core::CardId;

/// Drag lifecycle state. At most one card is dragged at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { card: CardId },
}

impl DragState {
    /// Card being dragged, if any.
    #[must_use]
    pub fn card(&self) -> Option<&CardId> {
        match self {
            Self::Idle => None,
            Self::Dragging { card } => Some(card),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Return to `Idle`, yielding the card that was being dragged.
    pub fn take(&mut self) -> Option<CardId> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Dragging { card } => Some(card),
        }
    }
}

/// Why a drag event was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragIgnoredReason {
    /// Stored layout has not been applied yet.
    NotReady,
    /// Drags only start while the edit gate is active.
    EditModeInactive,
    /// The event target is not a card of this page.
    UnknownCard,
    DragAlreadyActive,
    NoActiveDrag,
    /// The pointer is over the dragged card itself.
    SameCard,
    /// The target is on the other side of the divider.
    CrossPartition,
    /// The dragged card already sits in the requested slot.
    PositionUnchanged,
    /// The host could not measure the target.
    MissingBounds,
}

/// Result of one drag event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragDispatch {
    /// Whether the layout should be saved.
    pub persist: bool,
    pub ignored: Option<DragIgnoredReason>,
}

impl DragDispatch {
    pub(crate) const APPLIED: Self = Self {
        persist: false,
        ignored: None,
    };

    pub(crate) const PERSIST: Self = Self {
        persist: true,
        ignored: None,
    };

    #[must_use]
    pub const fn ignored(reason: DragIgnoredReason) -> Self {
        Self {
            persist: false,
            ignored: Some(reason),
        }
    }

    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        self.ignored.is_some()
    }
}
