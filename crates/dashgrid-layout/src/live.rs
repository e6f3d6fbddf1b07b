#![forbid(unsafe_code)]

//! In-memory card ordering for an editing session.
//!
//! [`LiveLayout`] is the single source of truth once a page is rendered.
//! Interactions mutate it first; the renderer then projects the change onto
//! the page, and persistence snapshots are taken from it rather than read
//! back from the page.
//!
//! # Invariants
//!
//! 1. Every id appears exactly once across the two partitions.
//! 2. Moves never change partition membership; only [`LiveLayout::set_hidden`]
//!    does.
//! 3. Operations on unknown ids are no-ops.

use std::collections::BTreeMap;

use dashgrid_core::CardId;

use crate::reconcile::EffectiveLayout;
use crate::state::LayoutState;
use crate::width::WidthClass;

/// Which side of the divider a card is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Visible,
    Hidden,
}

/// Where to put a dragged card relative to the card under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// Result of a relative move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The card changed position.
    Moved,
    /// The card was already in the requested slot.
    Unchanged,
    /// The target is on the other side of the divider.
    CrossPartition,
    /// Either id is not part of the layout, or both are the same card.
    Invalid,
}

/// Mutable card ordering, split into visible and hidden partitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveLayout {
    visible: Vec<CardId>,
    hidden: Vec<CardId>,
    spans: BTreeMap<CardId, WidthClass>,
}

impl From<EffectiveLayout> for LiveLayout {
    fn from(layout: EffectiveLayout) -> Self {
        Self {
            visible: layout.visible_order,
            hidden: layout.hidden_order,
            spans: layout.spans,
        }
    }
}

impl LiveLayout {
    #[must_use]
    pub fn visible(&self) -> &[CardId] {
        &self.visible
    }

    #[must_use]
    pub fn hidden(&self) -> &[CardId] {
        &self.hidden
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.visible.len() + self.hidden.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn partition_of(&self, id: &str) -> Option<Partition> {
        self.locate(id).map(|(partition, _)| partition)
    }

    #[must_use]
    pub fn span(&self, id: &str) -> Option<WidthClass> {
        self.spans.get(id).copied()
    }

    /// Full order as persisted: visible cards, then hidden cards.
    #[must_use]
    pub fn current_order(&self) -> Vec<CardId> {
        self.visible.iter().chain(&self.hidden).cloned().collect()
    }

    /// Full record for persistence.
    #[must_use]
    pub fn snapshot(&self) -> LayoutState {
        LayoutState {
            order: self.current_order(),
            hidden: self.hidden.iter().cloned().collect(),
            spans: self.spans.clone(),
        }
    }

    /// View as an [`EffectiveLayout`] for re-rendering.
    #[must_use]
    pub fn to_effective(&self) -> EffectiveLayout {
        EffectiveLayout {
            visible_order: self.visible.clone(),
            hidden_order: self.hidden.clone(),
            spans: self.spans.clone(),
            surfaced: Vec::new(),
        }
    }

    /// Move a card across the divider.
    ///
    /// Hiding puts the card at the start of the hidden segment; showing puts
    /// it at the end of the visible segment, so in both cases the card lands
    /// next to the divider. Returns whether anything changed.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> bool {
        let Some((partition, idx)) = self.locate(id) else {
            return false;
        };
        match (partition, hidden) {
            (Partition::Visible, true) => {
                let card = self.visible.remove(idx);
                self.hidden.insert(0, card);
                true
            }
            (Partition::Hidden, false) => {
                let card = self.hidden.remove(idx);
                self.visible.push(card);
                true
            }
            _ => false,
        }
    }

    /// Flip hidden membership. Returns the new hidden flag.
    pub fn toggle_hidden(&mut self, id: &str) -> Option<bool> {
        let now_hidden = self.partition_of(id)? == Partition::Visible;
        self.set_hidden(id, now_hidden);
        Some(now_hidden)
    }

    /// Set a card's width. Returns whether it changed.
    pub fn set_span(&mut self, id: &str, width: WidthClass) -> bool {
        let Some(current) = self.spans.get_mut(id) else {
            return false;
        };
        if *current == width {
            return false;
        }
        *current = width;
        true
    }

    /// Reposition `dragged` next to `target` within their shared partition.
    pub fn move_relative(&mut self, dragged: &str, target: &str, placement: Placement) -> MoveOutcome {
        if dragged == target {
            return MoveOutcome::Invalid;
        }
        let (Some((from, from_idx)), Some((to, _))) = (self.locate(dragged), self.locate(target))
        else {
            return MoveOutcome::Invalid;
        };
        if from != to {
            return MoveOutcome::CrossPartition;
        }

        let list = match from {
            Partition::Visible => &mut self.visible,
            Partition::Hidden => &mut self.hidden,
        };
        let before = list.clone();
        let card = list.remove(from_idx);
        let Some(target_idx) = list.iter().position(|id| id.as_str() == target) else {
            list.insert(from_idx, card);
            return MoveOutcome::Invalid;
        };
        let slot = match placement {
            Placement::Before => target_idx,
            Placement::After => target_idx + 1,
        };
        list.insert(slot, card);

        if *list == before {
            MoveOutcome::Unchanged
        } else {
            MoveOutcome::Moved
        }
    }

    /// Card that follows `id` within its partition.
    #[must_use]
    pub fn next_in_partition(&self, id: &str) -> Option<&CardId> {
        let (partition, idx) = self.locate(id)?;
        match partition {
            Partition::Visible => self.visible.get(idx + 1),
            Partition::Hidden => self.hidden.get(idx + 1),
        }
    }

    fn locate(&self, id: &str) -> Option<(Partition, usize)> {
        if let Some(idx) = self.visible.iter().position(|c| c.as_str() == id) {
            return Some((Partition::Visible, idx));
        }
        self.hidden
            .iter()
            .position(|c| c.as_str() == id)
            .map(|idx| (Partition::Hidden, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::{LiveLayout, MoveOutcome, Partition, Placement};
    use crate::reconcile::EffectiveLayout;
    use crate::width::WidthClass;
    use dashgrid_core::CardId;

    fn live(visible: &[&str], hidden: &[&str]) -> LiveLayout {
        let visible_order: Vec<CardId> = visible.iter().map(|s| CardId::from(*s)).collect();
        let hidden_order: Vec<CardId> = hidden.iter().map(|s| CardId::from(*s)).collect();
        let spans = visible_order
            .iter()
            .chain(&hidden_order)
            .map(|id| (id.clone(), WidthClass::Half))
            .collect();
        LiveLayout::from(EffectiveLayout {
            visible_order,
            hidden_order,
            spans,
            surfaced: Vec::new(),
        })
    }

    fn names(ids: &[CardId]) -> Vec<&str> {
        ids.iter().map(CardId::as_str).collect()
    }

    #[test]
    fn hide_lands_at_front_of_hidden_segment() {
        let mut layout = live(&["a", "b", "c"], &["x"]);
        assert_eq!(layout.toggle_hidden("b"), Some(true));
        assert_eq!(names(layout.visible()), vec!["a", "c"]);
        assert_eq!(names(layout.hidden()), vec!["b", "x"]);
    }

    #[test]
    fn show_lands_at_end_of_visible_segment() {
        let mut layout = live(&["a"], &["x", "y"]);
        assert_eq!(layout.toggle_hidden("y"), Some(false));
        assert_eq!(names(layout.visible()), vec!["a", "y"]);
        assert_eq!(names(layout.hidden()), vec!["x"]);
        assert_eq!(layout.toggle_hidden("nope"), None);
    }

    #[test]
    fn set_hidden_is_idempotent() {
        let mut layout = live(&["a"], &["x"]);
        assert!(!layout.set_hidden("x", true));
        assert!(!layout.set_hidden("a", false));
    }

    #[test]
    fn move_before_and_after() {
        let mut layout = live(&["a", "b", "c", "d"], &[]);
        assert_eq!(layout.move_relative("d", "b", Placement::Before), MoveOutcome::Moved);
        assert_eq!(names(layout.visible()), vec!["a", "d", "b", "c"]);
        assert_eq!(layout.move_relative("a", "c", Placement::After), MoveOutcome::Moved);
        assert_eq!(names(layout.visible()), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn repeated_move_is_unchanged() {
        let mut layout = live(&["a", "b", "c"], &[]);
        assert_eq!(layout.move_relative("a", "b", Placement::After), MoveOutcome::Moved);
        assert_eq!(layout.move_relative("a", "b", Placement::After), MoveOutcome::Unchanged);
        assert_eq!(layout.move_relative("a", "c", Placement::Before), MoveOutcome::Unchanged);
    }

    #[test]
    fn cross_partition_move_is_rejected() {
        let mut layout = live(&["a", "b"], &["x"]);
        let before = layout.clone();
        assert_eq!(layout.move_relative("a", "x", Placement::Before), MoveOutcome::CrossPartition);
        assert_eq!(layout, before);
        assert_eq!(layout.partition_of("a"), Some(Partition::Visible));
    }

    #[test]
    fn invalid_moves() {
        let mut layout = live(&["a", "b"], &[]);
        assert_eq!(layout.move_relative("a", "a", Placement::Before), MoveOutcome::Invalid);
        assert_eq!(layout.move_relative("a", "zz", Placement::Before), MoveOutcome::Invalid);
        assert_eq!(names(layout.visible()), vec!["a", "b"]);
    }

    #[test]
    fn snapshot_orders_visible_then_hidden() {
        let mut layout = live(&["a", "b"], &["x"]);
        assert!(layout.set_span("b", WidthClass::Full));
        assert!(!layout.set_span("b", WidthClass::Full));
        assert!(!layout.set_span("ghost", WidthClass::Full));
        let state = layout.snapshot();
        assert_eq!(names(&state.order), vec!["a", "b", "x"]);
        assert!(state.hidden.contains("x"));
        assert_eq!(state.spans.get("b"), Some(&WidthClass::Full));
        assert_eq!(layout.next_in_partition("a").map(CardId::as_str), Some("b"));
        assert_eq!(layout.next_in_partition("b"), None);
    }
}
