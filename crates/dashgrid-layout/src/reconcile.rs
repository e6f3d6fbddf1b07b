#![forbid(unsafe_code)]

//! Stored layout ⨝ discovered cards.
//!
//! # Algorithm
//!
//! 1. Keep the stored order, restricted to ids discovered on this page.
//!    Stale and repeated ids are dropped.
//! 2. Ids discovered but absent from the stored order are prepended as one
//!    block, in discovery order, so new cards surface at the top.
//! 3. The hidden set is the stored hidden set restricted to live ids.
//! 4. Visible and hidden orders are the merged order filtered by membership.
//! 5. Every live id gets a width: a valid stored span, else the policy
//!    default.
//!
//! # Invariants
//!
//! 1. `visible_order ∪ hidden_order` contains every live id exactly once.
//! 2. Reconciling again with the previous result saved as input returns the
//!    same layout.
//! 3. A card absent from the stored order is never hidden.
//!
//! # Failure Modes
//!
//! None. Reconciliation is infallible, including with no stored state.

use std::collections::BTreeMap;

use dashgrid_core::{Card, CardId};
use rustc_hash::FxHashSet;

use crate::state::LayoutState;
use crate::width::WidthClass;

/// Id of the statistics-summary card contributed by the grade-reveal feature.
pub const STATS_SUMMARY_CARD_ID: &str = "stats-summary";

/// Default widths for cards without a stored span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthPolicy {
    /// Cards that default to a full row.
    pub full_width_ids: Vec<CardId>,
    /// Width for every other card.
    pub fallback: WidthClass,
}

impl Default for WidthPolicy {
    fn default() -> Self {
        Self {
            full_width_ids: vec![CardId::from(STATS_SUMMARY_CARD_ID)],
            fallback: WidthClass::Half,
        }
    }
}

impl WidthPolicy {
    /// Width a card gets when nothing is stored for it.
    #[must_use]
    pub fn default_for(&self, id: &CardId) -> WidthClass {
        if self.full_width_ids.contains(id) {
            WidthClass::Full
        } else {
            self.fallback
        }
    }
}

/// Derived placement for the current page. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EffectiveLayout {
    pub visible_order: Vec<CardId>,
    pub hidden_order: Vec<CardId>,
    /// Resolved width for every live card.
    pub spans: BTreeMap<CardId, WidthClass>,
    /// Ids that were not in the stored order and were surfaced at the top.
    pub surfaced: Vec<CardId>,
}

impl EffectiveLayout {
    /// Width resolved for `id`.
    #[must_use]
    pub fn span(&self, id: &str) -> Option<WidthClass> {
        self.spans.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.visible_order.len() + self.hidden_order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The record that would be persisted for this layout.
    #[must_use]
    pub fn to_state(&self) -> LayoutState {
        LayoutState {
            order: self
                .visible_order
                .iter()
                .chain(&self.hidden_order)
                .cloned()
                .collect(),
            hidden: self.hidden_order.iter().cloned().collect(),
            spans: self.spans.clone(),
        }
    }
}

/// Merge `stored` with the cards discovered on this page.
#[must_use]
pub fn reconcile(
    cards: &[Card],
    stored: Option<&LayoutState>,
    policy: &WidthPolicy,
) -> EffectiveLayout {
    let _span = tracing::debug_span!(
        "layout.reconcile",
        cards = cards.len(),
        has_stored = stored.is_some(),
    )
    .entered();

    let live: FxHashSet<&CardId> = cards.iter().map(|card| &card.id).collect();

    let mut seen: FxHashSet<&CardId> = FxHashSet::default();
    let stored_order: Vec<&CardId> = stored
        .map(|s| s.order.as_slice())
        .unwrap_or_default()
        .iter()
        .filter(|id| live.contains(id) && seen.insert(*id))
        .collect();

    let surfaced: Vec<CardId> = cards
        .iter()
        .map(|card| &card.id)
        .filter(|id| !seen.contains(id))
        .cloned()
        .collect();

    let hidden: FxHashSet<&CardId> = stored
        .map(|s| s.hidden.iter().filter(|id| live.contains(id)).collect())
        .unwrap_or_default();

    let mut visible_order = surfaced.clone();
    let mut hidden_order = Vec::new();
    for id in stored_order {
        if hidden.contains(id) {
            hidden_order.push(id.clone());
        } else {
            visible_order.push(id.clone());
        }
    }

    let spans = cards
        .iter()
        .map(|card| {
            let width = stored
                .and_then(|s| s.spans.get(&card.id).copied())
                .unwrap_or_else(|| policy.default_for(&card.id));
            (card.id.clone(), width)
        })
        .collect();

    tracing::debug!(
        target: "dashgrid.layout",
        visible = visible_order.len(),
        hidden = hidden_order.len(),
        surfaced = surfaced.len(),
        "layout reconciled"
    );

    EffectiveLayout {
        visible_order,
        hidden_order,
        spans,
        surfaced,
    }
}

#[cfg(test)]
mod tests {
    use super::{EffectiveLayout, STATS_SUMMARY_CARD_ID, WidthPolicy, reconcile};
    use crate::state::LayoutState;
    use crate::width::WidthClass;
    use dashgrid_core::{Card, CardId, NodeId};

    fn cards(ids: &[&str]) -> Vec<Card> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Card::new(CardId::from(*id), NodeId::new(i as u32 + 1), false))
            .collect()
    }

    fn ids(list: &[CardId]) -> Vec<&str> {
        list.iter().map(CardId::as_str).collect()
    }

    fn stored(order: &[&str], hidden: &[&str]) -> LayoutState {
        LayoutState {
            order: order.iter().map(|s| CardId::from(*s)).collect(),
            hidden: hidden.iter().map(|s| CardId::from(*s)).collect(),
            ..LayoutState::default()
        }
    }

    #[test]
    fn no_stored_state_uses_discovery_order() {
        let layout = reconcile(&cards(&["a", "b", "c"]), None, &WidthPolicy::default());
        assert_eq!(ids(&layout.visible_order), vec!["a", "b", "c"]);
        assert!(layout.hidden_order.is_empty());
        assert_eq!(layout.surfaced.len(), 3);
    }

    #[test]
    fn stale_ids_dropped_and_new_ids_prepended() {
        let live = cards(&["a", "b", "c", "d", "e"]);
        let state = stored(&["c", "gone", "a", "e"], &[]);
        let layout = reconcile(&live, Some(&state), &WidthPolicy::default());
        assert_eq!(ids(&layout.visible_order), vec!["b", "d", "c", "a", "e"]);
        assert_eq!(ids(&layout.surfaced), vec!["b", "d"]);
        assert_eq!(layout.len(), 5);
    }

    #[test]
    fn hidden_partition_keeps_stored_order() {
        let live = cards(&["a", "b", "c", "d"]);
        let state = stored(&["d", "c", "b", "a"], &["a", "c", "stale"]);
        let layout = reconcile(&live, Some(&state), &WidthPolicy::default());
        assert_eq!(ids(&layout.visible_order), vec!["d", "b"]);
        assert_eq!(ids(&layout.hidden_order), vec!["c", "a"]);
    }

    #[test]
    fn hidden_id_missing_from_order_is_surfaced_visible() {
        let live = cards(&["a", "b"]);
        let state = stored(&["a"], &["b"]);
        let layout = reconcile(&live, Some(&state), &WidthPolicy::default());
        assert_eq!(ids(&layout.visible_order), vec!["b", "a"]);
        assert!(layout.hidden_order.is_empty());
    }

    #[test]
    fn duplicate_stored_ids_collapse() {
        let live = cards(&["a", "b"]);
        let state = stored(&["b", "a", "b"], &[]);
        let layout = reconcile(&live, Some(&state), &WidthPolicy::default());
        assert_eq!(ids(&layout.visible_order), vec!["b", "a"]);
    }

    #[test]
    fn width_defaults_and_stored_spans() {
        let live = cards(&[STATS_SUMMARY_CARD_ID, "a", "b"]);
        let mut state = stored(&[], &[]);
        state.spans.insert(CardId::from("b"), WidthClass::Third);
        state.spans.insert(CardId::from("stale"), WidthClass::Full);
        let layout = reconcile(&live, Some(&state), &WidthPolicy::default());
        assert_eq!(layout.span(STATS_SUMMARY_CARD_ID), Some(WidthClass::Full));
        assert_eq!(layout.span("a"), Some(WidthClass::Half));
        assert_eq!(layout.span("b"), Some(WidthClass::Third));
        assert_eq!(layout.span("stale"), None);
    }

    #[test]
    fn saved_result_reconciles_to_itself() {
        let live = cards(&["a", "b", "c", "d"]);
        let state = stored(&["c", "a"], &["a"]);
        let first = reconcile(&live, Some(&state), &WidthPolicy::default());
        let second = reconcile(&live, Some(&first.to_state()), &WidthPolicy::default());
        assert_eq!(first.visible_order, second.visible_order);
        assert_eq!(first.hidden_order, second.hidden_order);
        assert_eq!(first.spans, second.spans);
        assert!(second.surfaced.is_empty());
    }

    #[test]
    fn empty_page_is_empty_layout() {
        let layout = reconcile(&[], Some(&stored(&["a"], &["a"])), &WidthPolicy::default());
        assert_eq!(layout, EffectiveLayout::default());
        assert!(layout.is_empty());
    }
}
