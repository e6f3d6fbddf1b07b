#![forbid(unsafe_code)]

//! Property tests for reconciliation and live-layout invariants.
//!
//! Validates:
//! - Every live id appears exactly once across visible and hidden orders.
//! - Reconciling against the saved previous result is a fixed point.
//! - Ids missing from the stored order are surfaced at the front, visible.
//! - Drag-style moves never change partition membership or lose cards.

use std::collections::BTreeSet;

use dashgrid_core::{Card, CardId, NodeId};
use dashgrid_layout::{LayoutState, LiveLayout, Placement, WidthClass, WidthPolicy, reconcile};
use proptest::prelude::*;

// ============================================================================
// Strategy helpers
// ============================================================================

fn id_pool() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "stats-summary", "a", "b", "c", "d", "e", "f", "g", "h", "stale-1", "stale-2",
    ])
    .prop_map(str::to_owned)
}

fn live_id() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["stats-summary", "a", "b", "c", "d", "e", "f", "g", "h"])
        .prop_map(str::to_owned)
}

fn live_cards() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::btree_set(live_id(), 0..9)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
        .prop_map(|ids| {
            ids.into_iter()
                .enumerate()
                .map(|(i, id)| Card::new(CardId::from(id), NodeId::new(i as u32 + 1), false))
                .collect()
        })
}

fn width() -> impl Strategy<Value = WidthClass> {
    prop::sample::select(WidthClass::ALL.to_vec())
}

fn stored_state() -> impl Strategy<Value = LayoutState> {
    (
        prop::collection::vec(id_pool(), 0..12),
        prop::collection::btree_set(id_pool(), 0..6),
        prop::collection::btree_map(id_pool(), width(), 0..6),
    )
        .prop_map(|(order, hidden, spans)| LayoutState {
            order: order.into_iter().map(CardId::from).collect(),
            hidden: hidden.into_iter().map(CardId::from).collect(),
            spans: spans.into_iter().map(|(k, v)| (CardId::from(k), v)).collect(),
        })
}

fn all_ids(layout: &dashgrid_layout::EffectiveLayout) -> Vec<CardId> {
    layout
        .visible_order
        .iter()
        .chain(&layout.hidden_order)
        .cloned()
        .collect()
}

// ============================================================================
// Invariant 1: completeness
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_live_id_appears_exactly_once(
        cards in live_cards(),
        stored in prop::option::of(stored_state()),
    ) {
        let layout = reconcile(&cards, stored.as_ref(), &WidthPolicy::default());
        let ids = all_ids(&layout);
        let unique: BTreeSet<&CardId> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
        let live: BTreeSet<&CardId> = cards.iter().map(|c| &c.id).collect();
        prop_assert_eq!(unique, live);
        prop_assert_eq!(layout.spans.len(), cards.len());
    }

    // ========================================================================
    // Invariant 2: idempotence
    // ========================================================================

    #[test]
    fn saved_result_is_a_fixed_point(
        cards in live_cards(),
        stored in prop::option::of(stored_state()),
    ) {
        let policy = WidthPolicy::default();
        let first = reconcile(&cards, stored.as_ref(), &policy);
        let second = reconcile(&cards, Some(&first.to_state()), &policy);
        prop_assert_eq!(&first.visible_order, &second.visible_order);
        prop_assert_eq!(&first.hidden_order, &second.hidden_order);
        prop_assert_eq!(&first.spans, &second.spans);

        let third = reconcile(&cards, stored.as_ref(), &policy);
        prop_assert_eq!(first, third);
    }

    // ========================================================================
    // Invariant 3: new cards surface visibly at the front
    // ========================================================================

    #[test]
    fn unseen_ids_surface_first_and_visible(
        cards in live_cards(),
        stored in stored_state(),
    ) {
        let layout = reconcile(&cards, Some(&stored), &WidthPolicy::default());
        let fresh: Vec<&CardId> = cards
            .iter()
            .map(|c| &c.id)
            .filter(|id| !stored.order.contains(*id))
            .collect();
        let head: Vec<&CardId> = layout.visible_order.iter().take(fresh.len()).collect();
        prop_assert_eq!(head, fresh);
    }

    // ========================================================================
    // Invariant 4: moves preserve membership
    // ========================================================================

    #[test]
    fn moves_never_change_partitions(
        cards in live_cards(),
        stored in stored_state(),
        moves in prop::collection::vec((0usize..9, 0usize..9, any::<bool>()), 0..24),
    ) {
        let layout = reconcile(&cards, Some(&stored), &WidthPolicy::default());
        let visible_before: BTreeSet<CardId> = layout.visible_order.iter().cloned().collect();
        let hidden_before: BTreeSet<CardId> = layout.hidden_order.iter().cloned().collect();
        let mut live = LiveLayout::from(layout);

        let order = live.current_order();
        for (from, to, before) in moves {
            if order.is_empty() {
                break;
            }
            let dragged = order[from % order.len()].clone();
            let target = order[to % order.len()].clone();
            let placement = if before { Placement::Before } else { Placement::After };
            live.move_relative(dragged.as_str(), target.as_str(), placement);
        }

        let visible_after: BTreeSet<CardId> = live.visible().iter().cloned().collect();
        let hidden_after: BTreeSet<CardId> = live.hidden().iter().cloned().collect();
        prop_assert_eq!(visible_before, visible_after);
        prop_assert_eq!(hidden_before, hidden_after);
        prop_assert_eq!(live.len(), cards.len());
    }
}

#[test]
fn five_cards_three_stored_one_stale() {
    let cards: Vec<Card> = ["a", "b", "c", "d", "e"]
        .iter()
        .enumerate()
        .map(|(i, id)| Card::new(CardId::from(*id), NodeId::new(i as u32), false))
        .collect();
    let stored = LayoutState {
        order: ["e", "stale", "a", "c"].iter().map(|s| CardId::from(*s)).collect(),
        ..LayoutState::default()
    };
    let layout = reconcile(&cards, Some(&stored), &WidthPolicy::default());
    let ids: Vec<&str> = layout.visible_order.iter().map(CardId::as_str).collect();
    assert_eq!(ids, vec!["b", "d", "e", "a", "c"]);
}
