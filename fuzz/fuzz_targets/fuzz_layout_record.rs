#![no_main]

use std::collections::BTreeSet;

use dashgrid_core::{Card, CardId, NodeId};
use dashgrid_layout::{LayoutState, WidthPolicy, reconcile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks how many live cards the page has (0..16).
    let Some((&count, payload)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(payload) else {
        return;
    };
    let Ok(stored) = serde_json::from_str::<LayoutState>(text) else {
        return;
    };

    let cards: Vec<Card> = (0..u32::from(count % 16))
        .map(|i| Card::new(CardId::new(format!("c{i}")), NodeId::new(i + 1), false))
        .collect();
    let layout = reconcile(&cards, Some(&stored), &WidthPolicy::default());

    // Every live card exactly once.
    let placed: Vec<&CardId> = layout.visible_order.iter().chain(&layout.hidden_order).collect();
    let unique: BTreeSet<&CardId> = placed.iter().copied().collect();
    assert_eq!(placed.len(), cards.len(), "card count changed");
    assert_eq!(unique.len(), cards.len(), "card placed twice");
    assert_eq!(layout.spans.len(), cards.len(), "width missing");

    // Saving and reconciling again is a fixed point.
    let again = reconcile(&cards, Some(&layout.to_state()), &WidthPolicy::default());
    assert_eq!(again.visible_order, layout.visible_order);
    assert_eq!(again.hidden_order, layout.hidden_order);
    assert_eq!(again.spans, layout.spans);

    // The record survives its own encoding.
    let encoded = serde_json::to_string(&layout.to_state()).expect("encode layout");
    let decoded: LayoutState = serde_json::from_str(&encoded).expect("decode layout");
    assert_eq!(decoded, layout.to_state());
});
