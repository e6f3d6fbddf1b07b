#![forbid(unsafe_code)]

//! Property tests for interaction sequences on a live page.
//!
//! Validates, after every event of an arbitrary sequence:
//! - The page shows every card exactly once: visible cards, then the divider
//!   (only if something is hidden), then hidden cards, matching the layout.
//! - Drag-over never submits a save.
//! - After drag end, nothing is being dragged and no node keeps the dragging
//!   class.

use std::collections::BTreeSet;

use dashgrid_core::{CardId, MemoryDom, NodeId, PageDom};
use dashgrid_runtime::{EngineConfig, InlineExecutor, MemoryStore, PageSession};
use proptest::prelude::*;

const ROW: f64 = 100.0;

type Session = PageSession<InlineExecutor<MemoryStore>>;

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
enum Event {
    ToggleEdit,
    ToggleHidden(usize),
    Start(usize),
    Over(usize, f64),
    Drop(Option<usize>),
    End,
}

fn event(cards: usize) -> impl Strategy<Value = Event> {
    prop_oneof![
        1 => Just(Event::ToggleEdit),
        1 => (0..cards).prop_map(Event::ToggleHidden),
        2 => (0..cards).prop_map(Event::Start),
        5 => ((0..cards), 0.0..1.0f64).prop_map(|(i, frac)| Event::Over(i, frac)),
        1 => prop::option::of(0..cards).prop_map(Event::Drop),
        2 => Just(Event::End),
    ]
}

fn scenario() -> impl Strategy<Value = (usize, Vec<Event>)> {
    (2usize..7).prop_flat_map(|cards| (Just(cards), prop::collection::vec(event(cards), 1..40)))
}

// ============================================================================
// Page helpers
// ============================================================================

fn card_name(i: usize) -> String {
    format!("card-{i}")
}

fn open(cards: usize) -> (MemoryDom, NodeId, Session) {
    let mut dom = MemoryDom::new();
    let root = dom.root();
    let container = dom.append_element(root, "div", &["dashboard-grid"]);
    for i in 0..cards {
        let card = dom.append_element(container, "div", &["dashboard-card"]);
        dom.set_attribute(card, "data-card-id", &card_name(i));
    }
    let mut session = PageSession::attach(
        &mut dom,
        &EngineConfig::default(),
        InlineExecutor::new(MemoryStore::new()),
    );
    session.poll(&mut dom);
    dom.stack_children(container, ROW);
    (dom, container, session)
}

fn expected_sequence(session: &Session) -> Vec<String> {
    let layout = session.layout();
    let mut out: Vec<String> = layout.visible().iter().map(CardId::to_string).collect();
    if !layout.hidden().is_empty() {
        out.push("|".to_owned());
        out.extend(layout.hidden().iter().map(CardId::to_string));
    }
    out
}

fn page_sequence(dom: &MemoryDom, container: NodeId) -> Vec<String> {
    dom.children(container)
        .into_iter()
        .map(|node| {
            if dom.has_class(node, "dashgrid-divider") {
                "|".to_owned()
            } else {
                dom.attribute(node, "data-card-id").unwrap_or_default()
            }
        })
        .collect()
}

fn apply(dom: &mut MemoryDom, container: NodeId, session: &mut Session, event: &Event) {
    match event {
        Event::ToggleEdit => {
            session.toggle_edit(dom);
        }
        Event::ToggleHidden(i) => {
            session.toggle_hidden(dom, &card_name(*i));
        }
        Event::Start(i) => {
            session.drag_start(dom, &card_name(*i));
        }
        Event::Over(i, frac) => {
            let node = session.registry().node(&card_name(*i)).unwrap();
            let bounds = dom.bounds(node).unwrap();
            let y = bounds.top() + frac * ROW;
            session.drag_over(dom, &card_name(*i), y);
        }
        Event::Drop(target) => {
            let target = target.map(card_name);
            session.drop_on(dom, target.as_deref());
        }
        Event::End => {
            session.drag_end(dom);
        }
    }
    session.poll(dom);
    dom.stack_children(container, ROW);
}

proptest! {
    #[test]
    fn page_matches_layout_after_every_event((cards, events) in scenario()) {
        let (mut dom, container, mut session) = open(cards);
        let all: BTreeSet<String> = (0..cards).map(card_name).collect();

        for event in &events {
            let saves_before = session.stats().saves_submitted;
            apply(&mut dom, container, &mut session, event);

            prop_assert_eq!(page_sequence(&dom, container), expected_sequence(&session));
            let shown: BTreeSet<String> = session
                .layout()
                .current_order()
                .iter()
                .map(CardId::to_string)
                .collect();
            prop_assert_eq!(&shown, &all);
            prop_assert_eq!(session.layout().len(), cards);

            if matches!(event, Event::Over(..)) {
                prop_assert_eq!(session.stats().saves_submitted, saves_before);
            }
            if matches!(event, Event::End) {
                prop_assert!(session.drag_state().card().is_none());
                prop_assert!(dom.nodes_with_class(dom.root(), "dashgrid-dragging").is_empty());
            }
        }
    }

    #[test]
    fn saves_match_discrete_changes((cards, events) in scenario()) {
        let (mut dom, container, mut session) = open(cards);
        for event in &events {
            apply(&mut dom, container, &mut session, event);
        }
        let stats = session.stats();
        prop_assert_eq!(stats.saves_ok, stats.saves_submitted);
        prop_assert_eq!(session.in_flight(), 0);
    }
}
