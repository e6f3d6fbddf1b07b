#![forbid(unsafe_code)]

//! Host-driven page wrapper.
//!
//! [`DashboardHost`] owns the page model and the [`PageSession`], so an
//! embedder only forwards raw events: control-message JSON, clicks, drag
//! events by node, and a periodic [`tick`](DashboardHost::tick) that drains
//! store completions. Nothing here blocks.
//!
//! Browser drag events name DOM nodes, not cards. Each target is mapped to
//! the card that contains it; targets outside any card are ignored with
//! [`DragIgnoredReason::UnknownCard`], except for drops, which still drop.
//! Window blur and a hidden page end the drag like `dragend` would.

use dashgrid_core::{CardId, NodeId, PageDom};
use dashgrid_runtime::{
    ActionOutcome, DragDispatch, DragIgnoredReason, EngineConfig, PageSession, StoreExecutor,
};

use crate::control::{ControlMessage, ControlMessageError, ControlReply, ToggleReply};

/// Reply sent for a message the bridge could not handle.
pub const NULL_REPLY: &str = "null";

/// One dashboard page driven by host events.
#[derive(Debug)]
pub struct DashboardHost<D, E> {
    dom: D,
    session: PageSession<E>,
}

impl<D: PageDom, E: StoreExecutor> DashboardHost<D, E> {
    /// Discover the page and request its stored layout.
    pub fn attach(mut dom: D, config: &EngineConfig, executor: E) -> Self {
        let session = PageSession::attach(&mut dom, config, executor);
        Self { dom, session }
    }

    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    #[must_use]
    pub fn session(&self) -> &PageSession<E> {
        &self.session
    }

    /// Give the page model back, e.g. to inspect it after a test run.
    pub fn into_dom(self) -> D {
        self.dom
    }

    /// Drain finished store work.
    pub fn tick(&mut self) -> usize {
        self.session.poll(&mut self.dom)
    }

    /// Apply a decoded control message.
    pub fn handle_message(&mut self, message: ControlMessage) -> ControlReply {
        match message {
            ControlMessage::ToggleDashboardEdit => ControlReply::Toggle(ToggleReply {
                active: self.session.toggle_edit(&mut self.dom),
            }),
            ControlMessage::GetDashboardEditState => {
                ControlReply::EditState(self.session.edit_state().into())
            }
        }
    }

    /// Decode, apply, and encode one control message. Errors are logged and
    /// answered with [`NULL_REPLY`].
    pub fn handle_json(&mut self, json: &str) -> String {
        match self.try_handle_json(json) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(target: "dashgrid.control", error = %err, "control message rejected");
                NULL_REPLY.to_owned()
            }
        }
    }

    fn try_handle_json(&mut self, json: &str) -> Result<String, ControlMessageError> {
        let message = ControlMessage::decode(json)?;
        tracing::debug!(target: "dashgrid.control", kind = message.type_name(), "control message");
        self.handle_message(message).encode()
    }

    /// Click anywhere on the page.
    pub fn click(&mut self, target: NodeId) -> Option<ActionOutcome> {
        self.session.click(&mut self.dom, target)
    }

    /// `dragstart` on `target`.
    pub fn drag_start(&mut self, target: NodeId) -> DragDispatch {
        match self.card_at(target) {
            Some(card) => self.session.drag_start(&mut self.dom, card.as_str()),
            None => outside_cards("start", target),
        }
    }

    /// `dragover` on `target` at viewport position `pointer_y`.
    pub fn drag_over(&mut self, target: NodeId, pointer_y: f64) -> DragDispatch {
        match self.card_at(target) {
            Some(card) => self.session.drag_over(&mut self.dom, card.as_str(), pointer_y),
            None => outside_cards("over", target),
        }
    }

    /// `drop` on `target`. A drop outside any card keeps the previewed
    /// order.
    pub fn drop_on(&mut self, target: NodeId) -> DragDispatch {
        let card = self.card_at(target);
        self.session
            .drop_on(&mut self.dom, card.as_ref().map(CardId::as_str))
    }

    /// `dragend`.
    pub fn drag_end(&mut self) -> DragDispatch {
        self.session.drag_end(&mut self.dom)
    }

    /// Window lost focus mid-drag.
    pub fn blur(&mut self) -> DragDispatch {
        tracing::debug!(target: "dashgrid.drag", "window blur; ending drag");
        self.drag_end()
    }

    /// Page became hidden mid-drag.
    pub fn visibility_hidden(&mut self) -> DragDispatch {
        tracing::debug!(target: "dashgrid.drag", "page hidden; ending drag");
        self.drag_end()
    }

    fn card_at(&self, target: NodeId) -> Option<CardId> {
        self.session.card_at(&self.dom, target)
    }
}

fn outside_cards(phase: &'static str, target: NodeId) -> DragDispatch {
    tracing::trace!(target: "dashgrid.drag", phase, node = target.get(), "drag target outside any card");
    DragDispatch::ignored(DragIgnoredReason::UnknownCard)
}

#[cfg(test)]
mod tests {
    use super::DashboardHost;
    use dashgrid_core::{CardId, MemoryDom, NodeId, PageDom};
    use dashgrid_runtime::{DragIgnoredReason, EngineConfig, InlineExecutor, MemoryStore};
    use pretty_assertions::assert_eq;

    type Host = DashboardHost<MemoryDom, InlineExecutor<MemoryStore>>;

    fn editing_host(ids: &[&str]) -> (Host, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let container = dom.append_element(root, "div", &["dashboard-grid"]);
        for id in ids {
            let card = dom.append_element(container, "div", &["dashboard-card"]);
            dom.set_attribute(card, "data-card-id", id);
            let title = dom.append_element(card, "h3", &[]);
            dom.set_text(title, *id);
        }
        dom.stack_children(container, 100.0);
        let mut host = DashboardHost::attach(
            dom,
            &EngineConfig::default(),
            InlineExecutor::new(MemoryStore::new()),
        );
        host.tick();
        host.handle_json(r#"{"type":"TOGGLE_DASHBOARD_EDIT"}"#);
        (host, container)
    }

    fn title_of(host: &Host, id: &str) -> NodeId {
        let card = host.session().registry().node(id).unwrap();
        host.dom().find_first_by_tag(card, "h3").unwrap()
    }

    #[test]
    fn nested_targets_resolve_to_their_card() {
        let (mut host, _) = editing_host(&["a", "b"]);

        let title = title_of(&host, "a");
        let start = host.drag_start(title);
        assert!(!start.is_ignored());
        assert_eq!(
            host.session().drag_state().card().map(CardId::as_str),
            Some("a")
        );

        let over_title = title_of(&host, "b");
        let over = host.drag_over(over_title, 190.0);
        assert!(!over.is_ignored());
        assert_eq!(
            host.session().layout().visible(),
            &[CardId::from("b"), CardId::from("a")]
        );
    }

    #[test]
    fn targets_outside_cards_are_unknown() {
        let (mut host, container) = editing_host(&["a", "b"]);

        let start = host.drag_start(container);
        assert_eq!(start.ignored, Some(DragIgnoredReason::UnknownCard));
        assert!(host.session().drag_state().card().is_none());

        let over = host.drag_over(container, 0.0);
        assert_eq!(over.ignored, Some(DragIgnoredReason::UnknownCard));
    }

    #[test]
    fn drop_outside_a_card_still_saves() {
        let (mut host, container) = editing_host(&["a", "b"]);
        let a = host.session().registry().node("a").unwrap();
        host.drag_start(a);
        let saves = host.session().stats().saves_submitted;

        let drop = host.drop_on(container);
        assert!(drop.persist);
        assert_eq!(host.session().stats().saves_submitted, saves + 1);
    }

    #[test]
    fn blur_ends_the_drag() {
        let (mut host, _) = editing_host(&["a", "b"]);
        let b = host.session().registry().node("b").unwrap();
        host.drag_start(b);
        assert!(host.dom().has_class(b, "dashgrid-dragging"));

        let end = host.blur();
        assert!(!end.is_ignored());
        assert!(host.session().drag_state().card().is_none());
        assert!(!host.dom().has_class(b, "dashgrid-dragging"));
    }
}
