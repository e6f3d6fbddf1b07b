#![forbid(unsafe_code)]

//! Per-card controls and drag handling.
//!
//! Every handler mutates the [`LiveLayout`] first and then brings the page
//! in line with it. Handlers never save; they report whether the change
//! should be persisted and the session decides.
//!
//! # Control Strip
//!
//! Each card gets one strip, inserted as its first child:
//!
//! ```text
//! <div class="dashgrid-controls">
//!   <button class="dashgrid-hide-toggle" aria-pressed="false">
//!   <button class="dashgrid-width-button" data-span-choice="2">   (one per width)
//!   <span class="dashgrid-drag-handle">
//! </div>
//! ```
//!
//! # Invariants
//!
//! 1. Attaching affordances twice leaves one strip per card.
//! 2. Drag-over never persists; drop is the only drag event that does.
//! 3. A drag over a card in the other partition changes nothing.
//! 4. After drag end no node carries the dragging class.

use dashgrid_core::{CardId, CardRegistry, NodeId, PageDom};
use dashgrid_layout::{LiveLayout, MoveOutcome, Partition, Placement, WidthClass};

use crate::config::ChromeConfig;
use crate::drag::{DragDispatch, DragIgnoredReason, DragState};
use crate::render::GridRenderer;

pub const CONTROLS_CLASS: &str = "dashgrid-controls";
pub const HIDE_TOGGLE_CLASS: &str = "dashgrid-hide-toggle";
pub const WIDTH_BUTTON_CLASS: &str = "dashgrid-width-button";
/// Carried by the width button matching the card's current width.
pub const ACTIVE_WIDTH_CLASS: &str = "dashgrid-width-active";
pub const DRAG_HANDLE_CLASS: &str = "dashgrid-drag-handle";
/// Attribute naming the width a width button selects.
pub const SPAN_CHOICE_ATTRIBUTE: &str = "data-span-choice";

/// Mutable view of the page a handler works on.
pub struct Surface<'a> {
    pub dom: &'a mut dyn PageDom,
    pub container: NodeId,
    pub registry: &'a CardRegistry,
    pub layout: &'a mut LiveLayout,
}

/// Result of a hide or width action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The layout changed and should be saved.
    Changed,
    /// The request matched the current layout.
    Unchanged,
    UnknownCard,
    /// The stored layout has not been applied yet.
    NotReady,
}

impl ActionOutcome {
    #[must_use]
    pub const fn should_persist(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// A click on engine-owned chrome, resolved to a card action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    ToggleHidden(CardId),
    SetWidth(CardId, WidthClass),
}

/// Owns the control-strip markup, the renderer, and the drag state.
#[derive(Debug, Clone)]
pub struct InteractionController {
    dragging_class: String,
    card_class: String,
    renderer: GridRenderer,
    drag: DragState,
}

impl InteractionController {
    #[must_use]
    pub fn new(chrome: &ChromeConfig, card_class: impl Into<String>) -> Self {
        Self {
            dragging_class: chrome.dragging_class.clone(),
            card_class: card_class.into(),
            renderer: GridRenderer::new(chrome),
            drag: DragState::Idle,
        }
    }

    #[must_use]
    pub fn renderer(&self) -> &GridRenderer {
        &self.renderer
    }

    #[must_use]
    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    // -----------------------------------------------------------------------
    // Affordances
    // -----------------------------------------------------------------------

    /// Give every card a control strip. Returns how many strips were added.
    pub fn attach_affordances(
        &self,
        dom: &mut dyn PageDom,
        registry: &CardRegistry,
        layout: &LiveLayout,
    ) -> usize {
        let mut attached = 0;
        for card in registry.cards() {
            if controls_of(dom, card.node).is_none() {
                let strip = build_strip(dom);
                let first = dom.children(card.node).first().copied();
                dom.insert_before(card.node, strip, first);
                attached += 1;
            }
            sync_controls(dom, card.node, layout, &card.id);
        }
        attached
    }

    /// Resolve a click target inside a card's control strip.
    #[must_use]
    pub fn resolve_click(
        &self,
        dom: &dyn PageDom,
        registry: &CardRegistry,
        target: NodeId,
    ) -> Option<ControlAction> {
        let card = self.card_at(dom, registry, target)?;
        if dom.closest_with_class(target, HIDE_TOGGLE_CLASS).is_some() {
            return Some(ControlAction::ToggleHidden(card));
        }
        let button = dom.closest_with_class(target, WIDTH_BUTTON_CLASS)?;
        let width = span_choice(dom, button)?;
        Some(ControlAction::SetWidth(card, width))
    }

    /// Card whose node is `node` or contains it.
    #[must_use]
    pub fn card_at(
        &self,
        dom: &dyn PageDom,
        registry: &CardRegistry,
        node: NodeId,
    ) -> Option<CardId> {
        let card_node = dom.closest_with_class(node, &self.card_class)?;
        registry.card_for_node(card_node).map(|card| card.id.clone())
    }

    // -----------------------------------------------------------------------
    // Hide and width
    // -----------------------------------------------------------------------

    /// Flip a card between the visible and hidden partitions.
    pub fn toggle_hidden(&self, surface: &mut Surface<'_>, id: &str) -> ActionOutcome {
        let Some(now_hidden) = surface.layout.toggle_hidden(id) else {
            return ActionOutcome::UnknownCard;
        };
        self.renderer.render(
            surface.dom,
            surface.container,
            &surface.layout.to_effective(),
            surface.registry,
        );
        if let Some(card) = surface.registry.get(id) {
            sync_controls(surface.dom, card.node, surface.layout, &card.id);
        }
        tracing::debug!(
            target: "dashgrid.layout",
            card_id = id,
            hidden = now_hidden,
            "card visibility toggled"
        );
        ActionOutcome::Changed
    }

    /// Set a card's width.
    pub fn set_width(
        &self,
        surface: &mut Surface<'_>,
        id: &str,
        width: WidthClass,
    ) -> ActionOutcome {
        let Some(card) = surface.registry.get(id) else {
            return ActionOutcome::UnknownCard;
        };
        if !surface.layout.set_span(id, width) {
            return if surface.layout.span(id).is_some() {
                ActionOutcome::Unchanged
            } else {
                ActionOutcome::UnknownCard
            };
        }
        self.renderer.apply_span(surface.dom, card.node, width);
        sync_controls(surface.dom, card.node, surface.layout, &card.id);
        tracing::debug!(
            target: "dashgrid.layout",
            card_id = id,
            columns = width.columns(),
            "card width set"
        );
        ActionOutcome::Changed
    }

    // -----------------------------------------------------------------------
    // Drag
    // -----------------------------------------------------------------------

    /// Begin dragging `id`. Only allowed while the edit gate is open.
    pub fn drag_start(
        &mut self,
        surface: &mut Surface<'_>,
        id: &str,
        editing: bool,
    ) -> DragDispatch {
        let result = self.start(surface, id, editing);
        finish("start", Some(id), result)
    }

    fn start(
        &mut self,
        surface: &mut Surface<'_>,
        id: &str,
        editing: bool,
    ) -> Result<DragDispatch, DragIgnoredReason> {
        if !editing {
            return Err(DragIgnoredReason::EditModeInactive);
        }
        let node = surface
            .registry
            .node(id)
            .ok_or(DragIgnoredReason::UnknownCard)?;
        if self.drag.is_active() {
            return Err(DragIgnoredReason::DragAlreadyActive);
        }
        self.drag = DragState::Dragging {
            card: CardId::from(id),
        };
        surface.dom.add_class(node, &self.dragging_class);
        Ok(DragDispatch::APPLIED)
    }

    /// Dragged card is over `target` at vertical position `pointer_y`.
    ///
    /// Above the target's vertical midpoint places the dragged card before
    /// the target, otherwise after it. The page is updated immediately.
    pub fn drag_over(
        &mut self,
        surface: &mut Surface<'_>,
        target: &str,
        pointer_y: f64,
    ) -> DragDispatch {
        let result = self.over(surface, target, pointer_y);
        finish("over", Some(target), result)
    }

    fn over(
        &self,
        surface: &mut Surface<'_>,
        target: &str,
        pointer_y: f64,
    ) -> Result<DragDispatch, DragIgnoredReason> {
        let card = self.drag.card().ok_or(DragIgnoredReason::NoActiveDrag)?;
        if card.as_str() == target {
            return Err(DragIgnoredReason::SameCard);
        }
        let target_node = surface
            .registry
            .node(target)
            .ok_or(DragIgnoredReason::UnknownCard)?;
        if surface.layout.partition_of(card.as_str()) != surface.layout.partition_of(target) {
            return Err(DragIgnoredReason::CrossPartition);
        }
        let bounds = surface
            .dom
            .bounds(target_node)
            .ok_or(DragIgnoredReason::MissingBounds)?;
        let placement = if bounds.is_above_midpoint(pointer_y) {
            Placement::Before
        } else {
            Placement::After
        };

        match surface.layout.move_relative(card.as_str(), target, placement) {
            MoveOutcome::Moved => {}
            MoveOutcome::Unchanged => return Err(DragIgnoredReason::PositionUnchanged),
            MoveOutcome::CrossPartition => return Err(DragIgnoredReason::CrossPartition),
            MoveOutcome::Invalid => return Err(DragIgnoredReason::UnknownCard),
        }
        self.renderer.reposition(
            surface.dom,
            surface.container,
            surface.layout,
            surface.registry,
            card.as_str(),
        );
        Ok(DragDispatch::APPLIED)
    }

    /// Drop the dragged card, optionally onto `target`.
    ///
    /// A drop onto a card in the other partition is ignored. Any other drop
    /// asks for the current order to be saved.
    pub fn drop_on(&mut self, surface: &mut Surface<'_>, target: Option<&str>) -> DragDispatch {
        let result = match self.drag.card() {
            None => Err(DragIgnoredReason::NoActiveDrag),
            Some(card) => match target.and_then(|t| surface.layout.partition_of(t)) {
                Some(side) if surface.layout.partition_of(card.as_str()) != Some(side) => {
                    Err(DragIgnoredReason::CrossPartition)
                }
                _ => Ok(DragDispatch::PERSIST),
            },
        };
        finish("drop", target, result)
    }

    /// End the drag, dropped or not.
    ///
    /// The dragging class is cleared from every node, even when no drag is
    /// active.
    pub fn drag_end(&mut self, dom: &mut dyn PageDom) -> DragDispatch {
        let root = dom.root();
        let mut nodes = dom.descendants(root);
        nodes.push(root);
        for node in nodes {
            if dom.has_class(node, &self.dragging_class) {
                dom.remove_class(node, &self.dragging_class);
            }
        }
        let card = self.drag.take();
        let result = match &card {
            Some(_) => Ok(DragDispatch::APPLIED),
            None => Err(DragIgnoredReason::NoActiveDrag),
        };
        finish("end", card.as_ref().map(CardId::as_str), result)
    }
}

fn finish(
    phase: &'static str,
    card: Option<&str>,
    result: Result<DragDispatch, DragIgnoredReason>,
) -> DragDispatch {
    match result {
        Ok(dispatch) => {
            tracing::debug!(
                target: "dashgrid.drag",
                phase,
                card,
                persist = dispatch.persist,
                "drag event applied"
            );
            dispatch
        }
        Err(reason) => {
            tracing::trace!(target: "dashgrid.drag", phase, card, reason = ?reason, "drag event ignored");
            DragDispatch::ignored(reason)
        }
    }
}

// ---------------------------------------------------------------------------
// Control strip markup
// ---------------------------------------------------------------------------

fn build_strip(dom: &mut dyn PageDom) -> NodeId {
    let strip = dom.create_element("div");
    dom.add_class(strip, CONTROLS_CLASS);

    let toggle = dom.create_element("button");
    dom.add_class(toggle, HIDE_TOGGLE_CLASS);
    dom.set_attribute(toggle, "type", "button");
    dom.set_attribute(toggle, "aria-label", "Hide card");
    dom.append_child(strip, toggle);

    for width in WidthClass::ALL {
        let button = dom.create_element("button");
        dom.add_class(button, WIDTH_BUTTON_CLASS);
        dom.set_attribute(button, "type", "button");
        dom.set_attribute(button, SPAN_CHOICE_ATTRIBUTE, &width.columns().to_string());
        dom.set_attribute(button, "aria-label", &format!("Width {}", width.label()));
        dom.append_child(strip, button);
    }

    let handle = dom.create_element("span");
    dom.add_class(handle, DRAG_HANDLE_CLASS);
    dom.set_attribute(handle, "aria-label", "Drag to reorder");
    dom.append_child(strip, handle);
    strip
}

fn controls_of(dom: &dyn PageDom, card: NodeId) -> Option<NodeId> {
    dom.children(card)
        .into_iter()
        .find(|&child| dom.has_class(child, CONTROLS_CLASS))
}

/// Reflect hidden state and width on a card's strip.
fn sync_controls(dom: &mut dyn PageDom, card: NodeId, layout: &LiveLayout, id: &CardId) {
    let Some(strip) = controls_of(dom, card) else {
        return;
    };
    let hidden = layout.partition_of(id.as_str()) == Some(Partition::Hidden);
    let width = layout.span(id.as_str());
    for node in dom.children(strip) {
        if dom.has_class(node, HIDE_TOGGLE_CLASS) {
            dom.set_attribute(node, "aria-pressed", if hidden { "true" } else { "false" });
            let label = if hidden { "Show card" } else { "Hide card" };
            dom.set_attribute(node, "aria-label", label);
        } else if dom.has_class(node, WIDTH_BUTTON_CLASS) {
            let choice = span_choice(dom, node);
            if choice.is_some() && choice == width {
                dom.add_class(node, ACTIVE_WIDTH_CLASS);
            } else {
                dom.remove_class(node, ACTIVE_WIDTH_CLASS);
            }
        }
    }
}

fn span_choice(dom: &dyn PageDom, node: NodeId) -> Option<WidthClass> {
    dom.attribute(node, SPAN_CHOICE_ATTRIBUTE)
        .and_then(|raw| raw.trim().parse::<u8>().ok())
        .and_then(WidthClass::from_columns)
}
