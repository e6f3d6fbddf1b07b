#![forbid(unsafe_code)]

//! One dashboard page instance.
//!
//! [`PageSession`] ties discovery, persistence, rendering, and interaction
//! together for a single page load and owns the [`EditModeGate`].
//!
//! # Lifecycle
//!
//! ```text
//! attach ──container found──> Loading ──load completes──> Ready
//!    └──────no container────> Inert
//! ```
//!
//! While `Loading`, the page keeps its original order and every interaction
//! is ignored. The stored layout is applied exactly once, when the load
//! completion is drained by [`PageSession::poll`]. A failed load is applied
//! as "nothing stored".
//!
//! # Invariants
//!
//! 1. One load per session; rendering never runs before it completes.
//! 2. Every discrete change submits exactly one save; drag-over never saves.
//! 3. Store failures are logged and counted, never returned.

use std::time::{Duration, Instant};

use dashgrid_core::{CardId, CardRegistry, NodeId, PageDom};
use dashgrid_layout::{LayoutState, LiveLayout, WidthClass, WidthPolicy, reconcile};

use crate::config::EngineConfig;
use crate::drag::{DragDispatch, DragIgnoredReason, DragState};
use crate::executor::{
    StoreCompletion, StoreExecutor, StoreOutcome, StoreRequest, StoreRequestKind, StoreTicket,
};
use crate::interaction::{ActionOutcome, ControlAction, InteractionController, Surface};

const DRAGGABLE_ATTRIBUTE: &str = "draggable";

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No grid container on this page; the session does nothing.
    Inert,
    /// Waiting for the stored layout.
    Loading,
    /// Stored layout applied; interactions are live.
    Ready,
}

/// Whether the user is rearranging cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditModeGate {
    active: bool,
}

impl EditModeGate {
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.active
    }

    /// Returns whether the value changed.
    fn set(&mut self, active: bool) -> bool {
        let changed = self.active != active;
        self.active = active;
        changed
    }
}

/// Answer to an edit-state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditState {
    pub has_dashboard: bool,
    pub active: bool,
}

/// Store traffic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub loads_ok: u64,
    pub loads_failed: u64,
    pub saves_submitted: u64,
    pub saves_ok: u64,
    pub saves_failed: u64,
}

/// Layout engine state for one page instance.
#[derive(Debug)]
pub struct PageSession<E> {
    storage_key: String,
    policy: WidthPolicy,
    edit_class: String,
    registry: CardRegistry,
    layout: LiveLayout,
    surfaced: Vec<CardId>,
    controller: InteractionController,
    executor: E,
    phase: SessionPhase,
    gate: EditModeGate,
    stats: StoreStats,
    load_ticket: Option<StoreTicket>,
    in_flight: usize,
}

impl<E: StoreExecutor> PageSession<E> {
    /// Discover cards and request the stored layout.
    pub fn attach(dom: &mut dyn PageDom, config: &EngineConfig, mut executor: E) -> Self {
        let _span = tracing::debug_span!("session.attach", key = %config.storage.key).entered();

        let registry = CardRegistry::discover(dom, &config.selectors(), &config.resolver());
        let (phase, load_ticket) = if registry.has_container() {
            let ticket = executor.submit(StoreRequest::Load {
                key: config.storage.key.clone(),
            });
            (SessionPhase::Loading, Some(ticket))
        } else {
            tracing::debug!(target: "dashgrid.session", "no dashboard on this page");
            (SessionPhase::Inert, None)
        };

        Self {
            storage_key: config.storage.key.clone(),
            policy: config.width_policy(),
            edit_class: config.chrome.edit_class.clone(),
            registry,
            layout: LiveLayout::default(),
            surfaced: Vec::new(),
            controller: InteractionController::new(&config.chrome, config.grid.card_class.clone()),
            executor,
            phase,
            gate: EditModeGate::default(),
            stats: StoreStats::default(),
            in_flight: usize::from(load_ticket.is_some()),
            load_ticket,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    #[must_use]
    pub const fn has_dashboard(&self) -> bool {
        self.registry.has_container()
    }

    #[must_use]
    pub const fn edit_active(&self) -> bool {
        self.gate.is_active()
    }

    #[must_use]
    pub const fn edit_state(&self) -> EditState {
        EditState {
            has_dashboard: self.has_dashboard(),
            active: self.gate.is_active(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> StoreStats {
        self.stats
    }

    #[must_use]
    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    #[must_use]
    pub fn layout(&self) -> &LiveLayout {
        &self.layout
    }

    /// Cards that were missing from the stored order when the layout loaded.
    #[must_use]
    pub fn surfaced(&self) -> &[CardId] {
        &self.surfaced
    }

    #[must_use]
    pub fn drag_state(&self) -> &DragState {
        self.controller.drag_state()
    }

    /// Card whose node is `node` or contains it.
    #[must_use]
    pub fn card_at(&self, dom: &dyn PageDom, node: NodeId) -> Option<CardId> {
        self.controller.card_at(dom, &self.registry, node)
    }

    /// Store requests submitted but not yet drained.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Record that would be saved right now.
    #[must_use]
    pub fn snapshot(&self) -> LayoutState {
        self.layout.snapshot()
    }

    // -----------------------------------------------------------------------
    // Store completions
    // -----------------------------------------------------------------------

    /// Drain finished store requests without blocking. Returns how many were
    /// processed.
    pub fn poll(&mut self, dom: &mut dyn PageDom) -> usize {
        let mut processed = 0;
        while let Some(completion) = self.executor.try_next() {
            self.handle_completion(dom, completion);
            processed += 1;
        }
        processed
    }

    /// Wait until every submitted request has completed, or `timeout`
    /// elapses. Returns whether everything completed.
    pub fn settle(&mut self, dom: &mut dyn PageDom, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.executor.wait_next(remaining) {
                Some(completion) => self.handle_completion(dom, completion),
                None => return false,
            }
        }
        true
    }

    fn handle_completion(&mut self, dom: &mut dyn PageDom, completion: StoreCompletion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion.kind {
            StoreRequestKind::Load => {
                if self.load_ticket != Some(completion.ticket) {
                    return;
                }
                let stored = match completion.result {
                    Ok(StoreOutcome::Loaded(stored)) => {
                        self.stats.loads_ok += 1;
                        stored
                    }
                    Ok(StoreOutcome::Saved) => None,
                    Err(err) => {
                        self.stats.loads_failed += 1;
                        tracing::warn!(
                            target: "dashgrid.store",
                            key = %self.storage_key,
                            error = %err,
                            "layout load failed; using page order"
                        );
                        None
                    }
                };
                self.apply_loaded(dom, stored.as_ref());
            }
            StoreRequestKind::Save => match completion.result {
                Ok(_) => self.stats.saves_ok += 1,
                Err(err) => {
                    self.stats.saves_failed += 1;
                    tracing::warn!(
                        target: "dashgrid.store",
                        key = %self.storage_key,
                        ticket = completion.ticket.get(),
                        error = %err,
                        "layout save failed; change kept in memory only"
                    );
                }
            },
        }
    }

    fn apply_loaded(&mut self, dom: &mut dyn PageDom, stored: Option<&LayoutState>) {
        if self.phase != SessionPhase::Loading {
            return;
        }
        let Some(container) = self.registry.container() else {
            return;
        };
        let effective = reconcile(self.registry.cards(), stored, &self.policy);
        self.controller
            .renderer()
            .render(dom, container, &effective, &self.registry);
        self.surfaced = effective.surfaced.clone();
        self.layout = LiveLayout::from(effective);
        self.controller
            .attach_affordances(dom, &self.registry, &self.layout);
        self.phase = SessionPhase::Ready;
        if self.gate.is_active() {
            self.apply_edit_markup(dom, true);
        }

        tracing::info!(
            target: "dashgrid.session",
            cards = self.layout.len(),
            hidden = self.layout.hidden().len(),
            surfaced = self.surfaced.len(),
            restored = stored.is_some(),
            "dashboard layout applied"
        );
    }

    fn save(&mut self) {
        if self.phase != SessionPhase::Ready {
            return;
        }
        let state = self.layout.snapshot();
        let ticket = self.executor.submit(StoreRequest::Save {
            key: self.storage_key.clone(),
            state,
        });
        self.stats.saves_submitted += 1;
        self.in_flight += 1;
        tracing::debug!(
            target: "dashgrid.session",
            ticket = ticket.get(),
            "layout save submitted"
        );
    }

    // -----------------------------------------------------------------------
    // Edit-mode gate
    // -----------------------------------------------------------------------

    /// Flip the edit gate. Returns the new state; always `false` on a page
    /// without a dashboard.
    pub fn toggle_edit(&mut self, dom: &mut dyn PageDom) -> bool {
        let next = !self.gate.is_active();
        self.set_edit(dom, next);
        self.gate.is_active()
    }

    /// Open or close the edit gate. Returns whether the state changed.
    ///
    /// Closing ends any active drag and saves the layout once.
    pub fn set_edit(&mut self, dom: &mut dyn PageDom, active: bool) -> bool {
        if !self.has_dashboard() {
            tracing::debug!(target: "dashgrid.session", "edit toggle ignored; no dashboard");
            return false;
        }
        if !self.gate.set(active) {
            return false;
        }
        self.apply_edit_markup(dom, active);
        if !active {
            self.controller.drag_end(dom);
            self.save();
        }
        tracing::info!(target: "dashgrid.session", active, "edit mode changed");
        true
    }

    fn apply_edit_markup(&self, dom: &mut dyn PageDom, active: bool) {
        let Some(container) = self.registry.container() else {
            return;
        };
        if active {
            dom.add_class(container, &self.edit_class);
        } else {
            dom.remove_class(container, &self.edit_class);
        }
        for card in self.registry.cards() {
            if active {
                dom.set_attribute(card.node, DRAGGABLE_ATTRIBUTE, "true");
            } else {
                dom.remove_attribute(card.node, DRAGGABLE_ATTRIBUTE);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Card actions
    // -----------------------------------------------------------------------

    /// Hide a visible card or show a hidden one.
    pub fn toggle_hidden(&mut self, dom: &mut dyn PageDom, id: &str) -> ActionOutcome {
        self.run_action(dom, &ControlAction::ToggleHidden(CardId::from(id)))
    }

    /// Set a card's width.
    pub fn set_width(
        &mut self,
        dom: &mut dyn PageDom,
        id: &str,
        width: WidthClass,
    ) -> ActionOutcome {
        self.run_action(dom, &ControlAction::SetWidth(CardId::from(id), width))
    }

    /// Handle a click anywhere on the page. Returns `None` when the target is
    /// not engine chrome.
    pub fn click(&mut self, dom: &mut dyn PageDom, target: NodeId) -> Option<ActionOutcome> {
        let action = self.controller.resolve_click(dom, &self.registry, target)?;
        Some(self.run_action(dom, &action))
    }

    fn run_action(&mut self, dom: &mut dyn PageDom, action: &ControlAction) -> ActionOutcome {
        if self.phase != SessionPhase::Ready {
            return ActionOutcome::NotReady;
        }
        let Some(container) = self.registry.container() else {
            return ActionOutcome::NotReady;
        };
        let mut surface = Surface {
            dom,
            container,
            registry: &self.registry,
            layout: &mut self.layout,
        };
        let outcome = match action {
            ControlAction::ToggleHidden(id) => {
                self.controller.toggle_hidden(&mut surface, id.as_str())
            }
            ControlAction::SetWidth(id, width) => {
                self.controller.set_width(&mut surface, id.as_str(), *width)
            }
        };
        if outcome.should_persist() {
            self.save();
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Drag
    // -----------------------------------------------------------------------

    /// Begin dragging `id`.
    pub fn drag_start(&mut self, dom: &mut dyn PageDom, id: &str) -> DragDispatch {
        let editing = self.gate.is_active();
        let Some(container) = self.ready_container() else {
            return DragDispatch::ignored(DragIgnoredReason::NotReady);
        };
        let mut surface = Surface {
            dom,
            container,
            registry: &self.registry,
            layout: &mut self.layout,
        };
        self.controller.drag_start(&mut surface, id, editing)
    }

    /// Dragged card is over `target` at vertical position `pointer_y`.
    pub fn drag_over(
        &mut self,
        dom: &mut dyn PageDom,
        target: &str,
        pointer_y: f64,
    ) -> DragDispatch {
        let Some(container) = self.ready_container() else {
            return DragDispatch::ignored(DragIgnoredReason::NotReady);
        };
        let mut surface = Surface {
            dom,
            container,
            registry: &self.registry,
            layout: &mut self.layout,
        };
        self.controller.drag_over(&mut surface, target, pointer_y)
    }

    /// Drop the dragged card. Saves unless the drop was ignored.
    pub fn drop_on(&mut self, dom: &mut dyn PageDom, target: Option<&str>) -> DragDispatch {
        let Some(container) = self.ready_container() else {
            return DragDispatch::ignored(DragIgnoredReason::NotReady);
        };
        let mut surface = Surface {
            dom,
            container,
            registry: &self.registry,
            layout: &mut self.layout,
        };
        let dispatch = self.controller.drop_on(&mut surface, target);
        if dispatch.persist {
            self.save();
        }
        dispatch
    }

    /// End the drag, whether or not a drop happened.
    ///
    /// Cleanup runs in every phase.
    pub fn drag_end(&mut self, dom: &mut dyn PageDom) -> DragDispatch {
        self.controller.drag_end(dom)
    }

    fn ready_container(&self) -> Option<NodeId> {
        if self.phase == SessionPhase::Ready {
            self.registry.container()
        } else {
            None
        }
    }
}
