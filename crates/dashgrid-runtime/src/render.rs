#![forbid(unsafe_code)]

//! Projection of a layout onto the grid container.
//!
//! # Output Order
//!
//! ```text
//! [host nodes] [visible cards…] [divider] [hidden cards…] [host nodes]
//! ```
//!
//! The grid takes the slot of the first card the container held; host nodes
//! before and after that slot stay where they were. The divider is present
//! only while at least one card is hidden. Cards carry their column count in
//! the span attribute; hidden cards also carry the hidden class.
//!
//! # Invariants
//!
//! 1. Card nodes are reparented, never cloned or recreated.
//! 2. After any number of renders the container holds at most one divider.
//! 3. Host nodes keep their relative order and their side of the grid.

use dashgrid_core::{CardRegistry, NodeId, PageDom};
use dashgrid_layout::{EffectiveLayout, LiveLayout, Partition, WidthClass};

use crate::config::ChromeConfig;

/// Attribute receiving a card's column span.
pub const SPAN_ATTRIBUTE: &str = "data-span";

/// Summary of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    pub visible: usize,
    pub hidden: usize,
    pub divider: Option<NodeId>,
}

/// Writes layouts onto the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRenderer {
    hidden_class: String,
    divider_class: String,
}

impl GridRenderer {
    #[must_use]
    pub fn new(chrome: &ChromeConfig) -> Self {
        Self {
            hidden_class: chrome.hidden_class.clone(),
            divider_class: chrome.divider_class.clone(),
        }
    }

    /// Rebuild the grid from `layout`.
    pub fn render(
        &self,
        dom: &mut dyn PageDom,
        container: NodeId,
        layout: &EffectiveLayout,
        registry: &CardRegistry,
    ) -> RenderReport {
        let _span = tracing::debug_span!(
            "grid.render",
            visible = layout.visible_order.len(),
            hidden = layout.hidden_order.len(),
        )
        .entered();

        let children = dom.children(container);
        let anchor = children
            .iter()
            .position(|&c| self.is_grid_node(&*dom, registry, c))
            .and_then(|first| {
                children[first..]
                    .iter()
                    .copied()
                    .find(|&c| !self.is_grid_node(&*dom, registry, c))
            });

        let mut divider = None;
        for &child in &children {
            if dom.has_class(child, &self.divider_class) {
                if divider.is_none() {
                    divider = Some(child);
                }
                dom.detach(child);
            }
        }
        for card in registry.cards() {
            if dom.parent(card.node) == Some(container) {
                dom.detach(card.node);
            }
        }

        let visible = self.place_cards(dom, container, anchor, layout, registry, false);

        let mut hidden = 0;
        let mut placed_divider = None;
        if !layout.hidden_order.is_empty() {
            let node = divider.unwrap_or_else(|| self.create_divider(dom));
            dom.insert_before(container, node, anchor);
            placed_divider = Some(node);
            hidden = self.place_cards(dom, container, anchor, layout, registry, true);
        }

        tracing::debug!(
            target: "dashgrid.render",
            visible,
            hidden,
            divider = placed_divider.is_some(),
            "grid rendered"
        );

        RenderReport {
            visible,
            hidden,
            divider: placed_divider,
        }
    }

    /// Move one card's node to match its slot in `live`.
    ///
    /// Only that node is touched, which keeps drag previews cheap.
    pub fn reposition(
        &self,
        dom: &mut dyn PageDom,
        container: NodeId,
        live: &LiveLayout,
        registry: &CardRegistry,
        id: &str,
    ) {
        let Some(node) = registry.node(id) else {
            return;
        };
        let reference = match live.next_in_partition(id) {
            Some(next) => registry.node(next.as_str()),
            None if live.partition_of(id) == Some(Partition::Visible) => self
                .divider(dom, container)
                .or_else(|| self.after_grid(dom, container, registry, node)),
            None => self.after_grid(dom, container, registry, node),
        };
        dom.insert_before(container, node, reference);
    }

    /// Write a card's width to the page.
    pub fn apply_span(&self, dom: &mut dyn PageDom, node: NodeId, width: WidthClass) {
        dom.set_attribute(node, SPAN_ATTRIBUTE, &width.columns().to_string());
    }

    /// Current divider inside `container`, if any.
    #[must_use]
    pub fn divider(&self, dom: &dyn PageDom, container: NodeId) -> Option<NodeId> {
        dom.children(container)
            .into_iter()
            .find(|&child| dom.has_class(child, &self.divider_class))
    }

    fn is_grid_node(&self, dom: &dyn PageDom, registry: &CardRegistry, node: NodeId) -> bool {
        registry.card_for_node(node).is_some() || dom.has_class(node, &self.divider_class)
    }

    /// First host node after the grid, ignoring `moving`.
    fn after_grid(
        &self,
        dom: &dyn PageDom,
        container: NodeId,
        registry: &CardRegistry,
        moving: NodeId,
    ) -> Option<NodeId> {
        let children: Vec<NodeId> = dom
            .children(container)
            .into_iter()
            .filter(|&c| c != moving)
            .collect();
        let last = children
            .iter()
            .rposition(|&c| self.is_grid_node(dom, registry, c))?;
        children.get(last + 1).copied()
    }

    fn place_cards(
        &self,
        dom: &mut dyn PageDom,
        container: NodeId,
        anchor: Option<NodeId>,
        layout: &EffectiveLayout,
        registry: &CardRegistry,
        hidden: bool,
    ) -> usize {
        let ids = if hidden {
            &layout.hidden_order
        } else {
            &layout.visible_order
        };
        let mut placed = 0;
        for id in ids {
            let Some(node) = registry.node(id.as_str()) else {
                continue;
            };
            dom.insert_before(container, node, anchor);
            if let Some(width) = layout.span(id.as_str()) {
                self.apply_span(dom, node, width);
            }
            if hidden {
                dom.add_class(node, &self.hidden_class);
            } else {
                dom.remove_class(node, &self.hidden_class);
            }
            placed += 1;
        }
        placed
    }

    fn create_divider(&self, dom: &mut dyn PageDom) -> NodeId {
        let node = dom.create_element("div");
        dom.add_class(node, &self.divider_class);
        dom.set_attribute(node, "aria-hidden", "true");
        node
    }
}
