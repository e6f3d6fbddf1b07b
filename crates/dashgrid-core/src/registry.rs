#![forbid(unsafe_code)]

//! Card discovery.
//!
//! [`CardRegistry::discover`] scans the grid container for card nodes, gives
//! every node an identifier, and keeps the first node seen for each id.
//!
//! # Invariants
//!
//! 1. Exactly one [`Card`] per distinct id; later duplicates are skipped.
//! 2. Cards are ordered by document position. Collaborators insert synthetic
//!    cards at the front of the container, so they come first.
//! 3. The only page mutation is writing a resolved id to nodes that lacked
//!    one, which makes repeated discovery idempotent.
//!
//! # Failure Modes
//!
//! - Missing container: the registry is empty and reports
//!   [`has_container`](CardRegistry::has_container) `== false`. Not an error.

use rustc_hash::FxHashMap;

use crate::card::{Card, CardId};
use crate::dom::{NodeId, PageDom};
use crate::identity::IdentityResolver;

/// Class names that identify the grid and its cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelectors {
    /// Class of the grid container.
    pub container_class: String,
    /// Class every card carries, native or synthetic.
    pub card_class: String,
    /// Extra class carried by collaborator-inserted cards.
    pub synthetic_class: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            container_class: "dashboard-grid".to_owned(),
            card_class: "dashboard-card".to_owned(),
            synthetic_class: "dashgrid-synthetic".to_owned(),
        }
    }
}

/// Authoritative id → card mapping for one page instance.
#[derive(Debug, Clone, Default)]
pub struct CardRegistry {
    container: Option<NodeId>,
    cards: Vec<Card>,
    index: FxHashMap<CardId, usize>,
    duplicates: Vec<(NodeId, CardId)>,
}

impl CardRegistry {
    /// Discover all cards under `dom.root()`.
    pub fn discover(
        dom: &mut dyn PageDom,
        selectors: &CardSelectors,
        resolver: &IdentityResolver,
    ) -> Self {
        let root = dom.root();
        let Some(container) = dom.find_first_by_class(root, &selectors.container_class) else {
            tracing::debug!(
                target: "dashgrid.registry",
                container_class = %selectors.container_class,
                "grid container not found; skipping page"
            );
            return Self::default();
        };

        let mut registry = Self {
            container: Some(container),
            ..Self::default()
        };

        for node in dom.children(container) {
            if !dom.has_class(node, &selectors.card_class) {
                continue;
            }
            let native = resolver.native_id(dom, node);
            let derived = native.is_none();
            let id = native.unwrap_or_else(|| resolver.derive(&resolver.link_key(dom, node)));
            if registry.index.contains_key(&id) {
                tracing::debug!(
                    target: "dashgrid.registry",
                    card_id = %id,
                    node = node.get(),
                    "duplicate card id; keeping first node"
                );
                registry.duplicates.push((node, id));
                continue;
            }
            if derived {
                dom.set_attribute(node, resolver.id_attribute(), id.as_str());
            }
            let synthetic = dom.has_class(node, &selectors.synthetic_class);
            registry.index.insert(id.clone(), registry.cards.len());
            registry.cards.push(Card::new(id, node, synthetic));
        }

        tracing::debug!(
            target: "dashgrid.registry",
            cards = registry.cards.len(),
            duplicates = registry.duplicates.len(),
            "card discovery complete"
        );
        registry
    }

    /// Whether the grid container was found.
    #[must_use]
    pub const fn has_container(&self) -> bool {
        self.container.is_some()
    }

    #[must_use]
    pub const fn container(&self) -> Option<NodeId> {
        self.container
    }

    /// Cards in discovery order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Card> {
        self.index.get(id).and_then(|&i| self.cards.get(i))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<NodeId> {
        self.get(id).map(|card| card.node)
    }

    /// Card owning `node`, if `node` is a registered card.
    #[must_use]
    pub fn card_for_node(&self, node: NodeId) -> Option<&Card> {
        self.cards.iter().find(|card| card.node == node)
    }

    /// Ids in discovery order.
    #[must_use]
    pub fn ids(&self) -> Vec<CardId> {
        self.cards.iter().map(|card| card.id.clone()).collect()
    }

    /// Nodes excluded because their id was already taken.
    #[must_use]
    pub fn duplicates(&self) -> &[(NodeId, CardId)] {
        &self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::{CardRegistry, CardSelectors};
    use crate::dom::{MemoryDom, NodeId, PageDom};
    use crate::identity::IdentityResolver;

    fn page() -> (MemoryDom, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let main = dom.append_element(root, "main", &[]);
        let grid = dom.append_element(main, "div", &["dashboard-grid"]);
        (dom, grid)
    }

    fn linked_card(dom: &mut MemoryDom, grid: NodeId, href: &str) -> NodeId {
        let card = dom.append_element(grid, "div", &["dashboard-card"]);
        let a = dom.append_element(card, "a", &[]);
        dom.set_attribute(a, "href", href);
        card
    }

    #[test]
    fn missing_container_yields_empty_registry() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        dom.append_element(root, "div", &["dashboard-card"]);
        let before = dom.revision();
        let reg = CardRegistry::discover(&mut dom, &CardSelectors::default(), &IdentityResolver::default());
        assert!(!reg.has_container());
        assert!(reg.is_empty());
        assert_eq!(dom.revision(), before);
    }

    #[test]
    fn discovery_orders_by_document_and_flags_synthetic() {
        let (mut dom, grid) = page();
        let stats = dom.append_element(grid, "section", &["dashboard-card", "dashgrid-synthetic"]);
        dom.set_attribute(stats, "data-card-id", "stats-summary");
        let a = linked_card(&mut dom, grid, "/courses/1");
        let b = linked_card(&mut dom, grid, "/courses/2");
        dom.append_element(grid, "div", &["unrelated"]);

        let reg = CardRegistry::discover(&mut dom, &CardSelectors::default(), &IdentityResolver::default());
        let nodes: Vec<NodeId> = reg.cards().iter().map(|c| c.node).collect();
        assert_eq!(nodes, vec![stats, a, b]);
        assert!(reg.cards()[0].synthetic);
        assert!(!reg.cards()[1].synthetic);
        assert_eq!(reg.node("stats-summary"), Some(stats));
    }

    #[test]
    fn resolved_ids_are_written_back() {
        let (mut dom, grid) = page();
        let a = linked_card(&mut dom, grid, "/courses/1");
        let reg = CardRegistry::discover(&mut dom, &CardSelectors::default(), &IdentityResolver::default());
        let id = reg.cards()[0].id.clone();
        assert_eq!(dom.attribute(a, "data-card-id").as_deref(), Some(id.as_str()));

        let rev = dom.revision();
        let again = CardRegistry::discover(&mut dom, &CardSelectors::default(), &IdentityResolver::default());
        assert_eq!(again.ids(), reg.ids());
        assert_eq!(dom.revision(), rev);
    }

    #[test]
    fn colliding_ids_keep_first_node() {
        let (mut dom, grid) = page();
        let first = dom.append_element(grid, "div", &["dashboard-card"]);
        let second = dom.append_element(grid, "div", &["dashboard-card"]);
        let reg = CardRegistry::discover(&mut dom, &CardSelectors::default(), &IdentityResolver::default());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.cards()[0].node, first);
        assert_eq!(reg.duplicates().len(), 1);
        assert_eq!(reg.duplicates()[0].0, second);
        assert_eq!(reg.card_for_node(second), None);
    }

    #[test]
    fn only_direct_children_are_cards() {
        let (mut dom, grid) = page();
        let card = linked_card(&mut dom, grid, "/a");
        dom.append_element(card, "div", &["dashboard-card"]);
        let reg = CardRegistry::discover(&mut dom, &CardSelectors::default(), &IdentityResolver::default());
        assert_eq!(reg.len(), 1);
    }
}
