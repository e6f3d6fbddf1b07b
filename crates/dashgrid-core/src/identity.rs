#![forbid(unsafe_code)]

//! Stable card identity.
//!
//! A card keeps the host's native identifier when it has one. Cards without
//! one are named after the path of their primary link, hashed with a 32-bit
//! rolling fold. The path is used instead of the visible title because the
//! title changes with the user's locale while the link target does not.
//!
//! # Invariants
//!
//! 1. Resolution is pure: the same node content always yields the same id.
//! 2. Display text never participates in the derived id.
//! 3. A card without any link hashes the empty string; collisions between
//!    such cards are settled by the registry (first node wins).
//!
//! # Failure Modes
//!
//! None. Resolution is infallible.

use crate::card::CardId;
use crate::dom::{NodeId, PageDom};

/// Default attribute carrying a card's identifier.
pub const DEFAULT_ID_ATTRIBUTE: &str = "data-card-id";

/// Default prefix for derived identifiers.
pub const DEFAULT_ID_PREFIX: &str = "card-";

/// 32-bit order-dependent fold (`h = h * 31 + unit`) over UTF-16 code units.
#[must_use]
pub fn fold_hash(key: &str) -> i32 {
    key.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut buf = Vec::with_capacity(7);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

/// Reduce an `href` to its path: scheme, host, query and fragment removed.
#[must_use]
pub fn link_path(href: &str) -> &str {
    let href = href.trim();
    let without_origin = if let Some(idx) = href.find("://") {
        let rest = &href[idx + 3..];
        rest.find('/').map_or("/", |slash| &rest[slash..])
    } else if let Some(rest) = href.strip_prefix("//") {
        rest.find('/').map_or("/", |slash| &rest[slash..])
    } else {
        href
    };
    let end = without_origin
        .find(['?', '#'])
        .unwrap_or(without_origin.len());
    &without_origin[..end]
}

/// Derives card identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    id_attribute: String,
    id_prefix: String,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ID_ATTRIBUTE, DEFAULT_ID_PREFIX)
    }
}

impl IdentityResolver {
    #[must_use]
    pub fn new(id_attribute: impl Into<String>, id_prefix: impl Into<String>) -> Self {
        Self {
            id_attribute: id_attribute.into(),
            id_prefix: id_prefix.into(),
        }
    }

    /// Attribute read for native identifiers and written back by discovery.
    #[must_use]
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Native identifier carried by `node`, if any.
    #[must_use]
    pub fn native_id(&self, dom: &dyn PageDom, node: NodeId) -> Option<CardId> {
        dom.attribute(node, &self.id_attribute)
            .filter(|raw| !raw.trim().is_empty())
            .map(CardId::from)
    }

    /// Language-independent key for `node`: the path of its primary link.
    #[must_use]
    pub fn link_key(&self, dom: &dyn PageDom, node: NodeId) -> String {
        let anchor = if dom.tag(node).as_deref() == Some("a") {
            Some(node)
        } else {
            dom.descendants(node)
                .into_iter()
                .find(|&n| dom.tag(n).as_deref() == Some("a") && dom.attribute(n, "href").is_some())
        };
        anchor
            .and_then(|a| dom.attribute(a, "href"))
            .map(|href| link_path(&href).to_owned())
            .unwrap_or_default()
    }

    /// Derived identifier for a key.
    #[must_use]
    pub fn derive(&self, key: &str) -> CardId {
        let hash = fold_hash(key);
        CardId::new(format!("{}{}", self.id_prefix, to_base36(hash.unsigned_abs())))
    }

    /// Resolve the identifier for `node`.
    #[must_use]
    pub fn resolve(&self, dom: &dyn PageDom, node: NodeId) -> CardId {
        self.native_id(dom, node)
            .unwrap_or_else(|| self.derive(&self.link_key(dom, node)))
    }
}
