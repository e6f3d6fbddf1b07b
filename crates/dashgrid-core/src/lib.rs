#![forbid(unsafe_code)]

//! Core: host page abstraction, card identity, and card discovery.
//!
//! # Role in dashgrid
//! `dashgrid-core` is the input layer. It owns the [`PageDom`] seam through
//! which the engine reaches the host page, the [`CardId`] type, the identity
//! resolver, and the registry that turns container children into cards.
//!
//! # How it fits in the system
//! `dashgrid-layout` consumes the ordered card ids produced here and decides
//! where each card goes. `dashgrid-runtime` projects that decision back onto
//! the page through the same [`PageDom`] trait.

pub mod card;
pub mod dom;
pub mod geometry;
pub mod identity;
pub mod registry;

pub use card::{Card, CardId};
pub use dom::{MemoryDom, NodeId, PageDom};
pub use geometry::Bounds;
pub use identity::{IdentityResolver, fold_hash};
pub use registry::{CardRegistry, CardSelectors};
