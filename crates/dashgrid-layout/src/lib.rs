#![forbid(unsafe_code)]

//! Layout state and reconciliation.
//!
//! - [`LayoutState`] is the persisted `{ order, hidden, spans }` record.
//! - [`reconcile`] merges a stored record with the cards discovered on the
//!   current page and yields an [`EffectiveLayout`].
//! - [`LiveLayout`] is the in-memory ordering edited during a session. The
//!   page is a projection of it, and persistence snapshots come from it.

pub mod live;
pub mod reconcile;
pub mod state;
pub mod width;

pub use live::{LiveLayout, MoveOutcome, Partition, Placement};
pub use reconcile::{EffectiveLayout, STATS_SUMMARY_CARD_ID, WidthPolicy, reconcile};
pub use state::LayoutState;
pub use width::{InvalidWidth, WidthClass};
