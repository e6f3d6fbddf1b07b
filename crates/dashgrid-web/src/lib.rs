#![forbid(unsafe_code)]

//! `dashgrid-web` connects a dashgrid page to its embedding host.
//!
//! Design goals:
//! - **Host-driven**: the embedder pushes DOM events and control messages;
//!   the crate never registers listeners or timers of its own.
//! - **Node-addressed**: drag and click events name DOM nodes, and the
//!   host resolves them to cards.
//! - **Forgiving wire format**: bad control messages are logged and answered
//!   with `null`, never surfaced as panics or errors to the sender.

pub mod control;
pub mod host;

pub use control::{ControlMessage, ControlMessageError, ControlReply, EditStateReply, ToggleReply};
pub use host::{DashboardHost, NULL_REPLY};
