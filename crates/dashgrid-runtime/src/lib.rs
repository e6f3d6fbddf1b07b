#![forbid(unsafe_code)]

//! Runtime: persistence, rendering, and interaction for one dashboard page.
//!
//! # Role in dashgrid
//! `dashgrid-runtime` drives a page from discovery to a live, editable grid.
//! [`PageSession`] is the entry point; everything else here is a part it
//! owns.
//!
//! # Data flow
//! ```text
//! attach ─> StoreExecutor::submit(Load)
//!   poll ─> reconcile ─> GridRenderer::render ─> affordances
//!  click / drag ─> InteractionController ─> LiveLayout ─> page
//!                                            └─> StoreExecutor::submit(Save)
//! ```
//!
//! Store access happens off the interaction path through a
//! [`StoreExecutor`]. [`ThreadedExecutor`] owns the store on a worker
//! thread; [`InlineExecutor`] runs requests on submit for single-threaded
//! hosts and tests.

pub mod config;
pub mod drag;
pub mod executor;
pub mod interaction;
pub mod render;
pub mod session;
pub mod store;

pub use config::{
    ChromeConfig, ConfigError, DEFAULT_STORAGE_KEY, EngineConfig, GridConfig, IdentityConfig,
    StorageConfig, WidthConfig, is_valid_storage_key,
};
pub use drag::{DragDispatch, DragIgnoredReason, DragState};
pub use executor::{
    InlineExecutor, StoreCompletion, StoreExecutor, StoreOutcome, StoreRequest, StoreRequestKind,
    StoreTicket, ThreadedExecutor,
};
pub use interaction::{ActionOutcome, ControlAction, InteractionController, Surface};
pub use render::{GridRenderer, RenderReport, SPAN_ATTRIBUTE};
pub use session::{EditModeGate, EditState, PageSession, SessionPhase, StoreStats};
pub use store::{FileStore, LayoutStore, MemoryStore, StoreError};
