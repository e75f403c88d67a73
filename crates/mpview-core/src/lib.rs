//! mpview core - list view rendering and reconciliation
//!
//! This crate turns pages of media records into rendered rows, keeps those
//! rows in step with fresh pages without rebuilding them, and manages the
//! per-view containers, selection and drag reordering on top.

pub mod container;
pub mod drag;
pub mod error;
pub mod fields;
pub mod format;
pub mod page;
pub mod reconcile;
pub mod render;
pub mod row;
pub mod view;

pub use container::{ ContainerManager, Dispatch, ResizeDebouncer, ViewContainer, ViewEvent, ViewHandler };
pub use drag::{ DragController, DropOutcome, Reorder };
pub use error::ViewError;
pub use fields::{ AlbumMode, Features, FieldRegistry };
pub use format::{ format_field, format_value, Fragment, Icon };
pub use page::{ paginate_window, EntryType, PageResult, Pagination, Record, RequestSequence, Response };
pub use reconcile::{
    reconcile, reconcile_response, AlbumDividers, EntryIdentity, IdentityMatcher, Paging, ReconcileOptions, ReconcileStats,
};
pub use render::{ render_row, ActionTemplate, Content, Layout, RenderContext, Translate };
pub use row::{ EntryData, Identity, NodeId, RenderedRow };
pub use view::{ ViewConfig, ViewId, ViewMode };
