//! # bz-ui
//!
//! The view controller of Rusty-Bazaar. Pages talk to the page shell through
//! the [`Surface`] port, render rows with askama templates, and share one
//! generic [`ListBinder`] for every collection view. [`PageRouter`] decides
//! which page routines run on load.

pub mod binder;
pub mod context;
pub mod debounce;
pub mod pages;
pub mod router;
pub mod surface;
pub mod templates;

pub use binder::{Empty, Frame, Gate, ListBinder, ListSource, ListState, RowInput, RowOutcome};
pub use context::{Submission, ViewContext};
pub use debounce::Debouncer;
pub use router::{Mounted, PageRouter};
pub use surface::{row_field, Document, Element, Surface};
