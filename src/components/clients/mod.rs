//! Demo business screens.
//!
//! - [`ClientList`] - filterable list with a filter drawer and a create dialog
//! - [`ClientDetail`] - record view with a details sheet and an edit dialog
//! - [`ClientEditor`] - edit dialog guarded by a discard confirmation

mod detail;
mod editor;
mod list;

pub use detail::ClientDetail;
pub use editor::ClientEditor;
pub use list::ClientList;
