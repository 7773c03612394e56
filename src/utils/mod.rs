//! Browser helpers.
//!
//! - [`dom`] - window/document access, scroll lock, idle callbacks, overlay audit
//! - [`storage`] - JSON values in sessionStorage

pub mod dom;
pub mod storage;
