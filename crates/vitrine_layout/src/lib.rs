//! Vitrine Page Model
//!
//! The [`Page`] capability features use to find and mutate elements, and
//! [`Document`], an in-memory page that also answers layout queries. The
//! document lets a whole site run headless.

pub mod document;
pub mod page;
pub mod selector;

pub use document::Document;
pub use page::Page;
pub use selector::{Selector, SelectorError, SelectorList};
