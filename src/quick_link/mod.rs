//! Search the vault by title and drop a wikilink at the caret.

pub mod filter;
pub mod link;
pub mod picker;
pub mod selection;
pub mod view;

pub use link::insert_alias_template;
pub use picker::{PickerOptions, QuickLinkPicker};
