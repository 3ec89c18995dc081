pub mod core_api;
pub mod csv;
pub mod document;
pub mod edits;
pub mod event_chapters;
pub mod layout;
pub mod story;
pub mod stream;
pub mod treasure;
