pub mod buffer;
pub mod config;
pub mod cursor;
pub mod mode;
pub mod vault;
