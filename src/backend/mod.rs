pub mod cache;
pub mod error;
pub mod feeds;
pub mod loader;
pub mod mangadex;
pub mod pager;
pub mod settings;
