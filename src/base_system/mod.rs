pub mod album_url;
pub mod config;
pub mod context;
pub mod interrupt;
pub mod logging;
