pub mod comments;
pub mod config;
pub mod flat_db;
pub mod logger;
pub mod post_info;
pub mod post_render;
pub mod server;
pub mod store;
pub mod util;
mod paginator;
mod query_string;
pub mod view;
