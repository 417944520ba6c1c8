pub mod config;
pub mod endpoints;
pub mod error;
pub mod feed;
pub mod http_client;
pub mod invite;
pub mod listing;
pub mod listing_fetch;
pub mod loader;
pub mod render;
pub mod retry;
pub mod snapshot;
pub mod state;
