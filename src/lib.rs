pub mod apps;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod logging;
pub mod server;
pub mod state;
pub mod templates;
