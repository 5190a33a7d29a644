pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod models;
pub mod store;

use config::Config;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Store,
}
