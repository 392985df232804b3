//! NewTube REST API: video browsing, uploads, engagement and channel subscriptions

pub mod models;
pub mod repositories;
pub mod routes;
pub mod settings;
pub mod state;

pub use routes::{build_app, create_router};
pub use settings::Settings;
pub use state::AppState;
