//! HTTP API handlers for dcai-wizard

pub mod clean;
pub mod extract;
pub mod health;
pub mod query;
pub mod settings;
pub mod templates;
pub mod ui;
pub mod upload;
pub mod wizard;

pub use clean::clean_routes;
pub use extract::extract_routes;
pub use health::health_routes;
pub use query::query_routes;
pub use settings::settings_routes;
pub use templates::template_routes;
pub use ui::ui_routes;
pub use upload::upload_routes;
pub use wizard::wizard_routes;
