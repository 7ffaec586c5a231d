pub mod config;
pub mod paths;
pub mod state;

pub use config::AppConfig;
pub use paths::AppPaths;
pub use state::AppState;
