pub mod models;
pub mod error;
pub mod config;
pub mod spec;
pub mod capture;
pub mod resolver;
pub mod auth;
pub mod engine;
pub mod sources;
pub mod lifecycle;  // Battery, extraction rules and the lifecycle runner
pub mod catalog;
pub mod broken_auth;
pub mod scan;
pub mod reporting;

// Re-export commonly used items
pub use models::*;
pub use error::*;
pub use config::*;
pub use spec::*;
pub use capture::*;
pub use resolver::*;
pub use auth::*;
pub use engine::*;
pub use sources::*;
pub use lifecycle::*;
pub use catalog::*;
pub use broken_auth::*;
pub use scan::*;
pub use reporting::*;
