pub mod models;
pub mod properties;
pub mod services;
pub mod naming;
pub mod config;
pub mod errors;
pub mod handler;

pub use models::*;
pub use properties::*;
pub use services::*;
pub use naming::*;
pub use config::*;
pub use errors::*;
pub use handler::*;
