pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod pages;
pub mod routing;
pub mod session;
pub mod types;
pub mod validation;

pub use api::ApiClient;
pub use error::ClientError;
pub use routing::{Navigation, Route, Router};
pub use session::{Session, SessionContext};
