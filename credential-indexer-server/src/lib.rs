mod server;
mod services;
mod settings;

pub use server::run;
pub use services::{ApiError, CredentialsState, configure_routes};
pub use settings::Settings;
