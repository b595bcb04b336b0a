mod credentials;
mod error;
mod health;

use actix_web::web;
use credential_indexer_logic::{CredentialService, CredentialSynchronizer, MetadataClient};
use std::sync::Arc;

pub use error::ApiError;

pub struct CredentialsState {
    pub service: Arc<CredentialService>,
    pub synchronizer: CredentialSynchronizer,
    pub metadata: MetadataClient,
}

pub fn configure_routes(config: &mut web::ServiceConfig, state: web::Data<CredentialsState>) {
    config
        .app_data(state)
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            ApiError::InvalidInput(err.to_string()).into()
        }))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            ApiError::InvalidInput(err.to_string()).into()
        }))
        .route("/health", web::get().to(health::health))
        .service(
            web::scope("/api/v1")
                .route("/credentials", web::get().to(credentials::list_credentials))
                .route("/sync", web::post().to(credentials::sync_credentials))
                .route("/metadata", web::get().to(credentials::get_metadata)),
        );
}
