use crate::{
    services::{CredentialsState, configure_routes},
    settings::Settings,
};
use actix_web::web;
use blockscout_service_launcher::{database, launcher, launcher::LaunchSettings, tracing};
use credential_indexer_logic::{
    CredentialDatabase, CredentialService, CredentialSynchronizer, MetadataClient,
};
use migration::Migrator;
use std::sync::Arc;

const SERVICE_NAME: &str = "credential_indexer";

#[derive(Clone)]
struct Router {
    state: web::Data<CredentialsState>,
}

impl Router {
    // No gRPC services yet; the launcher still expects a router.
    pub fn grpc_router(&self) -> tonic::transport::server::Router {
        tonic::transport::Server::builder().add_routes(tonic::service::Routes::default())
    }
}

impl launcher::HttpRouter for Router {
    fn register_routes(&self, service_config: &mut web::ServiceConfig) {
        service_config.configure(|config| configure_routes(config, self.state.clone()));
    }
}

pub async fn run(settings: Settings) -> Result<(), anyhow::Error> {
    tracing::init_logs(SERVICE_NAME, &settings.tracing, &settings.jaeger)?;

    let service = Arc::new(CredentialService::from_settings(settings.indexer.clone())?);
    ::tracing::info!(
        contract = %service.contract(),
        default_window = settings.indexer.default_window,
        "Credential service configured"
    );

    let db_connection =
        Arc::new(database::initialize_postgres::<Migrator>(&settings.database).await?);
    let store = Arc::new(CredentialDatabase::new(db_connection));
    let synchronizer = CredentialSynchronizer::new(service.clone(), store);
    let metadata = MetadataClient::new(service.gateway().clone(), &settings.indexer.metadata)?;

    let router = Router {
        state: web::Data::new(CredentialsState {
            service,
            synchronizer,
            metadata,
        }),
    };

    let grpc_router = router.grpc_router();
    let http_router = router;

    let launch_settings = LaunchSettings {
        service_name: SERVICE_NAME.to_string(),
        server: settings.server,
        metrics: settings.metrics,
        graceful_shutdown: Default::default(),
    };

    launcher::launch(launch_settings, http_router, grpc_router).await
}
