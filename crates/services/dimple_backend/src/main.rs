// File: crates/services/dimple_backend/src/main.rs
//! The Dimple API server: loads config, picks a storage backend, wires the
//! booking and payment routers under `/api` and serves.

use axum::{routing::get, Router};
use dimple_booking::logic::BookingService;
use dimple_booking::store::{memory::MemoryStore, Store};
use dimple_common::error::{config_error, Context, DimpleError};
use dimple_config::{load_config, AppConfig};
use dimple_db::{DbClientFactory, RepositoryFactory, SqlStoreFactory};
use dimple_notify::TelegramNotifier;
use dimple_payments::logic::PaymentWorkflow;
use dimple_telebirr::TelebirrGateway;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Builds the full application router over whichever store the deployment
/// selected. Generic so both backends share one composition path.
fn build_app<S: Store + 'static>(config: Arc<AppConfig>, store: Arc<S>) -> Router {
    let booking_service = Arc::new(BookingService::new(store.clone(), config.booking.clone()));

    let gateway: Option<Arc<TelebirrGateway>> =
        TelebirrGateway::from_app_config(&config).map(Arc::new);
    if gateway.is_none() {
        warn!("Telebirr integration disabled; payment initiation will return 502");
    }
    let notifier: Option<Arc<TelegramNotifier>> =
        TelegramNotifier::from_app_config(&config).map(Arc::new);
    let workflow = Arc::new(PaymentWorkflow::new(store, gateway, notifier));

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to Dimple API!" }))
        .merge(dimple_booking::routes::routes(
            config.clone(),
            booking_service,
        ))
        .merge(dimple_payments::routes::routes(config.clone(), workflow));

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), DimpleError> {
    let config = Arc::new(load_config().map_err(config_error)?);
    dimple_common::logging::init();

    // SQL store when a database is configured, in-memory otherwise.
    #[allow(unused_mut)] // for the openapi feature it needs to be mutable
    let mut app = if config.database.is_some() {
        let client = DbClientFactory::new()
            .from_app_config(&config)
            .await
            .context("connecting to the database")?;
        let store = SqlStoreFactory::new().create_repository(client);
        store
            .init_schema()
            .await
            .context("initializing the database schema")?;
        info!("Using SQL store");
        build_app(config.clone(), Arc::new(store))
    } else {
        warn!("No database configured; using in-memory store (state is lost on restart)");
        build_app(config.clone(), Arc::new(MemoryStore::new()))
    };

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use dimple_booking::doc::BookingApiDoc;
        use dimple_payments::doc::PaymentsApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        // Define the Merged OpenAPI Documentation struct
        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Dimple API",
                version = "0.1.0",
                description = "Dimple booking and payments API docs",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
            tags( (name = "Dimple", description = "Core service endpoints")),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        openapi_doc.merge(PaymentsApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc.clone());
        app = app.merge(swagger_ui);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
