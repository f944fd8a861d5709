use crate::config::{FuelConfig, StoreBackend};
use crate::handlers;
use crate::services::{FuelService, FuelStore, InMemoryFuelStore, MongoFuelStore};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FuelStore>,
    pub service: FuelService,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: FuelConfig) -> Result<Self, AppError> {
        let store: Arc<dyn FuelStore> = match config.store_backend {
            StoreBackend::Mongo => {
                let db = MongoFuelStore::connect(&config.mongodb.uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        AppError::from(e)
                    })?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    AppError::from(e)
                })?;
                Arc::new(db)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Arc::new(InMemoryFuelStore::new())
            }
        };

        Self::build_with_store(config, store).await
    }

    /// Build around an already constructed store.
    pub async fn build_with_store(
        config: FuelConfig,
        store: Arc<dyn FuelStore>,
    ) -> Result<Self, AppError> {
        let service = FuelService::new(store.clone(), config.standards.clone(), config.bands);
        let state = AppState {
            store,
            service,
        };

        let app = router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/stations",
            post(handlers::create_station).get(handlers::list_stations),
        )
        .route("/stations/:name", patch(handlers::update_station))
        .route(
            "/delivery-orders",
            post(handlers::create_delivery_order).get(handlers::list_delivery_orders),
        )
        .route("/delivery-orders/:id", get(handlers::get_delivery_order))
        .route(
            "/fuel-records",
            post(handlers::create_fuel_record).get(handlers::list_fuel_records),
        )
        .route(
            "/fuel-records/:id",
            get(handlers::get_fuel_record).delete(handlers::delete_fuel_record),
        )
        .route(
            "/fuel-records/:id/columns",
            patch(handlers::update_record_columns),
        )
        .route(
            "/fuel-records/:id/extra-fuel",
            get(handlers::get_record_extra_fuel),
        )
        .route("/lpos", post(handlers::create_lpo).get(handlers::list_lpos))
        .route("/lpos/export", get(handlers::export_lpos))
        .route(
            "/lpos/:id",
            get(handlers::get_lpo).delete(handlers::delete_lpo),
        )
        .route("/lpos/:id/status", post(handlers::update_lpo_status))
        .route("/lpos/:id/cancel", post(handlers::cancel_lpo))
        .route(
            "/driver-accounts",
            post(handlers::create_driver_account).get(handlers::list_driver_accounts),
        )
        .route(
            "/driver-accounts/export",
            get(handlers::export_driver_accounts),
        )
        .route(
            "/driver-accounts/:id",
            get(handlers::get_driver_account)
                .patch(handlers::update_driver_account)
                .delete(handlers::delete_driver_account),
        )
        .route(
            "/driver-accounts/:id/settle",
            post(handlers::settle_driver_account),
        )
        .route(
            "/driver-accounts/:id/dispute",
            post(handlers::dispute_driver_account),
        )
        .route("/reports/routes", get(handlers::route_report))
        .route("/reports/trucks", get(handlers::truck_report))
        .route("/reports/stations", get(handlers::station_report))
        .route("/reports/extra-fuel", get(handlers::extra_fuel_report))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
