pub mod config;
pub mod middleware;

use crate::{
    aggregation::{AggregationEngine, SubscriptionSource},
    config::Config,
    database::{DatabaseManager, DatabaseManagerImpl},
    error::AppError,
    health::HealthService,
    routes::{create_docs_routes, create_health_routes, create_subscription_routes},
    server::middleware::request_response_logger,
    shutdown::{ShutdownSignal, close_database},
    utils::request_id_middleware,
};
use axum::{Router, middleware as axum_middleware};
use std::sync::Arc;
use tokio::{net::TcpListener, task::JoinError, time::timeout};
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub database: Arc<dyn DatabaseManager>,
    pub engine: AggregationEngine,
    pub health_service: Arc<HealthService>,
    pub shutdown: Arc<ShutdownSignal>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let database_impl = Arc::new(DatabaseManagerImpl::new_from_config(&config).await?);
        let database: Arc<dyn DatabaseManager> = database_impl.clone();

        // Aggregates read through the same pool as the CRUD handlers
        let engine = AggregationEngine::new(Arc::new(database.subscriptions()));

        let health_service = Arc::new(HealthService::new());
        health_service.register(database_impl).await;

        Ok(Self {
            config: Arc::new(config),
            database,
            engine,
            health_service,
            shutdown: Arc::new(ShutdownSignal::new()),
        })
    }

    /// Serve aggregates from a different record source
    pub fn with_subscription_source(mut self, source: Arc<dyn SubscriptionSource>) -> Self {
        self.engine = AggregationEngine::new(source);
        self
    }

    pub async fn run(&self) -> Result<(), AppError> {
        if self.config.database.migration_on_startup {
            self.database.migrate().await?;
        } else {
            info!("Skipping migrations on startup");
        }

        let app = self.create_app();

        let addr = self.config.server.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

        info!("Server listening on http://{}", addr);

        let os_signals = self.shutdown.clone();
        tokio::spawn(async move {
            os_signals.listen_for_os_signals().await;
        });

        let serve_shutdown = self.shutdown.clone();
        let mut serve_task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    serve_shutdown.triggered().await;
                    info!("Graceful shutdown initiated");
                })
                .await
        });

        tokio::select! {
            result = &mut serve_task => log_serve_result(result),
            _ = self.shutdown.triggered() => {
                let drain = self.config.server.shutdown_timeout();
                match timeout(drain, &mut serve_task).await {
                    Ok(result) => log_serve_result(result),
                    Err(_) => {
                        warn!(
                            timeout_secs = drain.as_secs(),
                            "In-flight requests did not drain in time, aborting"
                        );
                        serve_task.abort();
                    }
                }
            }
        }

        close_database(self.database.as_ref(), self.config.server.shutdown_timeout()).await;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Creates the application router
    pub fn create_app(&self) -> Router {
        let app = Router::new()
            .nest("/subscriptions", create_subscription_routes())
            .nest("/health", create_health_routes())
            .merge(create_docs_routes())
            .with_state(self.clone());

        self.apply_layers(app)
    }

    /// Request timeout, request logging and request id, innermost first
    fn apply_layers(&self, app: Router) -> Router {
        let mut app = app.layer(TimeoutLayer::new(self.config.server.request_timeout()));

        if self.config.logging.log_request {
            app = app.layer(axum_middleware::from_fn(request_response_logger));
        }

        // Outermost, so the logger already sees the id
        app.layer(axum_middleware::from_fn(request_id_middleware))
    }
}

fn log_serve_result(result: Result<std::io::Result<()>, JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Server task failed: {}", e),
    }
}
