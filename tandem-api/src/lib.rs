use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tandem_shared::middleware::{metrics_middleware, AuthConfig};

pub mod config;
pub mod live;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use config::AppConfig;
use live::{LocalFeed, MatchFeed};
use store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub feed: Arc<dyn MatchFeed>,
    pub config: AppConfig,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// State with an in-process live feed sized from the config.
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let feed = Arc::new(LocalFeed::new(config.live_channel_capacity));
        Self {
            store,
            feed,
            config,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

impl AuthConfig for AppState {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Identity
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        // Profiles
        .route(
            "/profile",
            get(routes::profile::get_profile)
                .post(routes::profile::create_profile)
                .patch(routes::profile::update_profile),
        )
        .route("/profile/photos", post(routes::profile::add_photo))
        .route("/profile/photos/:index", delete(routes::profile::remove_photo))
        .route("/profile/partner/:user_id", get(routes::profile::partner_profile))
        // Swipe
        .route("/candidates", get(routes::candidates::list_candidates))
        .route("/decisions", post(routes::decisions::record_decision))
        // Matches
        .route("/matches", get(routes::matches::list_matches))
        .route("/matches/:match_id", get(routes::matches::get_match))
        // Chat
        .route(
            "/messages/:match_id",
            get(routes::messages::list_messages).post(routes::messages::send_message),
        )
        .route("/messages/:match_id/read", post(routes::messages::mark_read))
        .route("/messages/:match_id/unread", get(routes::messages::unread_count))
        .route("/messages/:match_id/live", get(routes::messages::live));

    if state.config.enable_dev_routes {
        tracing::warn!("development routes enabled");
        app = app
            .route("/dev/seed-users", post(routes::dev::seed_users))
            .route("/dev/clear-test-users", post(routes::dev::clear_test_users));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(middleware::from_fn(metrics_middleware)),
    )
    .with_state(state)
}
