// app.rs - Shared state and router assembly

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::AdminGate;
use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::require_admin;
use crate::panel::{PanelApi, PanelClient, PanelError};

/// Read-only state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gate: Arc<AdminGate>,
    pub panel: Arc<dyn PanelApi>,
}

impl AppState {
    /// State backed by the real panel client.
    pub fn new(config: AppConfig) -> Result<Self, PanelError> {
        let panel = PanelClient::new(&config.panel)?;
        Ok(Self::with_panel(config, Arc::new(panel)))
    }

    pub fn with_panel(config: AppConfig, panel: Arc<dyn PanelApi>) -> Self {
        let gate = AdminGate::from_config(&config);
        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            panel,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/api", get(public::api_root))
        .route("/health", get(public::health))
        .route("/debug/telegram", get(public::debug_telegram))
        .route("/debug/headers", get(public::debug_headers))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{devices, stats, users};

    Router::new()
        // Users
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:identifier",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/:identifier/reset", post(users::reset_user_traffic))
        .route("/api/users/:identifier/revoke", post(users::revoke_subscription))
        // Statistics
        .route("/api/stats", get(stats::get_stats))
        .route("/api/stats/nodes", get(stats::get_nodes))
        .route("/api/stats/squads", get(stats::get_squads))
        // Devices
        .route("/api/devices", get(devices::list_devices))
        .route("/api/devices/:device_uuid", delete(devices::delete_device))
        // Gate runs only for matched routes, so unknown paths stay 404
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Credentialed CORS for the configured origins; methods and headers mirror
/// the preflight request.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(_) if origin == "*" => {
                warn!("Wildcard CORS origin is not allowed with credentials, ignoring it");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
