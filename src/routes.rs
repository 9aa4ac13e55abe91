use axum::{
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{elevated, protected, public};
use crate::middleware::{device_key_middleware, jwt_auth_middleware};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(checkout_routes())
        // Protected (customer JWT)
        .merge(protected_routes(state.clone()))
        // Elevated (kitchen device key)
        .merge(kitchen_routes(state.clone()))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register/send", post(auth::register_send))
        .route("/auth/register/verify", post(auth::register_verify))
        .route("/auth/login/send", post(auth::login_send))
        .route("/auth/login/verify", post(auth::login_verify))
        .route("/auth/otp/:phone", get(auth::otp_status))
}

fn checkout_routes() -> Router<AppState> {
    use public::checkout;

    Router::new()
        .route("/checkout/options", post(checkout::checkout_options))
        .route("/orders", post(checkout::place_order))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, orders, profile};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/profile", get(profile::profile_get).put(profile::profile_put))
        .route("/api/orders", get(orders::my_orders).post(orders::place_my_order))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn kitchen_routes(state: AppState) -> Router<AppState> {
    use elevated::kitchen;

    Router::new()
        .route("/api/kitchen/orders", get(kitchen::list_orders))
        .route("/api/kitchen/orders/:id", get(kitchen::show_order))
        .route("/api/kitchen/orders/:id/status", put(kitchen::update_status))
        .route("/api/kitchen/orders/:id/complete", post(kitchen::complete_order))
        .route("/api/kitchen/queue/next", get(kitchen::next_in_queue))
        .route("/api/kitchen/queue/:id", delete(kitchen::remove_from_queue))
        .route_layer(from_fn_with_state(state, device_key_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Cafe API",
            "version": version,
            "description": "OTP sign-in, ordering and kitchen queue for a table-service cafe",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register/{send,verify}, /auth/login/{send,verify} (public)",
                "checkout": "/checkout/options, /orders (public)",
                "account": "/api/auth/whoami, /api/profile, /api/orders (JWT)",
                "kitchen": "/api/kitchen/* (device key)",
            }
        }
    }))
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let sms = match state.sms.check().await {
        Ok(status) => json!({ "status": "ok", "detail": status }),
        Err(e) => json!({ "status": "degraded", "detail": e.to_string() }),
    };

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok",
                    "sms": sms
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "code": "SERVICE_UNAVAILABLE",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string(),
                    "sms": sms
                }
            })),
        ),
    }
}
