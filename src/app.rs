use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public, system};
use crate::middleware::require_session;
use crate::state::AppState;

/// Build the full application router over `state`.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(auth_routes())
        // Opportunities (mixed public and session-gated)
        .merge(opportunity_routes(&state))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(public::signup))
        .route("/login", post(public::login))
        .route("/logout", post(public::logout))
}

fn opportunity_routes(state: &AppState) -> Router<AppState> {
    let session = || from_fn_with_state(state.clone(), require_session);

    Router::new()
        // One matcher node serves `GET /opportunity/:id` and `POST /opportunity/:userid`;
        // handlers read the segment positionally.
        .route(
            "/opportunity/:key",
            get(public::opportunity_get).merge(post(protected::opportunity_add).route_layer(session())),
        )
        .route(
            "/opportunity/:key/:id",
            delete(protected::opportunity_delete).route_layer(session()),
        )
        .route(
            "/opportunity",
            put(protected::opportunity_update).route_layer(session()),
        )
        .route(
            "/opportunities",
            get(protected::opportunities_list_mine).route_layer(session()),
        )
        .route(
            "/opportunities/:userid",
            get(protected::opportunities_list)
                .delete(protected::opportunities_delete_all)
                .route_layer(session()),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
