use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::{catalog, orders, tokens, users};
use crate::auth::IdentityProvider;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }
}

async fn root() -> &'static str {
    "Hello watch lover!"
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

/// Admin-only surface. Every route here runs through the RequireAdmin
/// extractor; the client-side-only gating of the original dashboard is
/// not trusted.
fn dashboard_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/allPurchases", get(orders::all_purchases))
        .route("/purchase/{id}", delete(orders::admin_cancel_purchase))
        .route("/purchaseStatus/{id}", put(orders::ship_purchase))
        .route("/addProduct", post(catalog::add_watch))
        .route("/watches/{id}", delete(catalog::delete_watch))
}

fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tokens", post(tokens::issue_token))
        .route("/tokens/{id}", delete(tokens::revoke_token))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/watches", get(catalog::list_watches))
        .route("/watch/{id}", get(catalog::get_watch))
        .route("/reviews", get(catalog::list_reviews))
        .route("/review", post(catalog::add_review))
        .route("/purchase", post(orders::create_purchase))
        .route("/purchase/{id}", delete(orders::cancel_purchase))
        .route("/myPurchases/{email}", get(orders::my_purchases))
        .route("/users", post(users::create_user).put(users::upsert_user))
        .route("/users/admin", put(users::grant_admin))
        .route("/users/{email}", get(users::admin_status))
        .nest("/dashboard", dashboard_router())
        .nest("/auth", auth_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
