use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use std::{sync::Arc, time::Duration};

use crate::{ServerError, balance, categories, favorites, items, sales, user};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Listener and request limits.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub bind: String,
    pub port: u16,
    /// Deadline for a whole request. An expired request drops its store
    /// transaction, which rolls it back.
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout: Duration::from_secs(30),
            max_body_bytes: Self::body_limit_for_image(5 * 1024 * 1024),
        }
    }
}

impl ServerOptions {
    /// Body limit that fits a base64 image of `max_image_bytes` plus the rest
    /// of the JSON payload.
    pub fn body_limit_for_image(max_image_bytes: usize) -> usize {
        max_image_bytes.div_ceil(3) * 4 + 64 * 1024
    }
}

/// Resolve the bearer token into an `AuthenticatedUser` request extension.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(EngineError::Unauthorized("missing bearer token".to_string()).into());
    };

    let user = state.engine.authenticate(bearer.token()).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router<ServerState> {
    let public = Router::new()
        .route("/register", post(user::register))
        .route("/login", post(user::login))
        .route("/items", get(items::list_on_sale))
        .route("/items/{id}", get(items::get))
        .route("/items/{id}/image", get(items::image))
        .route("/users/{id}", get(user::profile))
        .route("/users/{id}/items", get(items::list_by_seller))
        .route("/search", get(items::search))
        .route("/categories", get(categories::list));

    let protected = Router::new()
        .route("/items", post(items::item_new))
        .route("/items/{id}", axum::routing::put(items::item_update))
        .route("/sell", post(items::sell))
        .route("/purchase/{id}", post(items::purchase))
        .route("/purchases", get(sales::list))
        .route("/balance", get(balance::get).post(balance::add))
        .route(
            "/favorites/folders",
            get(favorites::list_folders).post(favorites::folder_new),
        )
        .route("/favorites", post(favorites::add))
        .route("/favorites/folders/{id}/items", get(favorites::list_items))
        .route(
            "/favorites/folders/{folder_id}/items/{item_id}",
            delete(favorites::remove),
        )
        .route("/logout", post(user::logout))
        .route_layer(middleware::from_fn_with_state(state, auth));

    public.merge(protected)
}

/// Build the full application router.
pub fn app(engine: Arc<Engine>, options: &ServerOptions) -> Router {
    let state = ServerState { engine };
    router(state.clone())
        .layer(DefaultBodyLimit::max(options.max_body_bytes))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(engine: Engine, options: ServerOptions) {
    let addr = format!("{}:{}", options.bind, options.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, options, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(Arc::new(engine), &options)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, options, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
