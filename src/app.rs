use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::jwt::JwtConfig;
use crate::routes::{auth, health, projects, roles, workspaces};
use crate::store::SqliteStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub store: Arc<SqliteStore>,
    pub jwt: Arc<JwtConfig>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, event_bus: EventBus) -> Self {
        Self {
            store: Arc::new(SqliteStore::new(pool.clone())),
            pool,
            jwt: Arc::new(jwt),
            event_bus,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let (event_bus, event_rx) = init_event_bus();
    tokio::spawn(start_activity_listener(event_rx, pool.clone()));

    let state = AppState::new(pool, jwt_config, event_bus);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let workspace_routes = Router::new()
        .route("/", post(workspaces::create_workspace))
        .route("/:id", get(workspaces::get_workspace))
        .route("/:id/members", post(workspaces::add_workspace_member))
        .route("/:id/roles", get(roles::list_roles).post(roles::create_role))
        .route("/:id/roles/reorder", put(roles::reorder_roles))
        .route(
            "/:id/roles/:role_id",
            axum::routing::patch(roles::update_role).delete(roles::delete_role),
        )
        .route(
            "/:id/default-role",
            get(roles::get_default_role).put(roles::set_default_role),
        );

    let project_routes = Router::new()
        .route("/", post(projects::create_project))
        .route("/:id", get(projects::get_project))
        .route("/:id/members", post(projects::add_project_member))
        .route("/:id/permissions", get(projects::my_permissions));

    let router = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/workspaces", workspace_routes)
        .nest("/projects", project_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
