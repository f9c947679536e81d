use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use workboard::{app, db};

#[derive(OpenApi)]
#[openapi(
    paths(
        workboard::routes::auth::register,
        workboard::routes::auth::login,
        workboard::routes::auth::me,
        workboard::routes::health::health,
        workboard::routes::workspaces::create_workspace,
        workboard::routes::workspaces::get_workspace,
        workboard::routes::workspaces::add_workspace_member,
        workboard::routes::roles::list_roles,
        workboard::routes::roles::create_role,
        workboard::routes::roles::update_role,
        workboard::routes::roles::delete_role,
        workboard::routes::roles::reorder_roles,
        workboard::routes::roles::get_default_role,
        workboard::routes::roles::set_default_role,
        workboard::routes::projects::create_project,
        workboard::routes::projects::get_project,
        workboard::routes::projects::add_project_member,
        workboard::routes::projects::my_permissions,
    ),
    components(
        schemas(
            workboard::models::user::User,
            workboard::models::user::AuthResponse,
            workboard::models::user::LoginRequest,
            workboard::models::user::RegisterRequest,
            workboard::models::workspace::Workspace,
            workboard::models::workspace::WorkspaceMember,
            workboard::models::workspace::WorkspaceCreateRequest,
            workboard::models::workspace::WorkspaceAddMemberRequest,
            workboard::models::project::Project,
            workboard::models::project::ProjectCreateRequest,
            workboard::models::project::ProjectAddMemberRequest,
            workboard::models::project::PermissionSummary,
            workboard::models::role::CustomRole,
            workboard::models::role::RoleCreateRequest,
            workboard::models::role::RoleUpdateRequest,
            workboard::models::role::RoleReorderRequest,
            workboard::models::role::DefaultRoleBody,
            workboard::authz::catalog::CapabilitySet,
            workboard::authz::catalog::WorkspaceRole,
            workboard::authz::membership::ProjectMember,
            workboard::authz::membership::MemberList,
            workboard::routes::health::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Workspaces", description = "Workspace and membership management"),
        (name = "Roles", description = "Custom role management"),
        (name = "Projects", description = "Projects and permission queries"),
        (name = "Health", description = "Liveness checks")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let pool = db::init().await?;
    let app = app::create_app(pool).await?;

    let app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
