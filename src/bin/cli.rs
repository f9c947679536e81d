use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use workboard::authz::permissions;
use workboard::authz::roles::RoleCatalog;
use workboard::models::role::RoleCreateRequest;
use workboard::models::workspace::Workspace;
use workboard::store::SqliteStore;
use workboard::utils::hash_password;

#[derive(Parser, Debug)]
#[command(author, version, about = "workboard admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Seed a demo user plus a workspace with custom roles
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may
    // differ, so fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator
                .undo(&pool, 1)
                .await
                .context("no migrations were rolled back")?;
            println!("Rolled back last migration");
        }
        Commands::Seed => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            seed(&pool).await?;
        }
    }

    Ok(())
}

async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
    let now = Utc::now();
    let user_id = Uuid::new_v4();
    let password_hash = hash_password("demo-password")?;

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind("Demo Owner")
    .bind("demo@workboard.dev")
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let store = SqliteStore::new(pool.clone());
    let workspace = Workspace {
        id: Uuid::new_v4(),
        name: "Demo Workspace".into(),
        owner_id: user_id,
        members: Vec::new(),
        custom_roles: Vec::new(),
        default_role_id: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_workspace(&workspace).await?;

    let catalog = RoleCatalog::new(&store);
    let writer = catalog
        .create(
            workspace.id,
            RoleCreateRequest {
                name: "Campaign Writer".into(),
                color: "#e67e22".into(),
                permissions: vec![
                    permissions::PROJECT_READ.into(),
                    permissions::TASK_CREATE.into(),
                    permissions::IDEA_CREATE.into(),
                    permissions::COMMENT_CREATE.into(),
                ],
            },
        )
        .await?;

    catalog
        .create(
            workspace.id,
            RoleCreateRequest {
                name: "Reviewer".into(),
                color: "#9b59b6".into(),
                permissions: vec![
                    permissions::PROJECT_READ.into(),
                    permissions::ISSUE_UPDATE.into(),
                    permissions::COMMENT_CREATE.into(),
                ],
            },
        )
        .await?;

    catalog
        .set_default_role_id(workspace.id, Some(&writer.id))
        .await?;

    println!("Seeded demo data:");
    println!("  user       demo@workboard.dev / demo-password");
    println!("  workspace  {}", workspace.id);
    println!("  default role {}", writer.id);

    Ok(())
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y_%m_%d_%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let db_applied = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter()
            .filter_map(|row| row.try_get::<i64, _>("version").ok())
            .collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let applied = applied_versions.contains(&version);
        let status = if applied { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if !desc.is_empty() { desc } else { "unknown" };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations (repo root); fall back to the crate-local folder
    // when the CWD differs (containers).
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
