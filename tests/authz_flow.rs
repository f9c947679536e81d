//! End-to-end permission resolution: legacy roles, custom roles, the default
//! role for new invitees, stale-role fallback, flat-list migration, and the
//! workspace/project scope split.

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt;
use uuid::Uuid;

use workboard::create_app;

async fn setup() -> Result<(Router, SqlitePool, tempfile::TempDir)> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test_authz.db");

    use sqlx::sqlite::SqliteConnectOptions;
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool.clone()).await?;
    Ok((app, pool, dir))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn register(app: &Router, name: &str, email: &str) -> Result<(String, String)> {
    let (status, body) = call(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": name, "email": email, "password": "password123"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    Ok((
        body["token"].as_str().context("token")?.to_string(),
        body["user"]["id"].as_str().context("user id")?.to_string(),
    ))
}

async fn summary(app: &Router, token: &str, project_id: &str) -> Result<Value> {
    let (status, body) = call(
        app,
        "GET",
        &format!("/projects/{project_id}/permissions"),
        Some(token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "summary failed: {body}");
    Ok(body)
}

#[tokio::test]
async fn permission_resolution_end_to_end() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let (owner, _owner_id) = register(&app, "Owner", "owner@example.com").await?;
    let (admin, admin_id) = register(&app, "Admin", "admin@example.com").await?;
    let (guest, guest_id) = register(&app, "Guest", "guest@example.com").await?;
    let (editor, editor_id) = register(&app, "Editor", "editor@example.com").await?;
    let (reviewer, reviewer_id) = register(&app, "Reviewer", "reviewer@example.com").await?;
    let (stranger, _) = register(&app, "Stranger", "stranger@example.com").await?;

    // Workspace with an admin and a guest; the guest arrives with the legacy
    // alias "viewer", which reads as guest.
    let (_, ws) = call(&app, "POST", "/workspaces", Some(&owner), Some(json!({"name": "Acme"}))).await?;
    let ws_id = ws["id"].as_str().context("ws id")?.to_string();

    for (user_id, role) in [(&admin_id, "admin"), (&guest_id, "viewer")] {
        let (status, _) = call(
            &app,
            "POST",
            &format!("/workspaces/{ws_id}/members"),
            Some(&owner),
            Some(json!({"user_id": user_id, "role": role})),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    // A custom role, made the workspace default for new invitees.
    let (_, custom) = call(
        &app,
        "POST",
        &format!("/workspaces/{ws_id}/roles"),
        Some(&owner),
        Some(json!({
            "name": "Reviewer",
            "color": "#9b59b6",
            "permissions": ["project.read", "issue.update"]
        })),
    )
    .await?;
    let custom_id = custom["id"].as_str().context("custom role id")?.to_string();
    let (status, _) = call(
        &app,
        "PUT",
        &format!("/workspaces/{ws_id}/default-role"),
        Some(&owner),
        Some(json!({"role_id": custom_id.clone()})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // Guests cannot create projects; the owner can.
    let (status, _) = call(&app, "POST", "/projects", Some(&guest), Some(json!({
        "workspace_id": ws_id, "name": "Nope"
    })))
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, project) = call(&app, "POST", "/projects", Some(&owner), Some(json!({
        "workspace_id": ws_id, "name": "Spring Launch"
    })))
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_str().context("project id")?.to_string();

    // Explicit legacy role for one member; the workspace default (the custom
    // role) for the other.
    let members_uri = format!("/projects/{project_id}/members");
    let (status, _) = call(&app, "POST", &members_uri, Some(&owner), Some(json!({
        "user_id": editor_id, "role": "editor"
    })))
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(&app, "POST", &members_uri, Some(&owner), Some(json!({
        "user_id": reviewer_id
    })))
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate adds and owner self-adds are loud conflicts.
    let (status, _) = call(&app, "POST", &members_uri, Some(&owner), Some(json!({
        "user_id": editor_id
    })))
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Owner: both paths fully permitted.
    let s = summary(&app, &owner, &project_id).await?;
    assert_eq!(s["role"], "owner");
    assert_eq!(s["is_owner"], json!(true));
    assert_eq!(s["capabilities"]["delete"], json!(true));
    assert!(s["permissions"].as_array().unwrap().contains(&json!("role.manage")));

    // Editor: legacy matrix, coarse and fine paths agree.
    let s = summary(&app, &editor, &project_id).await?;
    assert_eq!(s["role"], "editor");
    assert_eq!(s["is_owner"], json!(false));
    assert_eq!(s["capabilities"]["edit"], json!(true));
    assert_eq!(s["capabilities"]["delete"], json!(false));
    let perms = s["permissions"].as_array().unwrap().clone();
    assert!(perms.contains(&json!("task.create")));
    assert!(!perms.contains(&json!("project.delete")));

    // Custom-role member: fine-grained permissions verbatim, capability set
    // all-false (the coarse path never consults custom roles).
    let s = summary(&app, &reviewer, &project_id).await?;
    assert_eq!(s["role"], custom_id);
    assert_eq!(s["permissions"], json!(["project.read", "issue.update"]));
    assert_eq!(s["capabilities"]["view"], json!(false));
    assert_eq!(s["capabilities"]["edit"], json!(false));

    // Non-member: resolved to nothing, denied everything, no error.
    let s = summary(&app, &stranger, &project_id).await?;
    assert_eq!(s["role"], Value::Null);
    assert_eq!(s["permissions"], json!([]));

    // Scope split: the workspace admin is not a project member but sees the
    // project through view-all-projects; the guest does not.
    let project_uri = format!("/projects/{project_id}");
    let (status, _) = call(&app, "GET", &project_uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", &project_uri, Some(&guest), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The reviewer's custom role does not grant member.invite.
    let (status, _) = call(&app, "POST", &members_uri, Some(&reviewer), Some(json!({
        "user_id": admin_id
    })))
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Deleting the custom role leaves memberships in place; the stale
    // reference degrades to the viewer permission list, silently.
    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/workspaces/{ws_id}/roles/{custom_id}"),
        Some(&owner),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let s = summary(&app, &reviewer, &project_id).await?;
    assert_eq!(s["role"], custom_id);
    assert_eq!(s["permissions"], json!(["project.read", "comment.create"]));

    // The default-role pointer now references a deleted role: new invitees
    // fall back to legacy editor.
    let (newbie, newbie_id) = register(&app, "Newbie", "newbie@example.com").await?;
    let (status, _) = call(&app, "POST", &members_uri, Some(&owner), Some(json!({
        "user_id": newbie_id
    })))
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let s = summary(&app, &newbie, &project_id).await?;
    assert_eq!(s["role"], "editor");

    Ok(())
}

#[tokio::test]
async fn flat_member_list_resolves_and_migrates() -> Result<()> {
    let (app, pool, _dir) = setup().await?;

    let (owner, owner_id) = register(&app, "Owner", "owner@example.com").await?;
    let (flat_member, flat_member_id) = register(&app, "Flat", "flat@example.com").await?;
    let (invitee, invitee_id) = register(&app, "Invitee", "invitee@example.com").await?;

    let (_, ws) = call(&app, "POST", "/workspaces", Some(&owner), Some(json!({"name": "Acme"}))).await?;
    let ws_id = ws["id"].as_str().context("ws id")?.to_string();

    // A pre-migration project row: the members column is a flat id array that
    // (incorrectly) also contains the owner.
    let project_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO projects (id, workspace_id, owner_id, name, description, members, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(project_id)
    .bind(&ws_id)
    .bind(&owner_id)
    .bind("Legacy Project")
    .bind(Option::<String>::None)
    .bind(json!([flat_member_id, owner_id]).to_string())
    .bind(now)
    .bind(now)
    .execute(&pool)
    .await?;

    // A flat entry resolves to the historical editor default; the owner entry
    // in the list is ignored.
    let s = summary(&app, &flat_member, &project_id.to_string()).await?;
    assert_eq!(s["role"], "editor");
    assert_eq!(s["capabilities"]["edit"], json!(true));

    let s = summary(&app, &owner, &project_id.to_string()).await?;
    assert_eq!(s["role"], "owner");
    assert_eq!(s["is_owner"], json!(true));

    // Adding a member writes the normalized structured list back.
    let (status, _) = call(
        &app,
        "POST",
        &format!("/projects/{project_id}/members"),
        Some(&owner),
        Some(json!({"user_id": invitee_id, "role": "viewer"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let stored: String = sqlx::query_scalar("SELECT members FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_one(&pool)
        .await?;
    let stored: Value = serde_json::from_str(&stored)?;
    let records = stored.as_array().context("structured members")?;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.is_object()), "expected structured records: {stored}");
    assert!(!records.iter().any(|r| r["user_id"] == json!(owner_id.clone())));

    let flat_record = records
        .iter()
        .find(|r| r["user_id"] == json!(flat_member_id.clone()))
        .context("flat member record")?;
    assert_eq!(flat_record["role"], "editor");
    assert_eq!(flat_record["invited_by"], json!(owner_id));

    // The flat member's resolution is unchanged after migration.
    let s = summary(&app, &flat_member, &project_id.to_string()).await?;
    assert_eq!(s["role"], "editor");

    Ok(())
}
