//! Activity/audit pipeline. Handlers fire events onto a broadcast bus; a
//! background listener projects them into `activity_log` and appends them to
//! the hash-chained `event_store`. Logging failures never break the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub subject_id: String,
    pub payload: Value,
}

pub type EventBus = broadcast::Sender<Value>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<Value>) {
    broadcast::channel(1024)
}

/// Structured activity payload: current state, optional previous state, and
/// the severity driving retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    #[serde(rename = "new")]
    pub current: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    pub severity: Severity,
}

/// Fire an activity event for an entity mutation. Fire and forget.
pub fn log_activity<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<Uuid>,
    entity: &T,
) {
    log_activity_with_old(event_bus, action, actor_id, entity, None);
}

/// Same as [`log_activity`] with the previous state captured for updates and
/// deletes.
pub fn log_activity_with_old<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<Uuid>,
    entity: &T,
    old_entity: Option<&T>,
) {
    let severity = entity.severity_for_action(action);
    let payload = ActivityPayload {
        current: serde_json::to_value(entity).unwrap_or_default(),
        old: old_entity.map(|e| serde_json::to_value(e).unwrap_or_default()),
        severity,
    };

    let event = DomainEvent {
        id: Uuid::new_v4(),
        name: format!("{}.{}", T::entity_type(), action),
        occurred_at: Utc::now(),
        actor_id,
        subject_id: entity.subject_id(),
        payload: serde_json::to_value(&payload).unwrap_or_default(),
    };

    let _ = event_bus.send(serde_json::to_value(event).unwrap_or_default());
}

pub async fn start_activity_listener(mut rx: broadcast::Receiver<Value>, pool: SqlitePool) {
    tracing::info!("activity listener started");
    while let Ok(event) = rx.recv().await {
        let event_json = event.clone();

        let name = event.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
        let actor_id = event
            .get("actor_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let subject_id = event
            .get("subject_id")
            .and_then(|v| v.as_str())
            .map(String::from);
        let occurred_at = event
            .get("occurred_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let severity = event
            .get("payload")
            .and_then(|p| p.get("severity"))
            .and_then(|s| s.as_str())
            .unwrap_or("important");

        let description = describe(name);

        let result = sqlx::query(
            "INSERT INTO activity_log (id, event_name, description, actor_id, subject_id, occurred_at, properties, severity) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(actor_id)
        .bind(&subject_id)
        .bind(occurred_at)
        .bind(serde_json::to_string(&event_json).unwrap_or_default())
        .bind(severity)
        .execute(&pool)
        .await;

        if let Err(e) = result {
            tracing::error!("failed to save activity log: {}", e);
        }

        if let Err(e) = append_to_event_store(&pool, name, occurred_at, actor_id, subject_id.as_deref(), &event_json, severity).await {
            tracing::error!("failed to append to event store: {}", e);
        }
    }
}

/// Append the event to the tamper-evident store: each row's hash covers the
/// previous row's hash plus its own payload.
async fn append_to_event_store(
    pool: &SqlitePool,
    name: &str,
    occurred_at: DateTime<Utc>,
    actor_id: Option<Uuid>,
    subject_id: Option<&str>,
    payload: &Value,
    severity: &str,
) -> Result<(), sqlx::Error> {
    use sha2::{Digest, Sha256};

    let payload_str = serde_json::to_string(payload).unwrap_or_default();

    let prev_hash: Option<String> =
        sqlx::query_scalar("SELECT hash FROM event_store ORDER BY created_at DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    let mut hasher = Sha256::new();
    if let Some(ref ph) = prev_hash {
        hasher.update(ph.as_bytes());
    }
    hasher.update(payload_str.as_bytes());
    let hash = hex::encode(hasher.finalize());

    sqlx::query(
        "INSERT INTO event_store (id, event_name, occurred_at, actor_id, subject_id, payload, severity, prev_hash, hash) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(occurred_at)
    .bind(actor_id)
    .bind(subject_id)
    .bind(&payload_str)
    .bind(severity)
    .bind(&prev_hash)
    .bind(&hash)
    .execute(pool)
    .await?;

    Ok(())
}

fn describe(event_name: &str) -> &'static str {
    match event_name {
        "role.created" => "Custom role created",
        "role.updated" => "Custom role updated",
        "role.deleted" => "Custom role deleted",
        "workspace.created" => "Workspace created",
        "workspace_member.added" => "Workspace member added",
        "project.created" => "Project created",
        "project_member.added" => "Project member added",
        "user.registered" => "New user registered",
        "user.login" => "User logged in",
        _ => "System event",
    }
}
