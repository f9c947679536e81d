use serde::{Deserialize, Serialize};

/// Severity levels for activity logs. Controls retention policies and log
/// filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Critical events: long-term retention, never auto-delete.
    Critical,
    /// Important events: medium-term retention (default).
    #[default]
    Important,
    /// Noise events: aggressively trimmed.
    Noise,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Important => "important",
            Severity::Noise => "noise",
        }
    }
}

/// Entities that flow through the activity log. Authorization entities
/// (roles, memberships) log at Critical; everything else defaults to
/// Important.
pub trait Loggable: Serialize + Send + Sync {
    /// Entity type name, the prefix in event names like "role.created".
    fn entity_type() -> &'static str;

    /// The subject id. Custom roles carry string ids, everything else a uuid
    /// rendered to string.
    fn subject_id(&self) -> String;

    fn severity(&self) -> Severity {
        Severity::Important
    }

    /// Deletion is always Critical regardless of the entity's base severity.
    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "deleted" => Severity::Critical,
            _ => self.severity(),
        }
    }
}
