//! The polymorphic role value stored in project membership records.
//!
//! Membership documents persist the role as a bare string: either one of the
//! three legacy literals or a custom-role id. Classification happens exactly
//! once, here, instead of ad hoc string comparisons at call sites.

use std::fmt;

use serde::de::{Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::catalog::LegacyRole;

/// A membership role value: a legacy literal or a reference to a
/// workspace-scoped custom role. On the wire and in storage this is a bare
/// string; call sites carrying one in a request/response body override the
/// schema type to `String`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleValue {
    Legacy(LegacyRole),
    Custom(String),
}

impl RoleValue {
    /// Classify a stored role string: legacy literal check first, anything
    /// else is treated as a custom-role id.
    pub fn classify(value: &str) -> Self {
        match LegacyRole::parse(value) {
            Some(role) => RoleValue::Legacy(role),
            None => RoleValue::Custom(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoleValue::Legacy(role) => role.as_str(),
            RoleValue::Custom(id) => id,
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, RoleValue::Legacy(LegacyRole::Owner))
    }
}

impl From<LegacyRole> for RoleValue {
    fn from(role: LegacyRole) -> Self {
        RoleValue::Legacy(role)
    }
}

impl fmt::Display for RoleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RoleValueVisitor;

        impl Visitor<'_> for RoleValueVisitor {
            type Value = RoleValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a role literal or custom role id string")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<RoleValue, E> {
                Ok(RoleValue::classify(value))
            }
        }

        deserializer.deserialize_str(RoleValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_legacy_literals() {
        assert_eq!(RoleValue::classify("owner"), RoleValue::Legacy(LegacyRole::Owner));
        assert_eq!(RoleValue::classify("editor"), RoleValue::Legacy(LegacyRole::Editor));
        assert_eq!(RoleValue::classify("viewer"), RoleValue::Legacy(LegacyRole::Viewer));
    }

    #[test]
    fn anything_else_is_a_custom_role_id() {
        assert_eq!(
            RoleValue::classify("role_1712131415_ab12cd34"),
            RoleValue::Custom("role_1712131415_ab12cd34".to_string())
        );
        // Case matters for literals; a capitalized value is an id.
        assert_eq!(
            RoleValue::classify("Owner"),
            RoleValue::Custom("Owner".to_string())
        );
    }

    #[test]
    fn round_trips_as_a_bare_string() {
        let legacy: RoleValue = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(legacy, RoleValue::Legacy(LegacyRole::Viewer));
        assert_eq!(serde_json::to_string(&legacy).unwrap(), "\"viewer\"");

        let custom: RoleValue = serde_json::from_str("\"role_99_zz\"").unwrap();
        assert_eq!(custom, RoleValue::Custom("role_99_zz".to_string()));
        assert_eq!(serde_json::to_string(&custom).unwrap(), "\"role_99_zz\"");
    }
}
