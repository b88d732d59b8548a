//! Declared schema: entity kind → table → typed attributes
//!
//! Writes are checked against the schema before they reach a backend, so a
//! store never holds an attribute it was not told about.

use serde::Serialize;

use super::{Result, StoreError};
use crate::models::{EntityKey, EntityKind, Value, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSchema {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

impl AttributeSchema {
    pub const fn new(name: &'static str, ty: ValueType) -> Self {
        Self { name, ty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSchema {
    pub kind: EntityKind,
    pub table: &'static str,
    pub attributes: Vec<AttributeSchema>,
}

impl RecordSchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub records: Vec<RecordSchema>,
}

impl Schema {
    /// The schema gitwalk writes
    pub fn gitwalk() -> Self {
        use ValueType::*;

        Self {
            records: vec![
                RecordSchema {
                    kind: EntityKind::Repository,
                    table: "repositories",
                    attributes: vec![AttributeSchema::new("path", Text)],
                },
                RecordSchema {
                    kind: EntityKind::Branch,
                    table: "branches",
                    attributes: vec![
                        AttributeSchema::new("name", Text),
                        AttributeSchema::new("head", Text),
                    ],
                },
                RecordSchema {
                    kind: EntityKind::Commit,
                    table: "commits",
                    attributes: vec![
                        AttributeSchema::new("hash", Text),
                        AttributeSchema::new("email", Text),
                        AttributeSchema::new("message", Text),
                        AttributeSchema::new("created_at", Timestamp),
                        AttributeSchema::new("parent_count", Integer),
                    ],
                },
                RecordSchema {
                    kind: EntityKind::User,
                    table: "users",
                    attributes: vec![
                        AttributeSchema::new("name", Text),
                        AttributeSchema::new("email", Text),
                    ],
                },
            ],
        }
    }

    pub fn record(&self, kind: EntityKind) -> Result<&RecordSchema> {
        self.records
            .iter()
            .find(|r| r.kind == kind)
            .ok_or(StoreError::UndeclaredKind(kind))
    }

    /// Check every attribute of a write; nothing is applied if any fails.
    pub fn validate(&self, key: &EntityKey, attributes: &[(&str, Value)]) -> Result<&RecordSchema> {
        let record = self.record(key.kind)?;
        for (name, value) in attributes {
            let declared = record
                .attribute(name)
                .ok_or_else(|| StoreError::UnknownAttribute {
                    kind: key.kind,
                    attribute: name.to_string(),
                })?;
            if declared.ty != value.value_type() {
                return Err(StoreError::TypeMismatch {
                    kind: key.kind,
                    attribute: name.to_string(),
                    expected: declared.ty,
                    actual: value.value_type(),
                });
            }
        }
        Ok(record)
    }

    /// Stable textual form, stored by the durable backend on first use
    pub fn fingerprint(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::gitwalk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_every_kind_is_declared() {
        let schema = Schema::gitwalk();
        for kind in EntityKind::ALL {
            assert!(schema.record(kind).is_ok(), "{kind} missing");
        }
        assert_eq!(schema.record(EntityKind::Commit).unwrap().table, "commits");
    }

    #[test]
    fn test_validate_accepts_declared_attributes() {
        let schema = Schema::gitwalk();
        let key = EntityKey::commit("abc");
        let attrs = [
            ("hash", Value::from("abc")),
            ("created_at", Value::from(Utc::now())),
            ("parent_count", Value::from(1i64)),
        ];
        assert!(schema.validate(&key, &attrs).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_attribute() {
        let schema = Schema::gitwalk();
        let err = schema
            .validate(&EntityKey::user("a@b"), &[("age", Value::from(3i64))])
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownAttribute { .. }));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let schema = Schema::gitwalk();
        let err = schema
            .validate(&EntityKey::commit("abc"), &[("created_at", Value::from("yesterday"))])
            .unwrap_err();
        match err {
            StoreError::TypeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, ValueType::Timestamp);
                assert_eq!(actual, ValueType::Text);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(
            Schema::gitwalk().fingerprint().unwrap(),
            Schema::gitwalk().fingerprint().unwrap()
        );
    }
}
