//! Student Entity
//!
//! The single resource served by the API, plus its flat cache representation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A persisted student record.
///
/// The Store assigns `id` on creation and never changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i64,
}

/// Field values for an insert or a full-row update.
///
/// Only ever built from a validated payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl Student {
    // == Constructor ==
    /// Attaches a store-assigned id to validated field values.
    pub fn from_new(id: i64, new: NewStudent) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            age: new.age,
        }
    }

    // == Cache Encoding ==
    /// Flattens the record into the field/value pairs stored under `student:<id>`.
    pub fn to_cache_fields(&self) -> Vec<(String, String)> {
        vec![
            ("id".to_string(), self.id.to_string()),
            ("name".to_string(), self.name.clone()),
            ("email".to_string(), self.email.clone()),
            ("age".to_string(), self.age.to_string()),
        ]
    }

    /// Rebuilds a record from a cached hash.
    ///
    /// Returns `None` when any field is missing or unparsable, so a partial or
    /// foreign hash is treated as a miss rather than as a zero-valued student.
    pub fn from_cache_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let id = fields.get("id")?.parse().ok()?;
        let age = fields.get("age")?.parse().ok()?;
        Some(Self {
            id,
            name: fields.get("name")?.clone(),
            email: fields.get("email")?.clone(),
            age,
        })
    }
}
