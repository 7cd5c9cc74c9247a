//! A single constraint violation, emitted by `Constraint::validate`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::constraint::ConstraintType;
use crate::severity::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub constraint_name: String,
    pub constraint_type: ConstraintType,
    pub severity: Severity,
    pub message: String,
    pub person_id: Option<Uuid>,
    pub block_id: Option<Uuid>,
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Contribution to the owning constraint's penalty; `f64::INFINITY`
    /// for any hard-constraint violation.
    pub penalty: f64,
}

impl Violation {
    pub fn new(
        constraint_name: impl Into<String>,
        constraint_type: ConstraintType,
        severity: Severity,
        message: impl Into<String>,
        penalty: f64,
    ) -> Self {
        Self {
            constraint_name: constraint_name.into(),
            constraint_type,
            severity,
            message: message.into(),
            person_id: None,
            block_id: None,
            details: Map::new(),
            penalty,
        }
    }

    pub fn with_person(mut self, person_id: Uuid) -> Self {
        self.person_id = Some(person_id);
        self
    }

    pub fn with_block(mut self, block_id: Uuid) -> Self {
        self.block_id = Some(block_id);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
