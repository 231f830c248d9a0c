//! Operation Context
//!
//! Contains metadata about the current operation for audit and tracing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for an operation, used for auditing and tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Name of the API key used for this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_name: Option<String>,

    /// Operator from the X-Operator header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            api_key_name: None,
            operator: None,
            correlation_id: None,
        }
    }

    /// Create context with API key name
    pub fn with_api_key(mut self, name: impl Into<String>) -> Self {
        self.api_key_name = Some(name.into());
        self
    }

    /// Create context with operator name
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Who closed the drawer: the operator if given, else the API key name.
    pub fn actor(&self) -> String {
        self.operator
            .clone()
            .or_else(|| self.api_key_name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}
