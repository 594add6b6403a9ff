//! Shared types for the forensic nexus service and its HTTP clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =====================================================
// Domain Types
// =====================================================

/// A stored semantic memory with its embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticMemory {
    pub id: String,
    pub content: String,
    pub vector: Vec<f64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Epoch milliseconds
    pub created_at: i64,
}

/// A named system-state checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub hash: String,
    /// Epoch milliseconds
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}

/// One append-only audit trail entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    pub action: String,
    pub actor: String,
    pub resource: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub status: AuditStatus,
}

/// One bucket of the request/latency/error time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub time: String,
    pub requests: u64,
    pub latency: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedHealth {
    pub status: HealthStatus,
    /// Seconds since the service started
    pub uptime: u64,
    pub api_latency: u64,
    pub memory_usage: f64,
    /// RFC 3339
    pub timestamp: String,
    pub metrics: Vec<MetricPoint>,
}

// =====================================================
// Listing
// =====================================================

/// One page of an indexed collection. `cursor` is `null` once exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

// =====================================================
// Request Types
// =====================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateMemoryRequest {
    pub content: Option<String>,
    pub vector: Option<Vec<f64>>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RetrieveMemoryRequest {
    pub vector: Option<Vec<f64>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateCheckpointRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub id: Option<String>,
}

// =====================================================
// Response Types
// =====================================================

pub const RECOVERY_COMPLETE: &str = "RECOVERY_COMPLETE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackReceipt {
    pub restored_id: String,
    pub status: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
