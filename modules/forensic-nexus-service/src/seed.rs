//! Sample records loaded into empty collections, and the canned metric series.

use chrono::Utc;
use forensic_nexus_types::{AuditLog, AuditStatus, Checkpoint, MetricPoint, SemanticMemory};
use serde_json::{Map, Value};

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn metadata(source: &str, classification: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("source".to_string(), Value::from(source));
    map.insert("classification".to_string(), Value::from(classification));
    map
}

pub fn memories() -> Vec<SemanticMemory> {
    let now = now_ms();
    vec![
        SemanticMemory {
            id: "mem-001".to_string(),
            content: "Initial forensic baseline for system Alpha-9.".to_string(),
            vector: vec![0.12, 0.88, -0.45, 0.67],
            metadata: metadata("system-init", "internal"),
            created_at: now - DAY_MS,
        },
        SemanticMemory {
            id: "mem-002".to_string(),
            content: "Detected anomalous login pattern from subnet 192.168.1.0/24.".to_string(),
            vector: vec![0.95, -0.12, 0.33, 0.11],
            metadata: metadata("auth-monitor", "restricted"),
            created_at: now - HOUR_MS,
        },
    ]
}

pub fn checkpoints() -> Vec<Checkpoint> {
    let now = now_ms();
    vec![
        Checkpoint {
            id: "cp-v1.0.0".to_string(),
            name: "Stable Baseline".to_string(),
            description: "First production release state.".to_string(),
            hash: "sha256-8f3e2b1c...".to_string(),
            created_at: now - 2 * DAY_MS,
        },
        Checkpoint {
            id: "cp-v1.0.1".to_string(),
            name: "Post-Audit Patch".to_string(),
            description: "Applied after Q3 security audit.".to_string(),
            hash: "sha256-a9d8f7e6...".to_string(),
            created_at: now - 12 * HOUR_MS,
        },
    ]
}

pub fn audit_logs() -> Vec<AuditLog> {
    let now = now_ms();
    vec![
        AuditLog {
            id: "log-1".to_string(),
            action: "RETRIEVE_MEMORY".to_string(),
            actor: "admin@nexus.io".to_string(),
            resource: "mem-001".to_string(),
            timestamp: now - HOUR_MS / 2,
            status: AuditStatus::Success,
        },
        AuditLog {
            id: "log-2".to_string(),
            action: "CREATE_CHECKPOINT".to_string(),
            actor: "system-bot".to_string(),
            resource: "cp-v1.0.1".to_string(),
            timestamp: now - 12 * HOUR_MS,
            status: AuditStatus::Success,
        },
    ]
}

pub fn metrics() -> Vec<MetricPoint> {
    [
        ("00:00", 120, 45, 2),
        ("04:00", 80, 42, 0),
        ("08:00", 450, 110, 5),
        ("12:00", 980, 165, 12),
        ("16:00", 620, 85, 3),
        ("20:00", 310, 55, 1),
    ]
    .into_iter()
    .map(|(time, requests, latency, errors)| MetricPoint {
        time: time.to_string(),
        requests,
        latency,
        errors,
    })
    .collect()
}
