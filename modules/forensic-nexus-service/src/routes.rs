//! Axum route handlers for the forensic nexus JSON API.

use crate::config::ServiceConfig;
use crate::db::Db;
use crate::entities::{AuditLogEntity, CheckpointEntity, MemoryEntity};
use crate::entity::MAX_PAGE_SIZE;
use crate::error::StoreError;
use crate::search::DEFAULT_SEARCH_LIMIT;
use crate::seed;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use forensic_nexus_types::*;
use rand::Rng;
use serde::Serialize;
use serde_json::Map;
use std::sync::Arc;
use std::time::Instant;

/// Percent; the service does not measure real memory usage.
const REPORTED_MEMORY_USAGE: f64 = 42.5;
const MAX_CHECKPOINT_ID_ATTEMPTS: usize = 16;

pub struct AppState {
    pub db: Arc<Db>,
    pub start_time: Instant,
    pub config: ServiceConfig,
}

impl AppState {
    pub fn new(db: Arc<Db>, config: ServiceConfig) -> Self {
        Self {
            db,
            start_time: Instant::now(),
            config,
        }
    }

    fn memories(&self) -> MemoryEntity {
        MemoryEntity::new(self.db.clone())
    }

    fn checkpoints(&self) -> CheckpointEntity {
        CheckpointEntity::new(self.db.clone())
    }

    fn audit_logs(&self) -> AuditLogEntity {
        AuditLogEntity::new(self.db.clone())
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T: Serialize>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

fn bad_request<T: Serialize>(msg: impl Into<String>) -> Reply<T> {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::err(msg)))
}

fn store_failure<T: Serialize>(e: StoreError) -> Reply<T> {
    let status = e.status_code();
    if status.is_server_error() {
        log::error!("Store operation failed: {}", e);
    }
    (status, Json(ApiResponse::err(e.to_string())))
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Newest-first by `key` over a page that is already latest-indexed first.
/// The sort is stable, so equal keys keep the later-indexed record first.
fn sort_newest_first<T>(items: &mut [T], key: impl Fn(&T) -> i64) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

// =====================================================
// Health
// =====================================================

// GET /api/health/extended
pub async fn health_extended(State(state): State<Arc<AppState>>) -> Reply<ExtendedHealth> {
    let api_latency = rand::thread_rng().gen_range(10..60);
    ok(ExtendedHealth {
        status: HealthStatus::Healthy,
        uptime: state.start_time.elapsed().as_secs(),
        api_latency,
        memory_usage: REPORTED_MEMORY_USAGE,
        timestamp: Utc::now().to_rfc3339(),
        metrics: seed::metrics(),
    })
}

// =====================================================
// Semantic Memory
// =====================================================

// GET /api/memory
pub async fn memory_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Reply<Page<SemanticMemory>> {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let memories = state.memories();
    if let Err(e) = memories.ensure_seed() {
        return store_failure(e);
    }
    let page_size = query.limit.unwrap_or(state.config.page_size);
    match memories.list(query.cursor.as_deref(), page_size) {
        Ok(page) => ok(page),
        Err(e) => store_failure(e),
    }
}

// POST /api/memory
pub async fn memory_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateMemoryRequest>, JsonRejection>,
) -> Reply<SemanticMemory> {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let content = match req.content {
        Some(c) if !c.is_empty() => c,
        _ => return bad_request("content required"),
    };

    let vector = req.vector.unwrap_or_else(|| {
        let mut rng = rand::thread_rng();
        (0..4).map(|_| rng.gen_range(0.0..1.0)).collect()
    });
    let memory = SemanticMemory {
        id: uuid::Uuid::new_v4().to_string(),
        content,
        vector,
        metadata: req.metadata.unwrap_or_else(Map::new),
        created_at: now_ms(),
    };

    match state.memories().create(memory) {
        Ok(m) => ok(m),
        Err(e) => store_failure(e),
    }
}

// GET /api/memory/:id
pub async fn memory_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<SemanticMemory> {
    match state.memories().get(&id) {
        Ok(m) => ok(m),
        Err(e) => store_failure(e),
    }
}

// POST /api/memory/retrieve
pub async fn memory_retrieve(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RetrieveMemoryRequest>, JsonRejection>,
) -> Reply<Vec<SemanticMemory>> {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let Some(vector) = req.vector else {
        return bad_request("valid query vector required");
    };
    let limit = req.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    match state.memories().search(&vector, limit) {
        Ok(results) => ok(results),
        Err(e) => store_failure(e),
    }
}

// =====================================================
// Checkpoints
// =====================================================

// GET /api/checkpoints
pub async fn checkpoints_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Reply<Page<Checkpoint>> {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let checkpoints = state.checkpoints();
    if let Err(e) = checkpoints.ensure_seed() {
        return store_failure(e);
    }
    let page_size = query.limit.unwrap_or(MAX_PAGE_SIZE);
    match checkpoints.list_latest_first(query.cursor.as_deref(), page_size) {
        Ok(mut page) => {
            sort_newest_first(&mut page.items, |c| c.created_at);
            ok(page)
        }
        Err(e) => store_failure(e),
    }
}

// POST /api/checkpoints
pub async fn checkpoint_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCheckpointRequest>, JsonRejection>,
) -> Reply<Checkpoint> {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let name = match req.name {
        Some(n) if !n.is_empty() => n,
        _ => return bad_request("name required"),
    };
    let description = req.description.unwrap_or_default();

    match allocate_checkpoint(&state.checkpoints(), &name, &description, now_ms()) {
        Ok(cp) => {
            log::info!("Created checkpoint {} ({})", cp.id, cp.name);
            ok(cp)
        }
        Err(e) => store_failure(e),
    }
}

/// Store a checkpoint under `cp-<created_at>`. Ids come from the clock, so
/// checkpoints created in the same millisecond get a `-<n>` suffix.
fn allocate_checkpoint(
    checkpoints: &CheckpointEntity,
    name: &str,
    description: &str,
    created_at: i64,
) -> Result<Checkpoint, StoreError> {
    let base_id = format!("cp-{}", created_at);
    for attempt in 0..MAX_CHECKPOINT_ID_ATTEMPTS {
        let id = if attempt == 0 {
            base_id.clone()
        } else {
            format!("{}-{}", base_id, attempt)
        };
        let checkpoint = Checkpoint {
            id,
            name: name.to_string(),
            description: description.to_string(),
            hash: uuid::Uuid::new_v4().simple().to_string(),
            created_at,
        };
        match checkpoints.create(checkpoint) {
            Err(StoreError::Duplicate { .. }) => continue,
            result => return result,
        }
    }

    Err(StoreError::Duplicate {
        entity: "checkpoint",
        id: base_id,
    })
}

// GET /api/checkpoints/:id
pub async fn checkpoint_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<Checkpoint> {
    match state.checkpoints().get(&id) {
        Ok(cp) => ok(cp),
        Err(e) => store_failure(e),
    }
}

// POST /api/checkpoints/rollback
//
// Acknowledges the request only; no checkpoint or record is touched.
pub async fn checkpoint_rollback(
    payload: Result<Json<RollbackRequest>, JsonRejection>,
) -> Reply<RollbackReceipt> {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let id = match req.id {
        Some(id) if !id.is_empty() => id,
        _ => return bad_request("checkpoint id required"),
    };

    log::info!("Rollback acknowledged for checkpoint {}", id);
    ok(RollbackReceipt {
        restored_id: id,
        status: RECOVERY_COMPLETE.to_string(),
        timestamp: now_ms(),
    })
}

// =====================================================
// Audit Logs
// =====================================================

// GET /api/logs
pub async fn logs_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Reply<Page<AuditLog>> {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let logs = state.audit_logs();
    if let Err(e) = logs.ensure_seed() {
        return store_failure(e);
    }
    let page_size = query.limit.unwrap_or(MAX_PAGE_SIZE);
    match logs.list_latest_first(query.cursor.as_deref(), page_size) {
        Ok(mut page) => {
            sort_newest_first(&mut page.items, |l| l.timestamp);
            ok(page)
        }
        Err(e) => store_failure(e),
    }
}
