//! Concrete entity collections: semantic memories, checkpoints and audit logs.

use crate::entity::{Entity, IndexedEntity};
use crate::error::StoreError;
use crate::search;
use crate::seed;
use forensic_nexus_types::{AuditLog, Checkpoint, SemanticMemory};

pub type MemoryEntity = IndexedEntity<SemanticMemory>;
pub type CheckpointEntity = IndexedEntity<Checkpoint>;
pub type AuditLogEntity = IndexedEntity<AuditLog>;

impl Entity for SemanticMemory {
    const ENTITY_NAME: &'static str = "memory";
    const INDEX_NAME: &'static str = "memories";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed_data() -> Vec<Self> {
        seed::memories()
    }
}

impl Entity for Checkpoint {
    const ENTITY_NAME: &'static str = "checkpoint";
    const INDEX_NAME: &'static str = "checkpoints";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed_data() -> Vec<Self> {
        seed::checkpoints()
    }
}

impl Entity for AuditLog {
    const ENTITY_NAME: &'static str = "audit_log";
    const INDEX_NAME: &'static str = "audit_logs";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed_data() -> Vec<Self> {
        seed::audit_logs()
    }
}

impl IndexedEntity<SemanticMemory> {
    /// Rank every stored memory against `query` by dot product.
    pub fn search(&self, query: &[f64], limit: usize) -> Result<Vec<SemanticMemory>, StoreError> {
        let all = self.list_all()?;
        Ok(search::rank_by_dot_product(all, query, limit, |m| {
            m.vector.as_slice()
        }))
    }
}
