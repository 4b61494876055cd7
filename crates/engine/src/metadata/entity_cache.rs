//! Session-scoped cache of entity-type metadata.
//!
//! The cache is loaded at most once per session. Lookups never block: while
//! the cache is empty or loading they simply miss, which binding
//! reconciliation treats as an unresolved entity type.

use action_tester_types::{EntityTypeDescriptor, RecordSet};
use tracing::{debug, info, warn};

use super::binding::EntityTypeLookup;

/// Lifecycle of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntityCacheState {
    #[default]
    Empty,
    Loading,
    Ready(Vec<EntityTypeDescriptor>),
}

/// Entity-type metadata with a single-shot loader guard.
#[derive(Debug, Clone, Default)]
pub struct EntityTypeCache {
    state: EntityCacheState,
}

impl EntityTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EntityCacheState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, EntityCacheState::Ready(_))
    }

    /// Claims the load. Returns `false` when a load is already running or
    /// has completed, in which case the caller must not start another.
    pub fn begin_load(&mut self) -> bool {
        match self.state {
            EntityCacheState::Empty => {
                self.state = EntityCacheState::Loading;
                true
            }
            EntityCacheState::Loading | EntityCacheState::Ready(_) => false,
        }
    }

    /// Publishes the loaded descriptors. Ignored unless a load is running.
    pub fn complete_load(&mut self, descriptors: Vec<EntityTypeDescriptor>) -> usize {
        if !matches!(self.state, EntityCacheState::Loading) {
            warn!("entity type load completed while no load was pending; ignoring");
            return self.descriptors().len();
        }
        let count = descriptors.len();
        self.state = EntityCacheState::Ready(descriptors);
        info!(count, "entity type cache ready");
        count
    }

    /// Returns a failed load to `Empty` so it can be retried.
    pub fn fail_load(&mut self) {
        if matches!(self.state, EntityCacheState::Loading) {
            self.state = EntityCacheState::Empty;
        }
    }

    /// Loaded descriptors; empty until the cache is ready.
    pub fn descriptors(&self) -> &[EntityTypeDescriptor] {
        match &self.state {
            EntityCacheState::Ready(descriptors) => descriptors,
            EntityCacheState::Empty | EntityCacheState::Loading => &[],
        }
    }
}

impl EntityTypeLookup for EntityTypeCache {
    fn find_by_type_code(&self, object_type_code: i32) -> Option<&EntityTypeDescriptor> {
        self.descriptors().find_by_type_code(object_type_code)
    }
}

/// Maps `entity` rows into descriptors, keeping customizable, non-intersect
/// entity types ordered by their display text.
pub fn descriptors_from_records(records: &RecordSet) -> Vec<EntityTypeDescriptor> {
    let mut descriptors: Vec<EntityTypeDescriptor> = records
        .records
        .iter()
        .filter(|row| row.get_bool("iscustomizable") == Some(true) && row.get_bool("isintersect") != Some(true))
        .filter_map(|row| {
            let code = row.get_i64("objecttypecode").and_then(|code| i32::try_from(code).ok());
            let logical_name = row.get_str("logicalname");
            match (code, logical_name) {
                (Some(code), Some(logical_name)) => Some(EntityTypeDescriptor {
                    object_type_code: code,
                    logical_name,
                    display_label: row.get_str("displayname"),
                }),
                _ => {
                    debug!(id = %row.id, "skipping entity row without code or logical name");
                    None
                }
            }
        })
        .collect();
    descriptors.sort_by(|left, right| left.label().cmp(right.label()));
    descriptors
}
