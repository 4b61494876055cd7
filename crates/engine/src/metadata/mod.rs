//! Action metadata discovery and decoration.
//!
//! Modules:
//! - `queries`: relational queries for actions, parameters, solutions and entity types
//! - `type_resolver`: short type labels from parser/formatter identifiers
//! - `binding`: folding of bound/unbound sibling parameter rows
//! - `entity_cache`: session-scoped entity-type metadata

pub mod binding;
pub mod entity_cache;
pub mod queries;
pub mod type_resolver;

use action_tester_types::{ParameterDirection, ParameterRecord, ParameterSet, RecordSet};
use tracing::{debug, warn};

pub use binding::{EntityTypeLookup, ReconcileSummary, parse_object_type_code, reconcile_bindings};
pub use entity_cache::{EntityCacheState, EntityTypeCache, descriptors_from_records};
pub use type_resolver::{resolve_types, short_type_name};

/// Builds a decorated parameter set from raw field rows.
///
/// Rows that cannot be mapped are dropped with a warning. The remaining
/// records get their type labels first and are then reconciled against the
/// entity types known to `entities`.
pub fn build_parameter_set<L>(direction: ParameterDirection, rows: &RecordSet, entities: &L) -> ParameterSet
where
    L: EntityTypeLookup + ?Sized,
{
    let records = rows
        .records
        .iter()
        .filter_map(|row| match ParameterRecord::from_metadata(direction, row) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(%error, "dropping parameter row");
                None
            }
        })
        .collect();

    let mut parameters = ParameterSet::new(direction, records);
    resolve_types(&mut parameters);
    let summary = reconcile_bindings(&mut parameters, entities);
    debug!(
        ?direction,
        count = parameters.len(),
        merged = summary.merged,
        resolved = summary.resolved,
        "parameter set prepared"
    );
    parameters
}
