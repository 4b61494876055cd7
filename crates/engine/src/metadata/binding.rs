//! Folding of bound/unbound sibling parameter rows.
//!
//! The platform describes "parameter X is bound to entity type Y" as two rows
//! with the same name: a generic one and one carrying `OTC:<code>` binding
//! information. Reconciliation keeps the bound row, fills in whatever it lacks
//! from the generic sibling, decorates it with the entity type, and drops the
//! sibling.
//!
//! The work runs in two passes so that lookups by name never observe a
//! partially pruned set: the first pass only reads and collects matches, the
//! second applies decorations and removes siblings by descending index.

use action_tester_types::{EntityTypeDescriptor, ParameterRecord, ParameterSet};
use tracing::debug;

const OBJECT_TYPE_CODE_PREFIX: &str = "OTC:";

/// Read access to entity-type metadata keyed by object type code.
pub trait EntityTypeLookup {
    fn find_by_type_code(&self, object_type_code: i32) -> Option<&EntityTypeDescriptor>;
}

impl EntityTypeLookup for [EntityTypeDescriptor] {
    fn find_by_type_code(&self, object_type_code: i32) -> Option<&EntityTypeDescriptor> {
        self.iter().find(|descriptor| descriptor.object_type_code == object_type_code)
    }
}

impl EntityTypeLookup for Vec<EntityTypeDescriptor> {
    fn find_by_type_code(&self, object_type_code: i32) -> Option<&EntityTypeDescriptor> {
        self.as_slice().find_by_type_code(object_type_code)
    }
}

/// Parses the object type code out of `OTC:<code>` binding information.
pub fn parse_object_type_code(binding_info: &str) -> Option<i32> {
    binding_info.replace(OBJECT_TYPE_CODE_PREFIX, "").trim().parse().ok()
}

/// Counts reported by [`reconcile_bindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    /// Sibling rows removed.
    pub merged: usize,
    /// Bound rows decorated with an entity type.
    pub resolved: usize,
}

#[derive(Debug)]
struct BindingMatch {
    bound: usize,
    sibling: usize,
    entity: Option<EntityTypeDescriptor>,
}

/// Merges every bound record with its unbound sibling of the same name.
///
/// Fields the bound record leaves empty (required flag, parser, formatter,
/// base type label, field mask, public name) are taken from the sibling.
/// Bound records without a sibling are left alone. Unparsable or unknown
/// object type codes still fold and remove the sibling but leave the bound
/// record's `bound_entity` unset.
pub fn reconcile_bindings<L>(parameters: &mut ParameterSet, entities: &L) -> ReconcileSummary
where
    L: EntityTypeLookup + ?Sized,
{
    let matches = collect_matches(parameters, entities);

    let mut summary = ReconcileSummary::default();
    let mut siblings = Vec::with_capacity(matches.len());
    for binding in matches {
        let sibling = parameters.records[binding.sibling].clone();
        let record = &mut parameters.records[binding.bound];
        fold_sibling(record, sibling);
        if let Some(entity) = binding.entity {
            record.resolved_type = Some(match record.resolved_type.take() {
                Some(base) => format!("{base} {}", entity.label()),
                None => entity.label().to_string(),
            });
            record.bound_entity = Some(entity);
            summary.resolved += 1;
        }
        siblings.push(binding.sibling);
    }

    siblings.sort_unstable();
    siblings.dedup();
    for index in siblings.into_iter().rev() {
        parameters.records.remove(index);
        summary.merged += 1;
    }
    summary
}

fn fold_sibling(record: &mut ParameterRecord, sibling: ParameterRecord) {
    record.optional = record.optional.or(sibling.optional);
    record.parser = record.parser.take().or(sibling.parser);
    record.formatter = record.formatter.take().or(sibling.formatter);
    record.resolved_type = record.resolved_type.take().or(sibling.resolved_type);
    record.field_mask = record.field_mask.or(sibling.field_mask);
    record.public_name = record.public_name.take().or(sibling.public_name);
}

fn collect_matches<L>(parameters: &ParameterSet, entities: &L) -> Vec<BindingMatch>
where
    L: EntityTypeLookup + ?Sized,
{
    let records = &parameters.records;
    let mut matches = Vec::new();
    for (bound, record) in records.iter().enumerate() {
        let Some(binding_info) = record.binding_info.as_deref().filter(|_| record.is_bound()) else {
            continue;
        };
        let Some(sibling) = records
            .iter()
            .position(|candidate| candidate.name == record.name && !candidate.is_bound())
        else {
            continue;
        };

        let entity = match parse_object_type_code(binding_info) {
            Some(code) => {
                let found = entities.find_by_type_code(code).cloned();
                if found.is_none() {
                    debug!(parameter = %record.name, object_type_code = code, "binding refers to an unknown entity type");
                }
                found
            }
            None => {
                debug!(parameter = %record.name, binding = %binding_info, "unparsable binding information");
                None
            }
        };
        matches.push(BindingMatch { bound, sibling, entity });
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_tester_types::{ActionSummary, ParameterDirection};

    use crate::{
        execution::{AssemblyError, assemble_request, is_ready_to_execute},
        metadata::resolve_types,
    };

    fn request_set(records: Vec<ParameterRecord>) -> ParameterSet {
        ParameterSet::new(ParameterDirection::Request, records)
    }

    fn account() -> Vec<EntityTypeDescriptor> {
        vec![EntityTypeDescriptor::new(1, "account")]
    }

    #[test]
    fn bound_row_absorbs_its_sibling() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target").with_optional(false),
            ParameterRecord::new("Target").with_binding("OTC: 1"),
        ]);
        parameters.records[1].resolved_type = Some("EntityReference".into());

        let summary = reconcile_bindings(&mut parameters, &account());

        assert_eq!(summary, ReconcileSummary { merged: 1, resolved: 1 });
        assert_eq!(parameters.len(), 1);
        let survivor = &parameters.records[0];
        assert!(survivor.is_bound());
        assert_eq!(survivor.resolved_type.as_deref(), Some("EntityReference account"));
        assert_eq!(survivor.bound_entity.as_ref().map(|entity| entity.object_type_code), Some(1));
    }

    #[test]
    fn required_flag_survives_the_merge() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target").with_optional(false),
            ParameterRecord::new("Target").with_binding("OTC: 1"),
        ]);
        let action = ActionSummary {
            id: "wf-1".into(),
            name: "Approve".into(),
            ..ActionSummary::default()
        };

        reconcile_bindings(&mut parameters, &account());

        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters.records[0].optional, Some(false));
        assert!(!is_ready_to_execute(Some(&action), Some(&parameters)));
        assert_eq!(
            assemble_request("new_Approve", &parameters),
            Err(AssemblyError::missing("Target"))
        );
    }

    #[test]
    fn bound_row_inherits_sibling_type_details() {
        let mut sibling = ParameterRecord::new("Target")
            .with_optional(true)
            .with_parser("EntityReference");
        sibling.field_mask = Some(3);
        sibling.public_name = Some("TargetRecord".into());
        let mut parameters = request_set(vec![sibling, ParameterRecord::new("Target").with_binding("OTC:1")]);
        resolve_types(&mut parameters);

        reconcile_bindings(&mut parameters, &account());

        let survivor = &parameters.records[0];
        assert_eq!(survivor.resolved_type.as_deref(), Some("EntityReference account"));
        assert_eq!(survivor.parser.as_deref(), Some("EntityReference"));
        assert_eq!(survivor.optional, Some(true));
        assert_eq!(survivor.field_mask, Some(3));
        assert_eq!(survivor.public_name.as_deref(), Some("TargetRecord"));
    }

    #[test]
    fn bound_row_keeps_its_own_fields() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target").with_optional(true).with_parser("String"),
            ParameterRecord::new("Target")
                .with_binding("OTC:1")
                .with_optional(false)
                .with_parser("EntityReference"),
        ]);

        reconcile_bindings(&mut parameters, &account());

        let survivor = &parameters.records[0];
        assert_eq!(survivor.optional, Some(false));
        assert_eq!(survivor.parser.as_deref(), Some("EntityReference"));
    }

    #[test]
    fn display_label_wins_over_logical_name() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target"),
            ParameterRecord::new("Target").with_binding("OTC:1"),
        ]);
        parameters.records[1].resolved_type = Some("EntityReference".into());
        let entities = vec![EntityTypeDescriptor::new(1, "account").with_label("Account")];

        reconcile_bindings(&mut parameters, &entities);

        assert_eq!(parameters.records[0].resolved_type.as_deref(), Some("EntityReference Account"));
    }

    #[test]
    fn unknown_code_removes_sibling_without_decoration() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target"),
            ParameterRecord::new("Target").with_binding("OTC:2"),
        ]);
        parameters.records[1].resolved_type = Some("EntityReference".into());

        let summary = reconcile_bindings(&mut parameters, &account());

        assert_eq!(summary, ReconcileSummary { merged: 1, resolved: 0 });
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters.records[0].resolved_type.as_deref(), Some("EntityReference"));
        assert!(parameters.records[0].bound_entity.is_none());
    }

    #[test]
    fn malformed_code_still_merges_when_sibling_exists() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target").with_binding("OTC:abc"),
            ParameterRecord::new("Target"),
        ]);

        reconcile_bindings(&mut parameters, &account());

        assert_eq!(parameters.len(), 1);
        assert!(parameters.records[0].is_bound());
        assert!(parameters.records[0].bound_entity.is_none());
    }

    #[test]
    fn bound_row_without_sibling_is_untouched() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target").with_binding("OTC:1"),
            ParameterRecord::new("Other"),
        ]);
        let before = parameters.clone();

        let summary = reconcile_bindings(&mut parameters, &account());

        assert_eq!(summary, ReconcileSummary::default());
        assert_eq!(parameters, before);
    }

    #[test]
    fn empty_cache_degrades_gracefully() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("Target"),
            ParameterRecord::new("Target").with_binding("OTC:1"),
        ]);
        let empty: Vec<EntityTypeDescriptor> = Vec::new();

        reconcile_bindings(&mut parameters, &empty);

        assert_eq!(parameters.len(), 1);
        assert!(parameters.records[0].bound_entity.is_none());
    }

    #[test]
    fn several_pairs_are_removed_without_index_drift() {
        let mut parameters = request_set(vec![
            ParameterRecord::new("A"),
            ParameterRecord::new("B"),
            ParameterRecord::new("C"),
            ParameterRecord::new("A").with_binding("OTC:1"),
            ParameterRecord::new("C").with_binding("OTC:1"),
        ]);

        let summary = reconcile_bindings(&mut parameters, &account());

        assert_eq!(summary.merged, 2);
        let names: Vec<_> = parameters.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert!(parameters.iter().filter(|record| record.name != "B").all(|record| record.is_bound()));
    }

    #[test]
    fn parses_object_type_codes() {
        assert_eq!(parse_object_type_code("OTC:1"), Some(1));
        assert_eq!(parse_object_type_code("OTC: 10010 "), Some(10010));
        assert_eq!(parse_object_type_code("OTC:"), None);
        assert_eq!(parse_object_type_code("bogus"), None);
    }
}
