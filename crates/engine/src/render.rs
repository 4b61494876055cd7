//! Indented text rendering of platform values.
//!
//! Rendering is total: every [`PlatformValue`] shape produces text, and
//! nothing here allocates state or fails. Child lines of a value rendered at
//! depth `d` start with `d` indentation units; nested values recurse at
//! `d + 1`. Top-level rendering starts at depth 1.

use action_tester_types::{ColumnSet, EntityCollection, EntityRecord, EntityReference, PlatformValue};
use action_tester_util::{indent, reindent_lines};
use serde::{Deserialize, Serialize};

/// Text shown for an absent value.
pub const NULL_MARKER: &str = "<null>";

const ROOT_DEPTH: usize = 1;

/// Flags controlling how values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Append ` (TypeName)` to scalar values.
    pub attribute_types: bool,
    /// Render the records of a collection under its summary line.
    pub expand_collections: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            attribute_types: true,
            expand_collections: true,
        }
    }
}

impl RenderOptions {
    /// Compact projection used for display values: no annotations.
    pub fn plain() -> Self {
        Self {
            attribute_types: false,
            expand_collections: true,
        }
    }
}

/// Renders a value starting at the root depth.
pub fn render_value(value: &PlatformValue, options: RenderOptions) -> String {
    render_at(value, options, ROOT_DEPTH)
}

/// Renders a value whose child lines are indented for `depth`.
pub fn render_at(value: &PlatformValue, options: RenderOptions, depth: usize) -> String {
    match value {
        PlatformValue::Null => NULL_MARKER.to_string(),
        PlatformValue::Collection(collection) => render_collection(collection, options, depth),
        PlatformValue::Record(record) => render_record(record, options, depth),
        PlatformValue::ColumnSet(columns) => render_columns(columns, depth),
        PlatformValue::Query(query) => format!("FetchExpression\n{}{}", indent(depth), reindent_lines(&query.query, depth)),
        PlatformValue::Reference(reference) => annotate(reference_projection(reference), value, options),
        PlatformValue::OptionSet(option) => annotate(option.value.to_string(), value, options),
        PlatformValue::Money(money) => annotate(money.value.to_string(), value, options),
        PlatformValue::Other(primitive) => annotate(reindent_lines(&primitive.to_string(), depth), value, options),
    }
}

/// `<logicalName> <id> <name>`, without trailing space when unnamed.
pub(crate) fn reference_projection(reference: &EntityReference) -> String {
    let projection = format!(
        "{} {} {}",
        reference.logical_name,
        reference.id,
        reference.name.as_deref().unwrap_or_default()
    );
    projection.trim_end().to_string()
}

fn annotate(text: String, value: &PlatformValue, options: RenderOptions) -> String {
    if options.attribute_types {
        format!("{text} ({})", value.type_name())
    } else {
        text
    }
}

fn render_collection(collection: &EntityCollection, options: RenderOptions, depth: usize) -> String {
    let mut out = format!(
        "{} collection: Records: {}, TotalRecordCount: {}, MoreRecords: {}, PagingCookie: {}",
        collection.entity_name,
        collection.entities.len(),
        collection.total_record_count,
        collection.more_records,
        collection.paging_cookie.as_deref().unwrap_or("<none>")
    );
    if options.expand_collections {
        let prefix = indent(depth);
        for record in &collection.entities {
            out.push('\n');
            out.push_str(&prefix);
            out.push_str(&render_record(record, options, depth + 1));
        }
    }
    out
}

fn render_record(record: &EntityRecord, options: RenderOptions, depth: usize) -> String {
    let mut out = format!("{} {}", record.logical_name, record.id);
    let width = record.attributes.keys().map(|key| key.chars().count()).max().unwrap_or_default();
    let mut attributes: Vec<_> = record.attributes.iter().collect();
    attributes.sort_by(|(left, _), (right, _)| left.cmp(right));

    let prefix = indent(depth);
    for (key, value) in attributes {
        out.push('\n');
        out.push_str(&prefix);
        out.push_str(&format!("{key:<width$} = {}", render_at(value, options, depth + 1)));
    }
    out
}

fn render_columns(columns: &ColumnSet, depth: usize) -> String {
    if columns.all_columns {
        return "<all columns>".to_string();
    }
    if columns.columns.is_empty() {
        return "<no columns>".to_string();
    }
    let mut names: Vec<&str> = columns.columns.iter().map(String::as_str).collect();
    names.sort_unstable();
    let prefix = indent(depth);
    names.iter().map(|name| format!("\n{prefix}{name}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_tester_types::{FetchQuery, Money, OptionSetValue, Primitive, ValueKind};

    fn sample(kind: ValueKind) -> PlatformValue {
        match kind {
            ValueKind::Null => PlatformValue::Null,
            ValueKind::Collection => PlatformValue::Collection(EntityCollection::default()),
            ValueKind::Record => PlatformValue::Record(EntityRecord::new("account", "a1")),
            ValueKind::ColumnSet => PlatformValue::ColumnSet(ColumnSet::default()),
            ValueKind::Query => PlatformValue::Query(FetchQuery::default()),
            ValueKind::Reference => PlatformValue::Reference(EntityReference::default()),
            ValueKind::OptionSet => PlatformValue::OptionSet(OptionSetValue { value: 0 }),
            ValueKind::Money => PlatformValue::Money(Money { value: 0.0 }),
            ValueKind::Other => PlatformValue::Other(Primitive::Boolean(false)),
        }
    }

    #[test]
    fn every_kind_renders() {
        for kind in ValueKind::ALL {
            let value = sample(kind);
            assert_eq!(value.kind(), kind);
            assert!(!render_value(&value, RenderOptions::default()).is_empty(), "{kind:?} rendered empty");
        }
    }

    #[test]
    fn null_renders_marker() {
        assert_eq!(render_value(&PlatformValue::Null, RenderOptions::default()), "<null>");
    }

    #[test]
    fn record_attributes_are_sorted_and_aligned() {
        let record = EntityRecord::new("account", "a1")
            .with_attribute("b", PlatformValue::Other(Primitive::Integer(1)))
            .with_attribute("a", PlatformValue::text("x"))
            .with_attribute("long", PlatformValue::Null);

        let text = render_value(&PlatformValue::Record(record), RenderOptions::plain());

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["account a1", "  a    = x", "  b    = 1", "  long = <null>"]);
    }

    #[test]
    fn record_without_attributes_is_header_only() {
        let text = render_value(&PlatformValue::Record(EntityRecord::new("account", "a1")), RenderOptions::default());
        assert_eq!(text, "account a1");
    }

    #[test]
    fn collapsed_collection_is_one_line() {
        let collection = EntityCollection {
            entity_name: "contact".into(),
            entities: vec![
                EntityRecord::new("contact", "c1"),
                EntityRecord::new("contact", "c2"),
                EntityRecord::new("contact", "c3"),
            ],
            total_record_count: 3,
            more_records: false,
            paging_cookie: None,
        };
        let options = RenderOptions {
            attribute_types: true,
            expand_collections: false,
        };

        let text = render_value(&PlatformValue::Collection(collection), options);

        assert_eq!(
            text,
            "contact collection: Records: 3, TotalRecordCount: 3, MoreRecords: false, PagingCookie: <none>"
        );
    }

    #[test]
    fn expanded_collection_nests_records_one_level_deeper() {
        let collection = EntityCollection {
            entity_name: "contact".into(),
            entities: vec![EntityRecord::new("contact", "c1").with_attribute("name", PlatformValue::text("Ann"))],
            total_record_count: -1,
            more_records: true,
            paging_cookie: Some("cookie".into()),
        };

        let text = render_value(&PlatformValue::Collection(collection), RenderOptions::plain());

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "contact collection: Records: 1, TotalRecordCount: -1, MoreRecords: true, PagingCookie: cookie",
                "  contact c1",
                "    name = Ann",
            ]
        );
    }

    #[test]
    fn empty_collection_renders_summary() {
        let text = render_value(&PlatformValue::Collection(EntityCollection::default()), RenderOptions::default());
        assert!(text.starts_with(" collection: Records: 0"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn scalars_are_annotated_when_requested() {
        let reference = PlatformValue::Reference(EntityReference {
            logical_name: "account".into(),
            id: "a1".into(),
            name: None,
        });
        assert_eq!(render_value(&reference, RenderOptions::default()), "account a1 (EntityReference)");
        assert_eq!(render_value(&reference, RenderOptions::plain()), "account a1");

        let option = PlatformValue::OptionSet(OptionSetValue { value: 7 });
        assert_eq!(render_value(&option, RenderOptions::default()), "7 (OptionSetValue)");

        let money = PlatformValue::Money(Money { value: 12.5 });
        assert_eq!(render_value(&money, RenderOptions::plain()), "12.5");
    }

    #[test]
    fn multiline_text_is_reindented() {
        let value = PlatformValue::text("first\nsecond");
        assert_eq!(render_at(&value, RenderOptions::plain(), 2), "first\n    second");
    }

    #[test]
    fn columns_are_sorted_one_per_line() {
        let columns = PlatformValue::ColumnSet(ColumnSet {
            all_columns: false,
            columns: vec!["name".into(), "accountid".into()],
        });
        assert_eq!(render_value(&columns, RenderOptions::default()), "\n  accountid\n  name");

        let all = PlatformValue::ColumnSet(ColumnSet {
            all_columns: true,
            columns: Vec::new(),
        });
        assert_eq!(render_value(&all, RenderOptions::default()), "<all columns>");
    }

    #[test]
    fn query_shows_summary_then_text() {
        let query = PlatformValue::Query(FetchQuery {
            query: "<fetch>\n<entity name='account'/>\n</fetch>".into(),
        });
        assert_eq!(
            render_value(&query, RenderOptions::default()),
            "FetchExpression\n  <fetch>\n  <entity name='account'/>\n  </fetch>"
        );
    }
}
