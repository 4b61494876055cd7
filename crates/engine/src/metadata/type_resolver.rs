//! Short type labels for parameter records.

use action_tester_types::ParameterSet;

/// Reduces a fully-qualified parser/formatter identifier to its simple type
/// name.
///
/// Everything after the first comma (the assembly qualifier) is dropped, then
/// every leading dotted namespace segment is stripped:
/// `"System.String, mscorlib"` becomes `"String"`. Input without dots or
/// commas is returned unchanged.
pub fn short_type_name(identifier: &str) -> &str {
    let qualified = identifier.split(',').next().unwrap_or(identifier);
    let mut name = qualified;
    while let Some(dot) = name.find('.') {
        name = &name[dot + 1..];
    }
    name
}

/// Sets `resolved_type` on every record that exposes a parser or formatter.
///
/// Records without either keep `resolved_type` untouched. The label is always
/// derived from the identifier, so running this twice gives the same result.
pub fn resolve_types(parameters: &mut ParameterSet) {
    for record in &mut parameters.records {
        if let Some(identifier) = record.type_identifier() {
            record.resolved_type = Some(short_type_name(identifier).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_tester_types::{ParameterDirection, ParameterRecord};

    #[test]
    fn strips_assembly_qualifier_and_namespace() {
        assert_eq!(short_type_name("System.String, mscorlib"), "String");
        assert_eq!(
            short_type_name("Microsoft.Xrm.Sdk.EntityReference, Microsoft.Xrm.Sdk, Version=9.0.0.0"),
            "EntityReference"
        );
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(short_type_name("Money"), "Money");
        assert_eq!(short_type_name(""), "");
    }

    #[test]
    fn trailing_dot_yields_empty_label() {
        assert_eq!(short_type_name("System."), "");
    }

    #[test]
    fn request_uses_parser_and_response_uses_formatter() {
        let mut parameters = ParameterSet::new(
            ParameterDirection::Request,
            vec![
                ParameterRecord::new("A").with_parser("System.Int32, mscorlib"),
                ParameterRecord::new("B").with_formatter("Microsoft.Xrm.Sdk.Money, Microsoft.Xrm.Sdk"),
                ParameterRecord::new("C"),
            ],
        );

        resolve_types(&mut parameters);

        assert_eq!(parameters.records[0].resolved_type.as_deref(), Some("Int32"));
        assert_eq!(parameters.records[1].resolved_type.as_deref(), Some("Money"));
        assert_eq!(parameters.records[2].resolved_type, None);
    }

    #[test]
    fn resolving_twice_is_stable() {
        let mut parameters = ParameterSet::new(
            ParameterDirection::Request,
            vec![ParameterRecord::new("A").with_parser("System.Boolean, mscorlib")],
        );
        resolve_types(&mut parameters);
        let once = parameters.clone();
        resolve_types(&mut parameters);
        assert_eq!(parameters, once);
    }
}
