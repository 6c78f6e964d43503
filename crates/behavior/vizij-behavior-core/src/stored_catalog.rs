use serde::Deserialize;

use crate::data::{AnimationCatalog, AnimationDefinition, EndType, ProcedureRef};
use crate::error::BehaviorError;

/// Public API: parse catalog JSON (see fixtures/catalogs/*.json) into an
/// [`AnimationCatalog`].
///
/// Notes:
/// - `procedures` entries are either a bare id (`"blink"`) or `{ "id", "params" }`.
/// - `conflictGroup` is either an index into `conflictGroups` or one of its names.
/// - `loops` defaults to 0 (one pass) and `endType` to `"stop"`.
/// - Definitions are validated by [`AnimationCatalog::insert`].
pub fn parse_behavior_catalog_json(s: &str) -> Result<AnimationCatalog, BehaviorError> {
    let sc: StoredCatalog = serde_json::from_str(s)?;

    let mut catalog = AnimationCatalog::new(sc.name);
    for group in sc.conflict_groups {
        catalog.add_group(group);
    }

    for sa in sc.animations {
        let group = match sa.conflict_group {
            RawGroup::Index(idx) => idx,
            RawGroup::Name(name) => {
                catalog
                    .group_index(&name)
                    .ok_or_else(|| BehaviorError::InvalidDefinition {
                        reason: format!(
                            "animation '{}' names unknown conflict group '{name}'",
                            sa.name
                        ),
                    })?
            }
        };

        let mut def = AnimationDefinition::new(sa.name, group)
            .with_loop_count(sa.loops)
            .with_default_end(sa.end_type);
        for p in sa.procedures {
            def = def.with_procedure_ref(match p {
                RawProcedure::Id(id) => ProcedureRef::new(id),
                RawProcedure::WithParams { id, params } => ProcedureRef::with_params(id, params),
            });
        }
        catalog.insert(def)?;
    }
    Ok(catalog)
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCatalog {
    #[serde(default)]
    name: String,
    #[serde(default)]
    conflict_groups: Vec<String>,
    animations: Vec<StoredAnimation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAnimation {
    name: String,
    procedures: Vec<RawProcedure>,
    #[serde(default)]
    loops: i32,
    #[serde(default)]
    end_type: EndType,
    #[serde(default)]
    conflict_group: RawGroup,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProcedure {
    Id(String),
    WithParams {
        id: String,
        #[serde(default)]
        params: serde_json::Value,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGroup {
    Index(usize),
    Name(String),
}

impl Default for RawGroup {
    fn default() -> Self {
        RawGroup::Index(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_parameterised_procedures() {
        let json = r#"{
            "name": "face",
            "conflictGroups": ["eyes", "mouth"],
            "animations": [
                { "name": "blink", "procedures": ["blink"], "conflictGroup": "eyes" },
                { "name": "talk",
                  "procedures": [{ "id": "scale_by", "params": { "delta": [0, 0.2, 0] } }],
                  "loops": -1, "endType": "finish", "conflictGroup": 1 }
            ]
        }"#;
        let catalog = parse_behavior_catalog_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let blink = catalog.get("blink").unwrap();
        assert_eq!(blink.conflict_group(), 0);
        assert_eq!(blink.loop_count(), 0);
        assert_eq!(blink.default_end_type(), EndType::Stop);

        let talk = catalog.get("talk").unwrap();
        assert_eq!(talk.conflict_group(), 1);
        assert_eq!(talk.default_end_type(), EndType::Finish);
        assert_eq!(talk.procedure_list()[0].id, "scale_by");
        assert!(talk.procedure_list()[0].params.is_object());
    }

    #[test]
    fn unknown_group_name_is_rejected() {
        let json = r#"{ "conflictGroups": ["body"],
            "animations": [{ "name": "a", "procedures": ["wait"], "conflictGroup": "head" }] }"#;
        let err = parse_behavior_catalog_json(json).unwrap_err();
        assert!(matches!(err, BehaviorError::InvalidDefinition { .. }));
    }

    #[test]
    fn unknown_end_type_is_a_serialization_error() {
        let json = r#"{ "animations": [{ "name": "a", "procedures": ["wait"], "endType": "explode" }] }"#;
        let err = parse_behavior_catalog_json(json).unwrap_err();
        assert_eq!(err.category(), "serialization");
    }
}
