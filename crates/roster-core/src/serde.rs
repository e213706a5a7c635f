use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Deserializes a patchable UUID field.
///
/// Use together with `#[serde(default)]`: an absent field stays `None`
/// (leave unchanged), while `null` or `""` become `Some(None)` (clear).
pub fn deserialize_patch_uuid<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(Some(None)),
        Some(s) => Uuid::parse_str(&s)
            .map(|id| Some(Some(id)))
            .map_err(serde::de::Error::custom),
        None => Ok(Some(None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_patch_uuid")]
        unit: Option<Option<Uuid>>,
    }

    #[test]
    fn test_missing_field_is_unchanged() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.unit, None);
    }

    #[test]
    fn test_null_and_empty_clear() {
        let patch: Patch = serde_json::from_str(r#"{"unit":null}"#).unwrap();
        assert_eq!(patch.unit, Some(None));
        let patch: Patch = serde_json::from_str(r#"{"unit":""}"#).unwrap();
        assert_eq!(patch.unit, Some(None));
    }

    #[test]
    fn test_uuid_sets() {
        let id = Uuid::new_v4();
        let patch: Patch = serde_json::from_str(&format!(r#"{{"unit":"{id}"}}"#)).unwrap();
        assert_eq!(patch.unit, Some(Some(id)));
    }

    #[test]
    fn test_invalid_uuid_is_error() {
        assert!(serde_json::from_str::<Patch>(r#"{"unit":"nope"}"#).is_err());
    }
}
