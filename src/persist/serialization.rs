// Serialization utilities for bundle persistence

use crate::persist::bundle::BundleManifest;
use crate::persist::store::ProjectState;
use crate::persist::PersistError;
use ron::{from_str as ron_from_str, to_string as ron_to_string};

/// Serialize the project state to RON format
pub fn serialize_state_to_ron(state: &ProjectState) -> Result<String, PersistError> {
    ron_to_string(state)
        .map_err(|e| PersistError::SerializationError(format!("Failed to serialize to RON: {}", e)))
}

/// Deserialize the project state from RON format
pub fn deserialize_state_from_ron(ron_data: &str) -> Result<ProjectState, PersistError> {
    ron_from_str(ron_data).map_err(|e| {
        PersistError::SerializationError(format!("Failed to deserialize from RON: {}", e))
    })
}

/// Serialize the bundle manifest to JSON format
pub fn serialize_manifest_to_json(manifest: &BundleManifest) -> Result<String, PersistError> {
    serde_json::to_string_pretty(manifest).map_err(|e| {
        PersistError::SerializationError(format!("Failed to serialize manifest to JSON: {}", e))
    })
}

/// Deserialize the bundle manifest from JSON format
pub fn deserialize_manifest_from_json(json_data: &str) -> Result<BundleManifest, PersistError> {
    serde_json::from_str(json_data).map_err(|e| {
        PersistError::SerializationError(format!("Failed to deserialize manifest from JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::bundle::FormatVersion;
    use crate::region::Region;

    #[test]
    fn test_ron_round_trip() {
        let mut state = ProjectState::default();
        state.regions.insert(1, Region::new(1, "intro", 32.0));
        let uid = state.items.create_item("melody");

        let ron_data = serialize_state_to_ron(&state).unwrap();
        assert!(ron_data.contains("intro"));

        let back = deserialize_state_from_ron(&ron_data).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.items.get(uid).unwrap().name, "melody");
    }

    #[test]
    fn test_manifest_round_trip() {
        let manifest = BundleManifest {
            name: "Test Project".to_string(),
            version: FormatVersion::current(),
            created: "2023-01-01T00:00:00Z".to_string(),
            modified: "2023-01-01T00:00:00Z".to_string(),
        };

        let json = serialize_manifest_to_json(&manifest).unwrap();
        let back = deserialize_manifest_from_json(&json).unwrap();
        assert_eq!(back.name, "Test Project");
        assert_eq!(back.version, FormatVersion::current());
    }

    #[test]
    fn test_bad_ron_is_a_serialization_error() {
        let result = deserialize_state_from_ron("not ron at all (");
        assert!(matches!(result, Err(PersistError::SerializationError(_))));
    }
}
