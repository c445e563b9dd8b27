//! Remote scene graph and live annotation data.
//!
//! These payloads replace or update the streamer's remote scene store and
//! never touch [`crate::ControlState`]. Applying the same payload twice
//! leaves the store unchanged (the commands are idempotent).

use serde::{Deserialize, Serialize};

/// Full remote scene graph (replace semantics).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSceneSettings {
    /// Scene definitions.
    pub scenes: Vec<RemoteScene>,
    /// Widget definitions referenced by scenes.
    pub widgets: Vec<RemoteWidget>,
    /// Scene to make current, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_scene_id: Option<String>,
}

/// One remotely managed scene.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteScene {
    /// Stable scene identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Widgets placed in this scene, by id.
    pub widget_ids: Vec<String>,
}

/// One remotely managed widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWidget {
    /// Stable widget identifier.
    pub id: String,
    /// Widget kind (e.g. `browser`, `text`, `map`).
    pub kind: String,
    /// Source URL for browser widgets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Live annotation data feeding remote scene widgets (update semantics).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSceneData {
    /// Text widget statistics lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_stats: Option<RemoteTextStats>,
    /// Device location for map widgets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<RemoteLocation>,
}

/// Pre-rendered lines for text widgets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTextStats {
    /// Lines in display order.
    pub lines: Vec<String>,
}

/// A geographic fix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Ground speed in m/s, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> RemoteSceneSettings {
        RemoteSceneSettings {
            scenes: vec![RemoteScene {
                id: "rs-1".into(),
                name: "Overlay".into(),
                widget_ids: vec!["w-1".into()],
            }],
            widgets: vec![RemoteWidget {
                id: "w-1".into(),
                kind: "browser".into(),
                url: Some("https://overlay.example/chat".into()),
            }],
            selected_scene_id: Some("rs-1".into()),
        }
    }

    #[test]
    fn settings_roundtrip() {
        let settings = sample_settings();
        let json = serde_json::to_string(&settings).unwrap();
        let back: RemoteSceneSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn settings_wire_keys() {
        let json = serde_json::to_value(sample_settings()).unwrap();
        assert!(json.get("selectedSceneId").is_some());
        assert!(json["scenes"][0].get("widgetIds").is_some());
    }

    #[test]
    fn data_partial_fixture() {
        let raw = r#"{"location": {"latitude": 59.33, "longitude": 18.07, "speed": 1.2}}"#;
        let data: RemoteSceneData = serde_json::from_str(raw).unwrap();
        assert!(data.text_stats.is_none());
        let loc = data.location.unwrap();
        assert!((loc.latitude - 59.33).abs() < f64::EPSILON);
        assert_eq!(loc.altitude, None);
        assert_eq!(loc.speed, Some(1.2));
    }

    #[test]
    fn empty_data_serializes_to_empty_object() {
        let data = RemoteSceneData::default();
        assert_eq!(serde_json::to_string(&data).unwrap(), "{}");
    }
}
