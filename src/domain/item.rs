//! Collage items supplied by the media collaborator

use serde::{Deserialize, Serialize};

/// Opaque, already-resolved reference to an image resource (URL or path)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One placed image.
///
/// Identity is the `id`; the engine never mutates an item once placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollageItem {
    pub id: String,
    #[serde(rename = "imageUrl")]
    pub image: ResourceHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CollageItem {
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: ResourceHandle::new(image),
            file_name: None,
            taken_at: None,
            location: None,
        }
    }

    /// Alt text shown for the image
    pub fn label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("Collage image")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collaborator_payload() {
        let json = r#"[
            {"id": "a", "imageUrl": "https://cdn.example/a.jpg", "fileName": "a.jpg"},
            {"id": "b", "imageUrl": "/tmp/b.png", "takenAt": "2024-05-01", "location": "Lisbon"}
        ]"#;
        let items: Vec<CollageItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].image.as_str(), "https://cdn.example/a.jpg");
        assert_eq!(items[0].label(), "a.jpg");
        assert_eq!(items[1].location.as_deref(), Some("Lisbon"));
        assert_eq!(items[1].label(), "Collage image");
    }
}
