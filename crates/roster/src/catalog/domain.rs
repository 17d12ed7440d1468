use serde::{Deserialize, Deserializer, Serialize};

/// Measurements rendered on cards and detail pages. Every field is free text
/// and defaults to an empty string so views can render unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub height: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bust: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub waist: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hips: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub shoe_size: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hair_color: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub eye_color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies a file extension (without the dot); unknown extensions yield `None`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "webp" | "jpg" | "jpeg" | "png" => Some(Self::Image),
            "mp4" | "webm" | "mov" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Lenient parse used for store rows; anything that is not a video is shown as an image.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("video") {
            Self::Video
        } else {
            Self::Image
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub src: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// One fully-populated catalog entity. Sources normalize into this shape at
/// their boundary so the reconciler never has to ask whether a field exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub stats: ModelStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    pub featured_image: String,
    pub gallery: Vec<MediaItem>,
}

/// Record shape accepted from the snapshot file and the catalog endpoint,
/// where any field may be missing or `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModelRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stats: Option<ModelStats>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub gallery: Option<Vec<MediaItem>>,
}

impl RawModelRecord {
    /// Applies the documented defaults. Records without a usable slug cannot
    /// be correlated with any other source and are discarded.
    pub fn normalize(self) -> Option<ModelRecord> {
        let slug = non_blank(self.slug)?;
        let id = non_blank(self.id).unwrap_or_else(|| slug.clone());
        let name = non_blank(self.name).unwrap_or_else(|| slug.clone());

        Some(ModelRecord {
            id,
            name,
            stats: self.stats.unwrap_or_default(),
            instagram: non_blank(self.instagram),
            featured_image: self.featured_image.unwrap_or_default(),
            gallery: self.gallery.unwrap_or_default(),
            slug,
        })
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Identifier {
        Text(String),
        Number(i64),
    }

    let opt = Option::<Identifier>::deserialize(deserializer)?;
    Ok(opt.map(|id| match id {
        Identifier::Text(text) => text,
        Identifier::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_record_fills_defaults() {
        let raw: RawModelRecord = serde_json::from_value(json!({
            "slug": "ana",
            "stats": { "height": "5'10\"", "bust": null },
            "featuredImage": null,
            "instagram": "  "
        }))
        .expect("raw record parses");

        let record = raw.normalize().expect("slug present");
        assert_eq!(record.id, "ana");
        assert_eq!(record.name, "ana");
        assert_eq!(record.stats.height, "5'10\"");
        assert_eq!(record.stats.bust, "");
        assert_eq!(record.stats.eye_color, "");
        assert!(record.instagram.is_none());
        assert_eq!(record.featured_image, "");
        assert!(record.gallery.is_empty());
    }

    #[test]
    fn numeric_ids_become_strings() {
        let raw: RawModelRecord =
            serde_json::from_value(json!({ "id": 12, "slug": "bo", "name": "Bo" }))
                .expect("raw record parses");
        let record = raw.normalize().expect("slug present");
        assert_eq!(record.id, "12");
        assert_eq!(record.stats, ModelStats::default());
    }

    #[test]
    fn records_without_slug_are_dropped() {
        let raw: RawModelRecord =
            serde_json::from_value(json!({ "id": "3", "name": "Nameless" })).expect("parses");
        assert!(raw.normalize().is_none());
    }

    #[test]
    fn serializes_with_site_field_names() {
        let record = ModelRecord {
            id: "1".to_string(),
            slug: "ana".to_string(),
            name: "Ana".to_string(),
            stats: ModelStats {
                shoe_size: "8".to_string(),
                ..ModelStats::default()
            },
            instagram: None,
            featured_image: "/models/ana/cover.webp".to_string(),
            gallery: vec![MediaItem {
                kind: MediaKind::Video,
                src: "/models/ana/reel.mp4".to_string(),
                alt: "ana - reel".to_string(),
                thumbnail: None,
            }],
        };

        let value = serde_json::to_value(&record).expect("serializes");
        assert_eq!(value["featuredImage"], "/models/ana/cover.webp");
        assert_eq!(value["stats"]["shoeSize"], "8");
        assert_eq!(value["gallery"][0]["type"], "video");
        assert!(value.get("instagram").is_none());
        assert!(value["gallery"][0].get("thumbnail").is_none());
    }

    #[test]
    fn classifies_extensions() {
        assert_eq!(MediaKind::from_extension("JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("mov"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("gif"), None);
        assert_eq!(MediaKind::from_label("VIDEO"), MediaKind::Video);
        assert_eq!(MediaKind::from_label("photo"), MediaKind::Image);
    }
}
