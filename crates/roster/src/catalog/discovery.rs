use std::io::ErrorKind;
use std::path::PathBuf;

use super::domain::{MediaItem, MediaKind};
use super::ordering::natural_cmp;

/// A media file found in a model's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Public path, e.g. `/models/ana/image2.webp`.
    pub path: String,
    pub kind: MediaKind,
    /// File name including the extension.
    pub name: String,
}

impl DiscoveredFile {
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(index) if index > 0 => &self.name[..index],
            _ => &self.name,
        }
    }

    /// Gallery entry with alt text `"<slug> - <stem>"`.
    pub fn to_media_item(&self, slug: &str) -> MediaItem {
        MediaItem {
            kind: self.kind,
            src: self.path.clone(),
            alt: format!("{slug} - {}", self.stem()),
            thumbnail: None,
        }
    }
}

/// Result of scanning one slug directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredMedia {
    pub slug: String,
    pub featured_image: Option<String>,
    pub gallery: Vec<DiscoveredFile>,
}

impl DiscoveredMedia {
    fn empty(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("slug '{0}' is not a valid media directory name")]
    InvalidSlug(String),
    #[error("failed to scan media directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Infers each model's media set from the files under `<root>/<slug>/`.
#[derive(Debug, Clone)]
pub struct MediaDiscovery {
    root: PathBuf,
    url_prefix: String,
}

impl MediaDiscovery {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into();
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Filesystem location of a public media path produced by this scanner,
    /// or `None` when the path lives elsewhere (remote URL, data URI).
    pub fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path
            .strip_prefix(&self.url_prefix)?
            .trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Scans the slug directory. A missing directory is not an error: it
    /// yields no featured image and an empty gallery.
    pub fn discover(&self, slug: &str) -> Result<DiscoveredMedia, DiscoveryError> {
        validate_slug(slug)?;
        let dir = self.root.join(slug);

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(DiscoveredMedia::empty(slug))
            }
            Err(source) => return Err(DiscoveryError::Io { path: dir, source }),
        };

        let mut gallery = Vec::new();
        let mut featured_image = None;

        for entry in entries {
            let entry = entry.map_err(|source| DiscoveryError::Io {
                path: dir.clone(),
                source,
            })?;
            let is_file = entry
                .file_type()
                .map(|file_type| file_type.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let Some(kind) = extension(&name).and_then(MediaKind::from_extension) else {
                continue;
            };

            let file = DiscoveredFile {
                path: format!("{}/{slug}/{name}", self.url_prefix),
                kind,
                name,
            };

            // First match in enumeration order wins.
            if featured_image.is_none() && kind == MediaKind::Image && is_featured_name(&file) {
                featured_image = Some(file.path.clone());
            }
            gallery.push(file);
        }

        gallery.sort_by(|a, b| natural_cmp(&a.name, &b.name));

        if featured_image.is_none() {
            featured_image = gallery
                .iter()
                .find(|file| file.kind == MediaKind::Image)
                .map(|file| file.path.clone());
        }

        Ok(DiscoveredMedia {
            slug: slug.to_string(),
            featured_image,
            gallery,
        })
    }

    /// Names of every directory under the media root, sorted. A missing root
    /// yields an empty list.
    pub fn discover_slugs(&self) -> Result<Vec<String>, DiscoveryError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(DiscoveryError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut slugs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DiscoveryError::Io {
                path: self.root.clone(),
                source,
            })?;
            let is_dir = entry
                .file_type()
                .map(|file_type| file_type.is_dir())
                .unwrap_or(false);
            if let (true, Ok(name)) = (is_dir, entry.file_name().into_string()) {
                slugs.push(name);
            }
        }

        slugs.sort();
        Ok(slugs)
    }
}

fn validate_slug(slug: &str) -> Result<(), DiscoveryError> {
    let invalid = slug.trim().is_empty()
        || slug == "."
        || slug == ".."
        || slug.contains(['/', '\\'])
        || slug.contains('\0');
    if invalid {
        Err(DiscoveryError::InvalidSlug(slug.to_string()))
    } else {
        Ok(())
    }
}

fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty()).then_some(ext)
}

fn is_featured_name(file: &DiscoveredFile) -> bool {
    let stem = file.stem().to_ascii_lowercase();
    if stem.contains("featured") || stem.contains("main") || stem.contains("cover") {
        return true;
    }

    // image<N>.<ext>
    stem.strip_prefix("image")
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()))
}
