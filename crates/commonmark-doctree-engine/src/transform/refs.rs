//! Reference target resolution against the project tree.

use std::path::{Component, Path, PathBuf};

use relative_path::RelativePathBuf;

use super::config::TransformConfig;
use crate::host::Host;

/// Where a reference points after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Another document of the project. `path` is project-relative, without
    /// suffix, `/`-separated.
    Document {
        path: String,
        anchor: Option<String>,
    },
    /// Anything else; `uri` is what the reference should point to now.
    Uri(String),
}

impl Resolution {
    /// TOC target: the document path (with anchor) or the uri.
    pub fn target(&self) -> String {
        match self {
            Resolution::Document { path, anchor: None } => path.clone(),
            Resolution::Document {
                path,
                anchor: Some(anchor),
            } => format!("{path}#{anchor}"),
            Resolution::Uri(uri) => uri.clone(),
        }
    }
}

/// Paths one document's references are resolved against.
#[derive(Debug, Clone)]
pub(crate) struct RefContext {
    pub root: PathBuf,
    pub file_dir: PathBuf,
}

impl RefContext {
    /// `source` is the document's path; a relative one is taken from `root`.
    pub fn new(root: &Path, source: &str) -> Self {
        let root = normalize(root);
        let source = Path::new(source);
        let absolute = if source.is_absolute() {
            normalize(source)
        } else {
            normalize(&root.join(source))
        };
        let file_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
        Self { root, file_dir }
    }

    pub fn resolve(&self, uri: &str, config: &TransformConfig, host: &dyn Host) -> Resolution {
        if uri.contains("://") {
            return Resolution::Uri(uri.to_string());
        }

        let parts: Vec<&str> = uri.split('#').collect();
        let path = parts[0];
        if parts.len() > 2 || path.is_empty() {
            return Resolution::Uri(uri.to_string());
        }
        let anchor = parts.get(1).map(|a| a.to_string());

        let absolute = normalize(&self.file_dir.join(path));
        let relative = relative_to(&absolute, &self.root);

        let suffix = absolute.extension().and_then(|e| e.to_str());
        let is_document = suffix.is_some_and(|s| config.document_suffixes.iter().any(|d| d == s))
            && absolute.starts_with(&self.root)
            && host.resolve_local_document(&absolute);

        if is_document {
            let stem = match relative.as_str().rsplit_once('.') {
                Some((stem, _)) => stem.to_string(),
                None => relative.into_string(),
            };
            return Resolution::Document { path: stem, anchor };
        }

        match &config.url_resolver {
            Some(resolver) => {
                let mut resolved = resolver(relative.as_str());
                if let Some(anchor) = anchor.filter(|a| !a.is_empty()) {
                    resolved.push('#');
                    resolved.push_str(&anchor);
                }
                Resolution::Uri(resolved)
            }
            None => Resolution::Uri(uri.to_string()),
        }
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` relative to `base`, with `..` where it leaves `base`.
pub(crate) fn relative_to(path: &Path, base: &Path) -> RelativePathBuf {
    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = RelativePathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str().to_string_lossy().as_ref());
    }
    relative
}
