//! Identifier and name normalization for section targets.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use super::NodeId;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));
static NOT_ID_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w-]+").expect("Invalid id character regex"));
static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("Invalid hyphen regex"));

/// Display name: whitespace collapsed to single spaces, case folded.
pub fn normalize_name(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Identifier: lowercase, whitespace runs become `-`, anything that is not a
/// word character or hyphen is dropped, repeated and edge hyphens trimmed.
pub fn make_id(text: &str) -> String {
    let name = normalize_name(text);
    let hyphenated = WHITESPACE.replace_all(&name, "-");
    let cleaned = NOT_ID_CHAR.replace_all(&hyphenated, "");
    HYPHEN_RUN
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}

/// Outcome of registering a target identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    /// The identifier actually assigned (suffixed on collision).
    pub id: String,
    /// The identifier that was requested and already taken, if any.
    pub collided_with: Option<String>,
}

/// Per-document registry of target ids and names.
///
/// Ids are unique: a collision is resolved by appending `-1`, `-2`, ... to the
/// requested id. Names may be shared by several nodes; every holder is kept.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    ids: HashMap<String, NodeId>,
    names: BTreeMap<String, Vec<NodeId>>,
}

impl IdRegistry {
    pub fn register(&mut self, node: NodeId, requested_id: &str, name: &str) -> Registered {
        if !name.is_empty() {
            self.names.entry(name.to_string()).or_default().push(node);
        }

        if requested_id.is_empty() {
            return Registered {
                id: String::new(),
                collided_with: None,
            };
        }

        if !self.ids.contains_key(requested_id) {
            self.ids.insert(requested_id.to_string(), node);
            return Registered {
                id: requested_id.to_string(),
                collided_with: None,
            };
        }

        let mut suffix = 1usize;
        let id = loop {
            let candidate = format!("{requested_id}-{suffix}");
            if !self.ids.contains_key(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        self.ids.insert(id.clone(), node);
        Registered {
            id,
            collided_with: Some(requested_id.to_string()),
        }
    }

    pub fn lookup_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn lookup_name(&self, name: &str) -> &[NodeId] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names held by more than one node, in sorted order.
    pub fn duplicate_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .filter(|(_, nodes)| nodes.len() > 1)
            .map(|(name, _)| name.as_str())
    }
}
