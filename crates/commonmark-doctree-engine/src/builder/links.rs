//! Link destination classification.

use std::sync::LazyLock;

use regex::Regex;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*):").expect("Invalid scheme regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkTarget {
    /// Absolute URI; kept as a plain reference.
    External,
    /// Same-page fragment or empty destination; kept as a plain reference.
    SamePage,
    /// Local target left for the host to resolve. `target` is percent-decoded.
    CrossRef { target: String },
}

/// Scheme of an absolute URI, lowercased.
pub(crate) fn scheme(destination: &str) -> Option<String> {
    SCHEME
        .captures(destination)
        .map(|caps| caps[1].to_ascii_lowercase())
}

/// Decide how a link destination enters the tree.
///
/// With `known_schemes` set, only those schemes count as external; any other
/// `scheme:` prefix is treated as a local target.
pub(crate) fn classify(destination: &str, known_schemes: Option<&[String]>) -> LinkTarget {
    if destination.is_empty() || destination.starts_with('#') {
        return LinkTarget::SamePage;
    }

    let external = match (scheme(destination), known_schemes) {
        (Some(scheme), Some(known)) => known.iter().any(|k| k.eq_ignore_ascii_case(&scheme)),
        (Some(_), None) => true,
        (None, _) => false,
    };
    if external {
        return LinkTarget::External;
    }

    let target = urlencoding::decode(destination)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| destination.to_string());
    LinkTarget::CrossRef { target }
}
