//! Topic, service and node name rules.
//!
//! Topic and service names are slash-separated tokens.  Each token is made of
//! ASCII letters, digits and underscores and must not start with a digit.
//! Relative names are expanded against the root namespace, so `chatter`
//! becomes `/chatter`.

use demo_types::MwError;

/// Validate `name` and return its fully qualified form.
///
/// # Errors
///
/// Returns [`MwError::InvalidName`] for empty names, empty tokens (`a//b`),
/// trailing slashes, tokens starting with a digit, and any character other
/// than `[A-Za-z0-9_/]`.
pub fn expand_name(name: &str) -> Result<String, MwError> {
    let invalid = |reason: &str| MwError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "/" {
        return Err(invalid("name has no tokens"));
    }
    if name.ends_with('/') {
        return Err(invalid("name ends with '/'"));
    }

    let relative = name.strip_prefix('/').unwrap_or(name);
    for token in relative.split('/') {
        if token.is_empty() {
            return Err(invalid("name contains an empty token"));
        }
        if let Some(c) = token.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(invalid(&format!("character '{c}' is not allowed")));
        }
        if token.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid("token starts with a digit"));
        }
    }

    Ok(format!("/{relative}"))
}

/// Validate a node name: a single token, no slashes.
pub fn validate_node_name(name: &str) -> Result<(), MwError> {
    if name.contains('/') {
        return Err(MwError::InvalidName {
            name: name.to_string(),
            reason: "node names cannot contain '/'".to_string(),
        });
    }
    expand_name(name).map(|_| ())
}
