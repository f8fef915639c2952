//! Reference name validation following git-style conventions.
//!
//! Valid reference names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `/`, or end with `.`
//! - Must not end with `.lock`
//! - Components between slashes must be non-empty and not start with `.`
//!
//! Refspec sides follow the same rules except that a single `*` is allowed.

use crate::error::{RefspecError, Result};

/// Characters that are forbidden anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// The wildcard character accepted once per refspec side.
pub const WILDCARD: char = '*';

fn invalid(name: &str, reason: impl Into<String>) -> RefspecError {
    RefspecError::InvalidRefName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a full or short reference name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use refsync_refspec::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/heads/main").is_ok());
/// assert!(validate_ref_name("HEAD").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }

    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }

    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }

    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "must not contain consecutive slashes '//'"));
        }
        if component.starts_with('.') {
            return Err(invalid(name, format!("component must not start with '.': {component:?}")));
        }
    }

    Ok(())
}

/// Validate one side of a refspec: a reference name that may contain a
/// single `*` wildcard.
pub fn validate_refspec_side(side: &str) -> Result<()> {
    let wildcards = side.matches(WILDCARD).count();
    if wildcards > 1 {
        return Err(invalid(side, format!("contains {wildcards} wildcards, at most one is allowed")));
    }
    // The wildcard stands in for at least a name-safe segment.
    validate_ref_name(&side.replacen(WILDCARD, "w", 1)).map_err(|err| match err {
        RefspecError::InvalidRefName { reason, .. } => invalid(side, reason),
        other => other,
    })
}

/// Validate a remote name. Must be a simple identifier (no slashes).
pub fn validate_remote_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "remote name must not be empty"));
    }
    if name.contains('/') {
        return Err(invalid(name, "remote name must not contain '/'"));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return Err(invalid(name, format!("remote name contains forbidden character: {ch:?}")));
    }
    if name.starts_with('.') || name.contains("..") {
        return Err(invalid(name, "remote name must not start with '.' or contain '..'"));
    }
    Ok(())
}
