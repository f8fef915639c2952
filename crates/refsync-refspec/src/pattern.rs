//! The [`RefspecPattern`] type: parsing, matching, and transformation.

use std::fmt;

use refsync_types::Direction;

use crate::error::{RefspecError, Result};
use crate::names::{validate_refspec_side, WILDCARD};

/// An immutable source/destination mapping between reference names.
///
/// Invariants established at construction:
/// - each side holds at most one `*`;
/// - if the source has a wildcard, a non-empty destination has one too
///   (and vice versa), so captures map one-to-one;
/// - each non-empty side is a valid reference name apart from the wildcard.
///
/// Changing a refspec means building a new one; there are no setters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefspecPattern {
    source: String,
    destination: String,
    force: bool,
    direction: Direction,
}

/// A refspec side split around its wildcard.
#[derive(Clone, Copy, Debug)]
enum Side<'a> {
    Literal(&'a str),
    Glob { prefix: &'a str, suffix: &'a str },
}

impl<'a> Side<'a> {
    fn of(pattern: &'a str) -> Self {
        match pattern.split_once(WILDCARD) {
            Some((prefix, suffix)) => Side::Glob { prefix, suffix },
            None => Side::Literal(pattern),
        }
    }

    /// The segment of `name` matched by the wildcard, `""` for a literal hit,
    /// or `None` when `name` does not match.
    fn capture<'n>(&self, name: &'n str) -> Option<&'n str> {
        match *self {
            Side::Literal(literal) => (literal == name).then_some(""),
            Side::Glob { prefix, suffix } => {
                if name.len() < prefix.len() + suffix.len() {
                    return None;
                }
                name.strip_prefix(prefix)?.strip_suffix(suffix)
            }
        }
    }

    /// Write this side with `capture` substituted for the wildcard into a
    /// buffer sized for the worst case: `target.len() + name_len + 1`.
    fn expand(&self, target: &str, capture: &str, name_len: usize) -> String {
        let mut out = String::with_capacity(target.len() + name_len + 1);
        match *self {
            Side::Literal(literal) => out.push_str(literal),
            Side::Glob { prefix, suffix } => {
                out.push_str(prefix);
                out.push_str(capture);
                out.push_str(suffix);
            }
        }
        debug_assert!(out.len() < target.len() + name_len + 1);
        out
    }

    fn is_glob(&self) -> bool {
        matches!(self, Side::Glob { .. })
    }
}

impl RefspecPattern {
    /// Parse a refspec of the form `[+]<source>[:<destination>]`.
    ///
    /// Without a `:`, a push refspec maps the source onto the same name on
    /// the remote, while a fetch refspec has an empty destination: the ref is
    /// fetched but not stored under a tracking name. A push refspec with an
    /// empty source (`:refs/heads/topic`) requests deletion of the
    /// destination.
    ///
    /// # Examples
    ///
    /// ```
    /// use refsync_refspec::{Direction, RefspecPattern};
    ///
    /// let spec = RefspecPattern::parse("+refs/heads/*:refs/remotes/origin/*", Direction::Fetch).unwrap();
    /// assert!(spec.is_forced());
    /// assert_eq!(spec.transform("refs/heads/main").unwrap(), "refs/remotes/origin/main");
    /// ```
    pub fn parse(refspec: &str, direction: Direction) -> Result<Self> {
        let (force, body) = match refspec.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, refspec),
        };
        if body.is_empty() {
            return Err(invalid(refspec, "refspec must not be empty"));
        }

        let (source, destination) = match body.rsplit_once(':') {
            Some(pair) => pair,
            None => match direction {
                Direction::Fetch => (body, ""),
                Direction::Push => (body, body),
            },
        };

        Self::build(refspec, source, destination, force, direction)
    }

    /// Build a refspec from its parts, applying the same validation as
    /// [`RefspecPattern::parse`].
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        force: bool,
        direction: Direction,
    ) -> Result<Self> {
        let source = source.into();
        let destination = destination.into();
        let text = render(&source, &destination, force, direction);
        Self::build(&text, &source, &destination, force, direction)
    }

    /// Shorthand for `parse(refspec, Direction::Fetch)`.
    pub fn fetch(refspec: &str) -> Result<Self> {
        Self::parse(refspec, Direction::Fetch)
    }

    /// Shorthand for `parse(refspec, Direction::Push)`.
    pub fn push(refspec: &str) -> Result<Self> {
        Self::parse(refspec, Direction::Push)
    }

    fn build(
        refspec: &str,
        source: &str,
        destination: &str,
        force: bool,
        direction: Direction,
    ) -> Result<Self> {
        if source.is_empty() {
            // An empty source is only meaningful as a push deletion.
            if direction == Direction::Fetch {
                return Err(invalid(refspec, "fetch refspec needs a source"));
            }
            if destination.is_empty() {
                return Err(invalid(refspec, "refspec needs a source or a destination"));
            }
        } else if destination.is_empty() && direction == Direction::Push {
            return Err(invalid(refspec, "push refspec needs a destination"));
        }

        for side in [source, destination] {
            if !side.is_empty() {
                validate_refspec_side(side).map_err(|err| invalid(refspec, err.to_string()))?;
            }
        }

        let src_glob = Side::of(source).is_glob();
        let dst_glob = Side::of(destination).is_glob();
        if !source.is_empty() && !destination.is_empty() && src_glob != dst_glob {
            return Err(invalid(
                refspec,
                "a wildcard on one side requires a wildcard on the other",
            ));
        }
        if source.is_empty() && dst_glob {
            return Err(invalid(refspec, "a deletion refspec cannot use a wildcard"));
        }

        Ok(Self {
            source: source.to_string(),
            destination: destination.to_string(),
            force,
            direction,
        })
    }

    /// Returns `true` if `name` matches the source pattern.
    pub fn matches_source(&self, name: &str) -> bool {
        Side::of(&self.source).capture(name).is_some()
    }

    /// Returns `true` if `name` matches the destination pattern.
    pub fn matches_destination(&self, name: &str) -> bool {
        Side::of(&self.destination).capture(name).is_some()
    }

    /// Map a name matching the source onto the destination.
    ///
    /// Fails with [`RefspecError::PatternMismatch`] if `name` does not match
    /// the source.
    pub fn transform(&self, name: &str) -> Result<String> {
        map_name(&self.source, &self.destination, name)
    }

    /// Map a name matching the destination back onto the source.
    ///
    /// Fails with [`RefspecError::PatternMismatch`] if `name` does not match
    /// the destination.
    pub fn reverse_transform(&self, name: &str) -> Result<String> {
        map_name(&self.destination, &self.source, name)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Whether non-fast-forward updates are permitted.
    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the source (and therefore the destination) uses a wildcard.
    pub fn is_wildcard(&self) -> bool {
        Side::of(&self.source).is_glob()
    }

    /// Whether this is a push refspec that deletes its destination.
    pub fn is_deletion(&self) -> bool {
        self.direction == Direction::Push && self.source.is_empty()
    }
}

fn map_name(from: &str, to: &str, name: &str) -> Result<String> {
    let mismatch = || RefspecError::PatternMismatch {
        name: name.to_string(),
        pattern: from.to_string(),
    };
    let (from_side, to_side) = (Side::of(from), Side::of(to));
    // A literal side captures nothing, so it cannot fill a wildcard. This
    // only happens when mapping back from the empty destination of a fetch
    // refspec.
    if !from_side.is_glob() && to_side.is_glob() {
        return Err(mismatch());
    }
    let capture = from_side.capture(name).ok_or_else(mismatch)?;
    Ok(to_side.expand(to, capture, name.len()))
}

fn invalid(refspec: &str, reason: impl Into<String>) -> RefspecError {
    RefspecError::InvalidPattern {
        refspec: refspec.to_string(),
        reason: reason.into(),
    }
}

fn render(source: &str, destination: &str, force: bool, direction: Direction) -> String {
    let plus = if force { "+" } else { "" };
    if destination.is_empty() && direction == Direction::Fetch {
        format!("{plus}{source}")
    } else {
        format!("{plus}{source}:{destination}")
    }
}

impl fmt::Display for RefspecPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.source, &self.destination, self.force, self.direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracking() -> RefspecPattern {
        RefspecPattern::fetch("+refs/heads/*:refs/remotes/origin/*").unwrap()
    }

    #[test]
    fn parse_forced_wildcard() {
        let spec = tracking();
        assert!(spec.is_forced());
        assert!(spec.is_wildcard());
        assert_eq!(spec.source(), "refs/heads/*");
        assert_eq!(spec.destination(), "refs/remotes/origin/*");
        assert_eq!(spec.direction(), Direction::Fetch);
    }

    #[test]
    fn parse_without_force() {
        let spec = RefspecPattern::push("refs/heads/main:refs/heads/main").unwrap();
        assert!(!spec.is_forced());
        assert!(!spec.is_wildcard());
        assert_eq!(spec.direction(), Direction::Push);
    }

    #[test]
    fn push_without_colon_maps_to_itself() {
        let spec = RefspecPattern::push("refs/heads/main").unwrap();
        assert_eq!(spec.destination(), "refs/heads/main");
        assert_eq!(spec.to_string(), "refs/heads/main:refs/heads/main");
    }

    #[test]
    fn fetch_without_colon_has_empty_destination() {
        let spec = RefspecPattern::fetch("refs/heads/main").unwrap();
        assert_eq!(spec.destination(), "");
        assert_eq!(spec.to_string(), "refs/heads/main");
        assert_eq!(spec.transform("refs/heads/main").unwrap(), "");
    }

    #[test]
    fn push_deletion() {
        let spec = RefspecPattern::push(":refs/heads/topic").unwrap();
        assert!(spec.is_deletion());
        assert_eq!(spec.to_string(), ":refs/heads/topic");
        assert!(RefspecPattern::fetch(":refs/heads/topic").is_err());
        assert!(RefspecPattern::push(":refs/heads/*").is_err());
    }

    #[test]
    fn canonical_string_form() {
        assert_eq!(tracking().to_string(), "+refs/heads/*:refs/remotes/origin/*");
        let spec = RefspecPattern::new("refs/heads/a", "refs/heads/b", false, Direction::Push).unwrap();
        assert_eq!(spec.to_string(), "refs/heads/a:refs/heads/b");
    }

    #[test]
    fn reject_empty_refspecs() {
        assert!(RefspecPattern::fetch("").is_err());
        assert!(RefspecPattern::fetch("+").is_err());
        assert!(RefspecPattern::push(":").is_err());
    }

    #[test]
    fn reject_multiple_wildcards_at_construction() {
        let err = RefspecPattern::fetch("refs/*/heads/*:refs/remotes/*").unwrap_err();
        assert!(matches!(err, RefspecError::InvalidPattern { .. }));
        assert!(RefspecPattern::fetch("refs/heads/*:refs/*/x/*").is_err());
    }

    #[test]
    fn reject_unbalanced_wildcards() {
        assert!(RefspecPattern::fetch("refs/heads/*:refs/remotes/origin/main").is_err());
        assert!(RefspecPattern::fetch("refs/heads/main:refs/remotes/origin/*").is_err());
    }

    #[test]
    fn reject_malformed_names() {
        assert!(RefspecPattern::fetch("refs/heads/a..b:refs/x").is_err());
        assert!(RefspecPattern::push("refs/heads/has space").is_err());
        assert!(RefspecPattern::push("a:b:c").is_err());
    }

    #[test]
    fn literal_matches_only_itself() {
        let spec = RefspecPattern::push("refs/heads/main:refs/heads/prod").unwrap();
        assert!(spec.matches_source("refs/heads/main"));
        assert!(!spec.matches_source("refs/heads/main2"));
        assert!(!spec.matches_source(""));
        assert!(spec.matches_destination("refs/heads/prod"));
        assert!(!spec.matches_destination("refs/heads/main"));
    }

    #[test]
    fn wildcard_matching() {
        let spec = tracking();
        assert!(spec.matches_source("refs/heads/main"));
        assert!(spec.matches_source("refs/heads/feature/deep"));
        assert!(!spec.matches_source("refs/tags/v1"));
        assert!(spec.matches_destination("refs/remotes/origin/main"));
        assert!(!spec.matches_destination("refs/heads/main"));
    }

    #[test]
    fn wildcard_matches_empty_capture() {
        let spec = tracking();
        assert!(spec.matches_source("refs/heads/"));
        assert_eq!(spec.transform("refs/heads/").unwrap(), "refs/remotes/origin/");
        assert!(!spec.matches_source(""));
    }

    #[test]
    fn prefix_and_suffix_must_not_overlap() {
        let spec = RefspecPattern::fetch("refs/a*a:refs/b*b").unwrap();
        assert!(spec.matches_source("refs/aa"));
        assert!(!spec.matches_source("refs/a"));
        assert_eq!(spec.transform("refs/axya").unwrap(), "refs/bxyb");
    }

    #[test]
    fn mid_component_wildcard() {
        let spec = RefspecPattern::fetch("refs/heads/feat-*:refs/remotes/up/f-*").unwrap();
        assert_eq!(spec.transform("refs/heads/feat-login").unwrap(), "refs/remotes/up/f-login");
        assert!(!spec.matches_source("refs/heads/fix-login"));
    }

    #[test]
    fn transform_and_reverse() {
        let spec = tracking();
        assert_eq!(spec.transform("refs/heads/main").unwrap(), "refs/remotes/origin/main");
        assert_eq!(
            spec.reverse_transform("refs/remotes/origin/main").unwrap(),
            "refs/heads/main"
        );
    }

    #[test]
    fn literal_transform_returns_destination() {
        let spec = RefspecPattern::fetch("refs/heads/main:refs/remotes/origin/trunk").unwrap();
        assert_eq!(spec.transform("refs/heads/main").unwrap(), "refs/remotes/origin/trunk");
        assert_eq!(spec.reverse_transform("refs/remotes/origin/trunk").unwrap(), "refs/heads/main");
    }

    #[test]
    fn transform_mismatch() {
        let err = tracking().transform("refs/tags/v1").unwrap_err();
        assert_eq!(
            err,
            RefspecError::PatternMismatch {
                name: "refs/tags/v1".into(),
                pattern: "refs/heads/*".into(),
            }
        );
        assert!(tracking().reverse_transform("refs/heads/main").is_err());
    }

    #[test]
    fn transform_fits_precomputed_bound() {
        let spec = tracking();
        for name in ["refs/heads/", "refs/heads/x", "refs/heads/very/long/branch/name"] {
            let out = spec.transform(name).unwrap();
            let bound = spec.destination().len() + name.len() + 1;
            assert!(out.len() < bound);
            assert!(out.capacity() <= bound);

            let back = spec.reverse_transform(&out).unwrap();
            assert!(back.capacity() <= spec.source().len() + out.len() + 1);
        }
    }

    #[test]
    fn push_refspec_with_empty_destination_is_invalid() {
        let err = RefspecPattern::push("refs/heads/main:").unwrap_err();
        assert!(matches!(err, RefspecError::InvalidPattern { .. }));
        assert!(RefspecPattern::push("+refs/heads/*:").is_err());
        assert!(RefspecPattern::new("refs/heads/main", "", false, Direction::Push).is_err());
        // Fetch refspecs may still omit the destination.
        assert!(RefspecPattern::fetch("refs/heads/main:").is_ok());
    }

    #[test]
    fn reverse_transform_of_destinationless_wildcard_is_mismatch() {
        let spec = RefspecPattern::fetch("refs/heads/*").unwrap();
        let err = spec.reverse_transform("").unwrap_err();
        assert!(matches!(err, RefspecError::PatternMismatch { .. }));
        assert!(spec.reverse_transform("refs/heads/main").is_err());
        // The literal form still maps back to its source.
        let literal = RefspecPattern::fetch("refs/tags/v1").unwrap();
        assert_eq!(literal.reverse_transform("").unwrap(), "refs/tags/v1");
    }

    #[test]
    fn non_ascii_names() {
        let spec = tracking();
        assert_eq!(spec.transform("refs/heads/café").unwrap(), "refs/remotes/origin/café");
    }
}
