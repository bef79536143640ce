//! Membership predicates deciding whether a requested path belongs to a bundle.

use std::collections::BTreeSet;

use regex::Regex;

/// Capability answering whether a resource path is part of a bundle.
///
/// The loader treats membership as opaque: catalogs built by this crate use
/// [`PathMembership`], while hosts with their own resolution rules can plug in any closure.
pub trait BundleMembership {
  /// Returns `true` when `path` should resolve to the bundle.
  fn belongs_to_bundle(&self, path: &str) -> bool;
}

impl<F> BundleMembership for F
where
  F: Fn(&str) -> bool,
{
  fn belongs_to_bundle(&self, path: &str) -> bool {
    self(path)
  }
}

/// Errors raised while compiling a mapping pattern.
#[derive(Debug)]
pub enum MembershipError {
  /// The mapping was empty or whitespace only.
  EmptyPattern,
  /// The translated pattern could not be compiled.
  InvalidPattern {
    /// Mapping as written in the catalog.
    pattern: String,
    /// Source regex error.
    source: regex::Error,
  },
}

impl std::fmt::Display for MembershipError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::EmptyPattern => write!(f, "bundle mapping must not be empty"),
      Self::InvalidPattern { pattern, source } => {
        write!(f, "invalid bundle mapping {pattern:?}: {source}")
      }
    }
  }
}

impl std::error::Error for MembershipError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::EmptyPattern => None,
      Self::InvalidPattern { source, .. } => Some(source),
    }
  }
}

/// A compiled bundle mapping such as `/js/lib/**` or `/css/*.css`.
///
/// `**` spans any number of directories, `*` stays within a single path segment and
/// everything else is matched literally.
#[derive(Debug, Clone)]
pub struct MappingPattern {
  regex: Regex,
}

impl MappingPattern {
  /// Compile a mapping into a path matcher.
  pub fn compile(pattern: &str) -> Result<Self, MembershipError> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
      return Err(MembershipError::EmptyPattern);
    }

    let regex = Regex::new(&translate_mapping(trimmed)).map_err(|source| {
      MembershipError::InvalidPattern {
        pattern: trimmed.to_string(),
        source,
      }
    })?;

    Ok(Self { regex })
  }

  /// Returns `true` when `path` falls under the mapping.
  pub fn matches(&self, path: &str) -> bool {
    self.regex.is_match(path)
  }
}

fn translate_mapping(pattern: &str) -> String {
  let mut expression = String::from("^");
  let mut rest = pattern;

  while let Some(index) = rest.find('*') {
    expression.push_str(&regex::escape(&rest[..index]));
    rest = &rest[index..];
    if let Some(after) = rest.strip_prefix("**") {
      expression.push_str(".*");
      rest = after;
    } else {
      expression.push_str("[^/]*");
      rest = &rest[1..];
    }
  }

  expression.push_str(&regex::escape(rest));
  expression.push('$');
  expression
}

/// Default membership used by catalog bundles.
///
/// A path belongs to the bundle when it is the bundle name itself, one of its member
/// paths, or falls under one of its mappings.
#[derive(Debug, Clone, Default)]
pub struct PathMembership {
  members: BTreeSet<String>,
  mappings: Vec<MappingPattern>,
}

impl PathMembership {
  /// Membership containing the provided paths.
  pub fn new<I, S>(members: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      members: members.into_iter().map(Into::into).collect(),
      mappings: Vec::new(),
    }
  }

  /// Add explicit member paths.
  pub fn extend_members<I, S>(&mut self, members: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.members.extend(members.into_iter().map(Into::into));
  }

  /// Compile and add a mapping.
  pub fn add_mapping(&mut self, pattern: &str) -> Result<(), MembershipError> {
    self.mappings.push(MappingPattern::compile(pattern)?);
    Ok(())
  }
}

impl BundleMembership for PathMembership {
  fn belongs_to_bundle(&self, path: &str) -> bool {
    self.members.contains(path) || self.mappings.iter().any(|mapping| mapping.matches(path))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn double_star_matches_nested_paths() {
    let mapping = MappingPattern::compile("/js/lib/**").unwrap();
    assert!(mapping.matches("/js/lib/jquery.js"));
    assert!(mapping.matches("/js/lib/plugins/menu.js"));
    assert!(!mapping.matches("/js/app.js"));
  }

  #[test]
  fn single_star_stays_within_a_segment() {
    let mapping = MappingPattern::compile("/js/*").unwrap();
    assert!(mapping.matches("/js/app.js"));
    assert!(!mapping.matches("/js/lib/jquery.js"));

    let suffix = MappingPattern::compile("/css/*.css").unwrap();
    assert!(suffix.matches("/css/site.css"));
    assert!(!suffix.matches("/css/site.less"));
  }

  #[test]
  fn literal_mapping_matches_exactly() {
    let mapping = MappingPattern::compile("/js/app.js").unwrap();
    assert!(mapping.matches("/js/app.js"));
    assert!(!mapping.matches("/js/app.jsx"));
    assert!(!mapping.matches("/js/appXjs"));
  }

  #[test]
  fn rejects_blank_mappings() {
    assert!(matches!(
      MappingPattern::compile("   "),
      Err(MembershipError::EmptyPattern)
    ));
  }

  #[test]
  fn path_membership_checks_members_then_mappings() {
    let mut membership = PathMembership::new(["/bundles/lib.js", "/js/a.js"]);
    membership.add_mapping("/js/vendor/**").unwrap();

    assert!(membership.belongs_to_bundle("/bundles/lib.js"));
    assert!(membership.belongs_to_bundle("/js/a.js"));
    assert!(membership.belongs_to_bundle("/js/vendor/x/y.js"));
    assert!(!membership.belongs_to_bundle("/js/b.js"));
  }

  #[test]
  fn closures_act_as_membership() {
    let starts_with_js = |path: &str| path.starts_with("/js/");
    assert!(starts_with_js.belongs_to_bundle("/js/a.js"));
    assert!(!starts_with_js.belongs_to_bundle("/css/a.css"));
  }
}
