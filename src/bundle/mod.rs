//! Bundle descriptions consumed by the loader.

mod membership;

pub use membership::{BundleMembership, MappingPattern, MembershipError, PathMembership};

/// How a bundle is referenced on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleKind {
  /// Production mode: the bundle is referenced once by its name.
  SingleFile,
  /// Debug mode: each item is referenced individually, in list order.
  Expanded {
    /// Item paths making up the bundle.
    items: Vec<String>,
  },
}

/// A named group of resources resolved by the loader.
#[derive(Debug, Clone)]
pub struct Bundle<M = PathMembership> {
  name: String,
  kind: BundleKind,
  ie_expression: Option<String>,
  global: bool,
  membership: M,
}

impl Bundle {
  /// A production bundle referenced by its name only.
  pub fn single_file(name: impl Into<String>) -> Self {
    let name = name.into();
    Self {
      membership: PathMembership::new([name.clone()]),
      name,
      kind: BundleKind::SingleFile,
      ie_expression: None,
      global: false,
    }
  }

  /// A debug bundle expanded into its items. Every item is also a member.
  pub fn expanded<I, S>(name: impl Into<String>, items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let name = name.into();
    let items: Vec<String> = items.into_iter().map(Into::into).collect();
    let mut membership = PathMembership::new([name.clone()]);
    membership.extend_members(items.iter().cloned());

    Self {
      name,
      kind: BundleKind::Expanded { items },
      ie_expression: None,
      global: false,
      membership,
    }
  }

  /// Add member paths beyond the bundle name and items.
  pub fn with_members<I, S>(mut self, members: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.membership.extend_members(members);
    self
  }

  /// Add a mapping such as `/js/lib/**` to the bundle membership.
  pub fn with_mapping(mut self, pattern: &str) -> Result<Self, MembershipError> {
    self.membership.add_mapping(pattern)?;
    Ok(self)
  }
}

impl<M> Bundle<M> {
  /// Replace the membership predicate.
  pub fn with_membership<N>(self, membership: N) -> Bundle<N> {
    Bundle {
      name: self.name,
      kind: self.kind,
      ie_expression: self.ie_expression,
      global: self.global,
      membership,
    }
  }

  /// Gate every reference of this bundle behind a conditional comment.
  pub fn with_ie_expression(mut self, expression: impl Into<String>) -> Self {
    self.ie_expression = Some(expression.into());
    self
  }

  /// Flag the bundle for inclusion on every page.
  pub fn into_global(mut self) -> Self {
    self.global = true;
    self
  }

  /// Bundle name, also the de-duplication key.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Reference mode.
  pub fn kind(&self) -> &BundleKind {
    &self.kind
  }

  /// Items of an expanded bundle, `None` for single-file bundles.
  pub fn item_paths(&self) -> Option<&[String]> {
    match &self.kind {
      BundleKind::SingleFile => None,
      BundleKind::Expanded { items } => Some(items),
    }
  }

  /// Conditional comment expression, if any.
  pub fn ie_expression(&self) -> Option<&str> {
    self.ie_expression.as_deref()
  }

  /// Whether the bundle is included on every page.
  pub fn is_global(&self) -> bool {
    self.global
  }
}

impl<M: BundleMembership> Bundle<M> {
  /// Returns `true` when `path` resolves to this bundle.
  pub fn belongs_to_bundle(&self, path: &str) -> bool {
    self.membership.belongs_to_bundle(path)
  }
}
