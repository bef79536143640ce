//! Named insertion primitives and the conditional-comment seam.
//!
//! The loader never renders markup itself. Hosts register one primitive per kind of
//! reference (script, stylesheet, ...) under the name pages use to request it, and
//! optionally supply an emitter that wraps references in legacy-browser conditional
//! comments.

use std::collections::BTreeMap;

/// Primitive name conventionally used for script references.
pub const INSERT_SCRIPT: &str = "insertScript";

/// Primitive name conventionally used for stylesheet references.
pub const INSERT_CSS: &str = "insertCSS";

/// Emits one reference for one path.
pub trait InsertionPrimitive {
  /// Insert a reference to `path`, qualified by `media` when provided.
  fn insert(&mut self, path: &str, media: Option<&str>);
}

impl<F> InsertionPrimitive for F
where
  F: FnMut(&str, Option<&str>),
{
  fn insert(&mut self, path: &str, media: Option<&str>) {
    self(path, media)
  }
}

/// Wraps a reference in a conditional comment gated by `expression`.
pub trait ConditionalCommentEmitter {
  /// Emit the gated reference. `primitive` is the one registered as `func`.
  fn insert_cond_comment(
    &mut self,
    expression: &str,
    func: &str,
    primitive: &mut dyn InsertionPrimitive,
    path: &str,
    media: Option<&str>,
  );
}

/// Emitter for hosts without conditional comment support: forwards to the primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegatingEmitter;

impl ConditionalCommentEmitter for DelegatingEmitter {
  fn insert_cond_comment(
    &mut self,
    _expression: &str,
    _func: &str,
    primitive: &mut dyn InsertionPrimitive,
    path: &str,
    media: Option<&str>,
  ) {
    primitive.insert(path, media);
  }
}

/// Errors raised while registering a primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
  /// Primitive names must contain at least one non-whitespace character.
  EmptyName,
  /// A primitive with this name is already registered.
  DuplicatePrimitive(String),
}

impl std::fmt::Display for RegistryError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::EmptyName => write!(f, "insertion primitive name must not be empty"),
      Self::DuplicatePrimitive(name) => {
        write!(f, "insertion primitive {name:?} is already registered")
      }
    }
  }
}

impl std::error::Error for RegistryError {}

/// Mapping from primitive name to its implementation.
#[derive(Default)]
pub struct PrimitiveRegistry {
  primitives: BTreeMap<String, Box<dyn InsertionPrimitive>>,
}

impl PrimitiveRegistry {
  /// Empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `primitive` under `name`.
  pub fn register(
    &mut self,
    name: impl Into<String>,
    primitive: impl InsertionPrimitive + 'static,
  ) -> Result<(), RegistryError> {
    let name = name.into();
    if name.trim().is_empty() {
      return Err(RegistryError::EmptyName);
    }
    if self.primitives.contains_key(&name) {
      return Err(RegistryError::DuplicatePrimitive(name));
    }
    self.primitives.insert(name, Box::new(primitive));
    Ok(())
  }

  /// Whether a primitive is registered under `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.primitives.contains_key(name)
  }

  /// Registered names in sorted order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.primitives.keys().map(String::as_str)
  }

  pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn InsertionPrimitive>> {
    self.primitives.get_mut(name)
  }
}

impl std::fmt::Debug for PrimitiveRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PrimitiveRegistry")
      .field("names", &self.primitives.keys().collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;

  #[test]
  fn rejects_empty_and_duplicate_names() {
    let mut registry = PrimitiveRegistry::new();
    registry
      .register(INSERT_SCRIPT, |_: &str, _: Option<&str>| {})
      .unwrap();

    assert_eq!(
      registry.register("  ", |_: &str, _: Option<&str>| {}),
      Err(RegistryError::EmptyName)
    );
    assert_eq!(
      registry.register(INSERT_SCRIPT, |_: &str, _: Option<&str>| {}),
      Err(RegistryError::DuplicatePrimitive(INSERT_SCRIPT.to_string()))
    );
    assert_eq!(registry.names().collect::<Vec<_>>(), vec![INSERT_SCRIPT]);
  }

  #[test]
  fn registered_primitive_is_callable_by_name() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let mut registry = PrimitiveRegistry::new();
    registry
      .register(INSERT_CSS, move |path: &str, media: Option<&str>| {
        sink
          .borrow_mut()
          .push((path.to_string(), media.map(str::to_string)));
      })
      .unwrap();

    assert!(registry.contains(INSERT_CSS));
    assert!(!registry.contains(INSERT_SCRIPT));
    registry
      .get_mut(INSERT_CSS)
      .unwrap()
      .insert("/css/a.css", Some("print"));

    assert_eq!(calls.borrow().as_slice(), [(
      "/css/a.css".to_string(),
      Some("print".to_string())
    )]);
  }

  #[test]
  fn delegating_emitter_forwards_arguments() {
    let mut seen = Vec::new();
    let mut primitive = |path: &str, media: Option<&str>| {
      seen.push(format!("{path}|{}", media.unwrap_or("-")));
    };
    DelegatingEmitter.insert_cond_comment("lt IE 7", INSERT_SCRIPT, &mut primitive, "/a.js", None);
    assert_eq!(seen, vec!["/a.js|-".to_string()]);
  }
}
