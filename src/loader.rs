//! Page-scoped bundle injection.
//!
//! A [`Loader`] lives for exactly one page. Every resource reference found while the
//! page is rendered goes through [`Loader::insert`], which resolves the bundles the path
//! belongs to and drives the requested primitive once per reference. Bundles are
//! injected at most once: the name is recorded before any primitive runs and stays
//! recorded until the loader is dropped.

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use crate::bundle::{Bundle, BundleKind, BundleMembership};
use crate::cache_bust::CacheBuster;
use crate::catalog::BundleCatalog;
use crate::config::LoaderConfig;
use crate::primitives::{ConditionalCommentEmitter, DelegatingEmitter, PrimitiveRegistry};

/// Errors returned by [`Loader::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
  /// A bundle matched but no primitive is registered under the requested name.
  UnknownPrimitive(String),
}

impl std::fmt::Display for LoaderError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::UnknownPrimitive(name) => write!(f, "no insertion primitive named {name:?}"),
    }
  }
}

impl std::error::Error for LoaderError {}

/// Names of the bundles already injected on the current page.
#[derive(Debug, Clone, Default)]
pub struct UsedBundles {
  names: BTreeSet<String>,
}

impl UsedBundles {
  /// Returns `true` when the bundle was already injected.
  pub fn contains(&self, name: &str) -> bool {
    self.names.contains(name)
  }

  /// Record `name`, returning `false` when it was already present.
  fn mark(&mut self, name: &str) -> bool {
    self.names.insert(name.to_string())
  }

  /// Injected bundle names in sorted order.
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }

  /// Number of injected bundles.
  pub fn len(&self) -> usize {
    self.names.len()
  }

  /// Whether nothing was injected yet.
  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

/// Mutable state touched while injecting, kept apart from the catalog so the catalog can
/// be borrowed during an injection.
struct Injector {
  used: UsedBundles,
  registry: PrimitiveRegistry,
  emitter: Box<dyn ConditionalCommentEmitter>,
  cache_buster: CacheBuster,
}

impl Injector {
  fn insert<M: BundleMembership>(
    &mut self,
    bundles: &[Bundle<M>],
    func: &str,
    path: &str,
    media: Option<&str>,
  ) -> Result<(), LoaderError> {
    for bundle in bundles {
      if !bundle.belongs_to_bundle(path) {
        continue;
      }
      if self.used.contains(bundle.name()) {
        trace!(bundle = bundle.name(), path, "bundle already injected");
        continue;
      }

      let Some(primitive) = self.registry.get_mut(func) else {
        warn!(primitive = func, bundle = bundle.name(), "unknown insertion primitive");
        return Err(LoaderError::UnknownPrimitive(func.to_string()));
      };

      self.used.mark(bundle.name());

      match bundle.kind() {
        BundleKind::SingleFile => {
          debug!(
            bundle = bundle.name(),
            path,
            gated = bundle.ie_expression().is_some(),
            "injecting bundle"
          );
          match bundle.ie_expression() {
            Some(expression) => self.emitter.insert_cond_comment(
              expression,
              func,
              &mut **primitive,
              bundle.name(),
              media,
            ),
            None => primitive.insert(bundle.name(), media),
          }
        }
        BundleKind::Expanded { items } => {
          debug!(
            bundle = bundle.name(),
            path,
            items = items.len(),
            gated = bundle.ie_expression().is_some(),
            "injecting expanded bundle"
          );
          for item in items {
            let path_link = self.cache_buster.decorate(item);
            match bundle.ie_expression() {
              Some(expression) => self.emitter.insert_cond_comment(
                expression,
                func,
                &mut **primitive,
                &path_link,
                media,
              ),
              // Expanded items reach the primitive without the media qualifier.
              None => primitive.insert(&path_link, None),
            }
          }
        }
      }
    }

    Ok(())
  }
}

/// Resolves resource paths to bundles and injects each bundle once per page.
pub struct Loader {
  config: LoaderConfig,
  catalog: BundleCatalog,
  injector: Injector,
}

impl Loader {
  /// Loader with an empty catalog and no conditional comment support.
  pub fn new(config: LoaderConfig, registry: PrimitiveRegistry) -> Self {
    let cache_buster = config.cache_buster();
    Self {
      config,
      catalog: BundleCatalog::default(),
      injector: Injector {
        used: UsedBundles::default(),
        registry,
        emitter: Box::new(DelegatingEmitter),
        cache_buster,
      },
    }
  }

  /// Use `catalog` for [`Loader::script`], [`Loader::style`] and global bundles.
  pub fn with_catalog(mut self, catalog: BundleCatalog) -> Self {
    self.catalog = catalog;
    self
  }

  /// Route gated bundles through `emitter`.
  pub fn with_emitter(mut self, emitter: impl ConditionalCommentEmitter + 'static) -> Self {
    self.injector.emitter = Box::new(emitter);
    self
  }

  /// Seed the cache buster for a reproducible sequence of query values.
  ///
  /// `disable_random_param` from the configuration still applies.
  pub fn with_cache_buster_seed(mut self, seed: u64) -> Self {
    self.injector.cache_buster = self.config.cache_buster_seeded(seed);
    self
  }

  /// Inject every bundle of `bundles` that `path` belongs to and that was not injected yet.
  ///
  /// Bundles are visited in slice order, so a path matching several bundles injects
  /// all of them in that order. Single-file bundles produce one reference to the bundle
  /// name carrying `media`. Expanded bundles produce one cache-busted reference per
  /// item and pass no media to the primitive. Gated bundles go through the emitter,
  /// which always receives `media`.
  ///
  /// Fails with [`LoaderError::UnknownPrimitive`] when a bundle matches and `func` is
  /// not registered; that bundle is left unused.
  pub fn insert<M: BundleMembership>(
    &mut self,
    bundles: &[Bundle<M>],
    func: &str,
    path: &str,
    media: Option<&str>,
  ) -> Result<(), LoaderError> {
    self.injector.insert(bundles, func, path, media)
  }

  /// Resolve `path` against the catalog's script bundles.
  pub fn script(&mut self, path: &str) -> Result<(), LoaderError> {
    self.injector.insert(
      &self.catalog.js_bundles,
      &self.config.script_primitive,
      path,
      None,
    )
  }

  /// Resolve `path` against the catalog's stylesheet bundles.
  pub fn style(&mut self, path: &str, media: Option<&str>) -> Result<(), LoaderError> {
    self.injector.insert(
      &self.catalog.css_bundles,
      &self.config.style_primitive,
      path,
      media,
    )
  }

  /// Inject the catalog's global bundles, scripts first, each through its own name.
  pub fn load_global_bundles(&mut self) -> Result<(), LoaderError> {
    for bundle in self.catalog.js_bundles.iter().filter(|b| b.is_global()) {
      self.injector.insert(
        &self.catalog.js_bundles,
        &self.config.script_primitive,
        bundle.name(),
        None,
      )?;
    }
    for bundle in self.catalog.css_bundles.iter().filter(|b| b.is_global()) {
      self.injector.insert(
        &self.catalog.css_bundles,
        &self.config.style_primitive,
        bundle.name(),
        None,
      )?;
    }
    Ok(())
  }

  /// Whether the bundle named `name` was injected on this page.
  pub fn is_used(&self, name: &str) -> bool {
    self.injector.used.contains(name)
  }

  /// Bundles injected so far.
  pub fn used_bundles(&self) -> &UsedBundles {
    &self.injector.used
  }
}

impl std::fmt::Debug for Loader {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Loader")
      .field("config", &self.config)
      .field("used", &self.injector.used)
      .field("registry", &self.injector.registry)
      .finish_non_exhaustive()
  }
}
