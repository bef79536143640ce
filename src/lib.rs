#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod bundle;
pub mod cache_bust;
pub mod catalog;
pub mod config;
pub mod loader;
pub mod primitives;

pub use bundle::{Bundle, BundleKind, BundleMembership, MembershipError, PathMembership};
pub use cache_bust::CacheBuster;
pub use catalog::BundleCatalog;
pub use config::LoaderConfig;
pub use loader::{Loader, LoaderError, UsedBundles};
pub use primitives::{
  ConditionalCommentEmitter, DelegatingEmitter, INSERT_CSS, INSERT_SCRIPT, InsertionPrimitive,
  PrimitiveRegistry, RegistryError,
};
