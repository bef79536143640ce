//! Bundle catalog handed to the loader by the server-side bundler.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use crate::bundle::Bundle;

/// On-disk catalog layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CatalogFile {
  js_bundles: Vec<BundleRecord>,
  css_bundles: Vec<BundleRecord>,
}

/// Single bundle as written in the catalog.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleRecord {
  name: String,
  #[serde(default)]
  items: Option<Vec<String>>,
  #[serde(default)]
  members: Vec<String>,
  #[serde(default)]
  mappings: Vec<String>,
  #[serde(default)]
  ie_expression: Option<String>,
  #[serde(default)]
  global: bool,
}

impl BundleRecord {
  fn into_bundle(self) -> Result<Bundle> {
    let mut bundle = match self.items {
      Some(items) => Bundle::expanded(self.name, items),
      None => Bundle::single_file(self.name),
    };
    bundle = bundle.with_members(self.members);

    for mapping in &self.mappings {
      bundle = bundle
        .with_mapping(mapping)
        .with_context(|| format!("invalid mapping {mapping:?}"))?;
    }
    if let Some(expression) = self.ie_expression {
      bundle = bundle.with_ie_expression(expression);
    }
    if self.global {
      bundle = bundle.into_global();
    }
    Ok(bundle)
  }
}

/// Script and stylesheet bundles available to a page, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct BundleCatalog {
  /// Script bundles.
  pub js_bundles: Vec<Bundle>,
  /// Stylesheet bundles.
  pub css_bundles: Vec<Bundle>,
}

impl BundleCatalog {
  /// Load a catalog from disk. `.yaml`/`.yml` files are read as YAML, anything else as JSON.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("bundle catalog not found at {}", path.display()))?;

    let is_yaml = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let catalog = if is_yaml {
      Self::from_yaml_str(&content)
    } else {
      Self::from_json_str(&content)
    }
    .with_context(|| format!("failed to load bundle catalog {}", path.display()))?;

    debug!(
      path = %path.display(),
      js = catalog.js_bundles.len(),
      css = catalog.css_bundles.len(),
      "loaded bundle catalog"
    );
    Ok(catalog)
  }

  /// Parse a JSON catalog.
  pub fn from_json_str(content: &str) -> Result<Self> {
    let file: CatalogFile =
      serde_json::from_str(content).context("failed to parse bundle catalog JSON")?;
    Self::try_from(file)
  }

  /// Parse a YAML catalog.
  pub fn from_yaml_str(content: &str) -> Result<Self> {
    let file: CatalogFile =
      serde_yaml::from_str(content).context("failed to parse bundle catalog YAML")?;
    Self::try_from(file)
  }
}

impl TryFrom<CatalogFile> for BundleCatalog {
  type Error = anyhow::Error;

  fn try_from(file: CatalogFile) -> Result<Self> {
    Ok(Self {
      js_bundles: build_bundles("jsBundles", file.js_bundles)?,
      css_bundles: build_bundles("cssBundles", file.css_bundles)?,
    })
  }
}

fn build_bundles(section: &str, records: Vec<BundleRecord>) -> Result<Vec<Bundle>> {
  let mut seen = BTreeSet::new();
  let mut bundles = Vec::with_capacity(records.len());

  for mut record in records {
    let name = record.name.trim().to_string();
    if name.is_empty() {
      bail!("{section} contains a bundle without a name");
    }
    if !seen.insert(name.clone()) {
      bail!("{section} declares bundle {name} more than once");
    }
    record.name = name.clone();
    let bundle = record
      .into_bundle()
      .with_context(|| format!("failed to build bundle {name} in {section}"))?;
    bundles.push(bundle);
  }

  Ok(bundles)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bundle::BundleKind;
  use tempfile::tempdir;

  const JSON_CATALOG: &str = r#"{
    "jsBundles": [
      {"name": "/bundles/lib.js", "global": true},
      {"name": "/bundles/app.js", "items": ["/js/b.js", "/js/a.js"], "mappings": ["/js/app/**"]},
      {"name": "/bundles/ie.js", "items": ["/js/ie/fix.js"], "ieExpression": "lt IE 7"}
    ],
    "cssBundles": [
      {"name": "/bundles/site.css", "members": ["/css/site.css"], "global": true}
    ]
  }"#;

  #[test]
  fn parses_json_catalog_in_order() {
    let catalog = BundleCatalog::from_json_str(JSON_CATALOG).unwrap();

    let names: Vec<_> = catalog.js_bundles.iter().map(Bundle::name).collect();
    assert_eq!(names, ["/bundles/lib.js", "/bundles/app.js", "/bundles/ie.js"]);

    let app = &catalog.js_bundles[1];
    assert_eq!(app.kind(), &BundleKind::Expanded {
      items: vec!["/js/b.js".into(), "/js/a.js".into()]
    });
    assert!(app.belongs_to_bundle("/js/app/views/list.js"));
    assert_eq!(catalog.js_bundles[2].ie_expression(), Some("lt IE 7"));
    assert!(catalog.css_bundles[0].belongs_to_bundle("/css/site.css"));
  }

  #[test]
  fn reads_global_flags() {
    let catalog = BundleCatalog::from_json_str(JSON_CATALOG).unwrap();
    let globals: Vec<_> = catalog
      .js_bundles
      .iter()
      .chain(&catalog.css_bundles)
      .filter(|bundle| bundle.is_global())
      .map(Bundle::name)
      .collect();
    assert_eq!(globals, ["/bundles/lib.js", "/bundles/site.css"]);
  }

  #[test]
  fn parses_yaml_catalog_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bundles.yml");
    fs::write(
      &path,
      "jsBundles:\n  - name: /bundles/app.js\n    items:\n      - /js/a.js\n      - /js/b.js\n",
    )
    .unwrap();

    let catalog = BundleCatalog::from_path(&path).unwrap();
    assert_eq!(catalog.js_bundles.len(), 1);
    assert!(catalog.css_bundles.is_empty());
    assert_eq!(
      catalog.js_bundles[0].item_paths().unwrap(),
      ["/js/a.js", "/js/b.js"]
    );
  }

  #[test]
  fn rejects_duplicate_bundle_names() {
    let error = BundleCatalog::from_json_str(
      r#"{"jsBundles": [{"name": "/b.js"}, {"name": "/b.js", "items": []}]}"#,
    )
    .unwrap_err();
    assert!(error.to_string().contains("more than once"));
  }

  #[test]
  fn reports_invalid_mappings_with_bundle_name() {
    let error =
      BundleCatalog::from_json_str(r#"{"cssBundles": [{"name": "/b.css", "mappings": [" "]}]}"#)
        .unwrap_err();
    assert!(format!("{error:#}").contains("/b.css"));
  }

  #[test]
  fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let error = BundleCatalog::from_path(&dir.path().join("missing.json")).unwrap_err();
    assert!(error.to_string().contains("bundle catalog not found"));
  }
}
