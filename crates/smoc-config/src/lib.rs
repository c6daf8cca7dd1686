//! smoc-config
//!
//! Configuration for the menu-order tools, read from one or more YAML layers.
//! Each layer is overlaid on the ones before it, key by key. The merged tree
//! is written out as canonical JSON and fingerprinted with SHA-256, so two
//! runs that print the same `config_hash` saw the same settings.
//!
//! Nonces and credentials are supplied per record at edit time. A layer that
//! carries something shaped like an API token is refused outright.

mod reorder;

pub use reorder::{ReorderConfig, DEFAULT_ACTION, ENV_ENDPOINT, ENV_RECORD_TYPE};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

/// Token shapes refused in config, with the kind reported on refusal.
const SECRET_SHAPES: &[(&str, &str)] = &[
    ("sk-", "openai-key"),
    ("sk_live", "stripe-live-key"),
    ("sk_test", "stripe-test-key"),
    ("AKIA", "aws-access-key"),
    ("-----BEGIN", "pem-block"),
    ("ghp_", "github-token"),
    ("glpat-", "gitlab-token"),
    ("xoxb-", "slack-bot-token"),
];

/// Shorter strings are never treated as tokens ("sk-1" is a fine label).
const MIN_SECRET_LEN: usize = 8;

/// Keys read by [`ReorderConfig::from_config_json`]. A leaf at or below one
/// of these pointers is in use.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/reorder/record_type",
    "/reorder/endpoint",
    "/reorder/action",
];

const UNUSED_PREVIEW: usize = 12;

// ---------------------------------------------------------------------------
// Unused keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    /// Return the report; the caller logs it.
    Warn,
    /// Any unused leaf is an error.
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// [`CONSUMED_POINTERS`] in canonical form, sorted.
    pub consumed_prefixes: Vec<String>,
    /// Leaves no consumed pointer covers, sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// List the config leaves nothing reads.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut consumed_prefixes: Vec<String> =
        CONSUMED_POINTERS.iter().map(|p| normalize_pointer(p)).collect();
    consumed_prefixes.sort();
    consumed_prefixes.dedup();

    let mut unused_leaf_pointers: Vec<String> = leaf_pointers(config_json)
        .into_iter()
        .filter(|leaf| !consumed_prefixes.iter().any(|p| covers(p, leaf)))
        .collect();
    unused_leaf_pointers.sort();
    unused_leaf_pointers.dedup();

    if policy == UnusedKeyPolicy::Fail && !unused_leaf_pointers.is_empty() {
        let shown: Vec<&str> = unused_leaf_pointers
            .iter()
            .take(UNUSED_PREVIEW)
            .map(String::as_str)
            .collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused leaf key(s) in config; delete them or add \
            their pointer to CONSUMED_POINTERS: {}",
            unused_leaf_pointers.len(),
            shown.join(", ")
        );
    }

    Ok(UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers,
    })
}

// ---------------------------------------------------------------------------
// JSON pointers
// ---------------------------------------------------------------------------

/// One leading slash, no empty segments. The root is "/".
fn normalize_pointer(p: &str) -> String {
    let segments: Vec<&str> = p.trim().split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// `prefix` is `leaf` itself or one of its ancestors ("/a/b" covers
/// "/a/b/c", not "/a/bc").
fn covers(prefix: &str, leaf: &str) -> bool {
    prefix == "/"
        || leaf
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Calls `visit` with the pointer and value of every scalar in `v`, depth
/// first. Empty objects and arrays have no leaves; a scalar root is "/".
fn visit_leaves(v: &Value, visit: &mut dyn FnMut(&str, &Value)) {
    fn walk(v: &Value, at: &mut String, visit: &mut dyn FnMut(&str, &Value)) {
        let mark = at.len();
        match v {
            Value::Object(map) => {
                for (key, child) in map {
                    at.push('/');
                    at.push_str(&key.replace('~', "~0").replace('/', "~1"));
                    walk(child, at, visit);
                    at.truncate(mark);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    at.push('/');
                    at.push_str(&i.to_string());
                    walk(child, at, visit);
                    at.truncate(mark);
                }
            }
            _ => visit(if at.is_empty() { "/" } else { at.as_str() }, v),
        }
    }
    walk(v, &mut String::new(), visit);
}

fn leaf_pointers(v: &Value) -> Vec<String> {
    let mut out = Vec::new();
    visit_leaves(v, &mut |ptr, _| out.push(ptr.to_string()));
    out
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A merged configuration and its fingerprint.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Lowercase hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    /// Compact JSON, keys sorted.
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed reorder section, with environment overrides applied.
    pub fn reorder(&self) -> Result<ReorderConfig> {
        Ok(ReorderConfig::from_config_json(&self.config_json)?.with_env_overrides())
    }
}

pub fn load_layered_yaml<P: AsRef<str>>(paths: &[P]) -> Result<LoadedConfig> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let doc = fs::read_to_string(path)
            .with_context(|| format!("cannot read config layer {path}"))?;
        docs.push(doc);
    }
    let layers: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&layers)
}

/// Overlay the layers in order. Blank layers are skipped.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (n, doc) in yaml_docs.iter().enumerate() {
        if doc.trim().is_empty() {
            continue;
        }
        let yaml: serde_yaml::Value = serde_yaml::from_str(doc)
            .with_context(|| format!("config layer {} is not valid yaml", n + 1))?;
        let layer = serde_json::to_value(yaml)
            .with_context(|| format!("config layer {} has no json form", n + 1))?;
        overlay(&mut merged, layer);
    }

    refuse_secret_literals(&merged)?;

    // serde_json::Map keeps keys sorted, so layer key order does not reach
    // the hash.
    let canonical_json = serde_json::to_string(&merged).context("serializing merged config")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other layer value replaces what is there.
/// A null over an object (a `~` layer or key) leaves it alone.
fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                overlay(base_map.entry(key).or_insert(Value::Null), value);
            }
        }
        (Value::Object(_), Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

fn refuse_secret_literals(v: &Value) -> Result<()> {
    let mut found: Option<(String, &'static str)> = None;
    visit_leaves(v, &mut |ptr, leaf| {
        if found.is_none() {
            if let Some(kind) = leaf.as_str().and_then(secret_kind) {
                found = Some((ptr.to_string(), kind));
            }
        }
    });
    match found {
        Some((leaf, kind)) => {
            bail!("CONFIG_SECRET_DETECTED leaf={leaf} kind={kind} value=REDACTED")
        }
        None => Ok(()),
    }
}

fn secret_kind(s: &str) -> Option<&'static str> {
    let t = s.trim();
    if t.len() < MIN_SECRET_LEN {
        return None;
    }
    SECRET_SHAPES
        .iter()
        .find(|(prefix, _)| t.starts_with(*prefix))
        .map(|&(_, kind)| kind)
}
