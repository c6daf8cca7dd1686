//! Literal secrets never make it into a loaded config.
//!
//! GREEN when:
//! - a secret-looking leaf aborts loading with CONFIG_SECRET_DETECTED
//! - the error names the leaf but never echoes the value
//! - an overlay can introduce the secret just as a base document can

use smoc_config::load_layered_yaml_from_strings;

#[test]
fn secret_literal_is_refused_and_redacted() {
    let yaml = r#"
reorder:
  endpoint: "https://shop.example/wp-admin/admin-ajax.php"
  api_key: "sk_live_abcdefghijkl"
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err().to_string();
    assert!(err.contains("CONFIG_SECRET_DETECTED"), "{err}");
    assert!(err.contains("/reorder/api_key"), "{err}");
    assert!(!err.contains("abcdefghijkl"), "secret leaked: {err}");
}

#[test]
fn secret_in_overlay_is_refused() {
    let base = "reorder:\n  record_type: product\n";
    let overlay = "deploy:\n  token: \"ghp_0123456789abcdef\"\n";
    assert!(load_layered_yaml_from_strings(&[base]).is_ok());
    assert!(load_layered_yaml_from_strings(&[base, overlay]).is_err());
}
