//! Loading experiment parameter files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use strobe_compile::TimingParams;

/// Load timing overrides from a JSON or YAML file.
///
/// The format is chosen by extension (`.json`, `.yaml`, `.yml`); other
/// extensions are tried as JSON first, then YAML.
pub fn load_params(path: &Path) -> Result<TimingParams> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext.to_lowercase().as_str() {
        "json" => parse_json(&source),
        "yaml" | "yml" => parse_yaml(&source),
        _ => parse_json(&source).or_else(|_| parse_yaml(&source)),
    }
    .with_context(|| format!("Invalid parameter file: {}", path.display()))
}

fn parse_json(source: &str) -> Result<TimingParams> {
    serde_json::from_str(source).map_err(|e| anyhow::anyhow!("JSON parse error: {e}"))
}

fn parse_yaml(source: &str) -> Result<TimingParams> {
    serde_yaml_ng::from_str(source).map_err(|e| anyhow::anyhow!("YAML parse error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_params() {
        let params = parse_yaml(
            "pulses:\n  laser:\n    duration_ns: 1005\nrepetitions: 3\nsequence_interval_ns: 200\n",
        )
        .unwrap();
        assert_eq!(params.pulses["laser"].duration_ns, Some(1005));
        assert_eq!(params.repetitions, Some(3));
        assert_eq!(params.sequence_interval_ns, Some(200));
    }

    #[test]
    fn test_negative_values_parse() {
        let params = parse_json(r#"{"pulses": {"microwave": {"start_ns": -8}}}"#).unwrap();
        assert_eq!(params.pulses["microwave"].start_ns, Some(-8));
    }

    #[test]
    fn test_missing_file() {
        let err = load_params(Path::new("/nonexistent/params.json")).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
