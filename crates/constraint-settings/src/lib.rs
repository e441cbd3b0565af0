//! Config parsing and profile/preset resolution.
//!
//! Parsing and resolution are IO-free; `load_config_file` is the single helper that reads from
//! disk.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

use anyhow::Context;
use std::path::Path;

pub use model::ClientConfigV1;
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `constraint-client.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ClientConfigV1> {
    let cfg: ClientConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Read and parse a config file. A missing file is an error; callers decide whether to default.
pub fn load_config_file(path: &Path) -> anyhow::Result<ClientConfigV1> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse_config_toml(&text).with_context(|| format!("parse config {}", path.display()))
}

/// Resolve the effective config used by the client (profile + overrides + explicit settings).
pub fn resolve_config(cfg: ClientConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}

/// JSON schema of the config file, for editor integration and docs.
pub fn config_json_schema() -> anyhow::Result<String> {
    let schema = schemars::schema_for!(ClientConfigV1);
    Ok(serde_json::to_string_pretty(&schema)?)
}
