use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `constraint-client.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClientConfigV1 {
    /// Optional schema string for tooling (`constraint-client.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Preset profile: `default`, `audit` or `strict`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Record a trace entry for every evaluation attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,

    /// Worker threads for evaluator calls (0 = shared pool).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallelism: Option<u32>,

    /// How many results one call may return before truncating (0 = unlimited).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    /// What re-adding a template under an existing name does: `replace` or `reject`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_conflict: Option<String>,
}
