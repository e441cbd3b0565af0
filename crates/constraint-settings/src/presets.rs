use constraint_domain::policy::{EffectiveConfig, TemplateConflict};

pub const PROFILES: [&str; 3] = ["default", "audit", "strict"];

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything else belongs in the config file.
pub fn preset(profile: &str) -> Option<EffectiveConfig> {
    match profile {
        "default" => Some(default_profile()),
        "audit" => Some(audit_profile()),
        "strict" => Some(strict_profile()),
        _ => None,
    }
}

fn default_profile() -> EffectiveConfig {
    EffectiveConfig::default()
}

fn audit_profile() -> EffectiveConfig {
    // Sweeps over large inventories: cap the output, skip the per-evaluation trace.
    EffectiveConfig {
        profile: "audit".to_string(),
        trace: false,
        max_parallelism: None,
        max_results: Some(1000),
        template_conflict: TemplateConflict::Replace,
    }
}

fn strict_profile() -> EffectiveConfig {
    EffectiveConfig {
        profile: "strict".to_string(),
        trace: true,
        max_parallelism: None,
        max_results: None,
        template_conflict: TemplateConflict::Reject,
    }
}
