use crate::{model::ClientConfigV1, presets};
use anyhow::Context;
use constraint_domain::policy::{EffectiveConfig, TemplateConflict};

/// Caller-supplied settings that win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub trace: Option<bool>,
    pub max_parallelism: Option<u32>,
    pub max_results: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
}

pub fn resolve_config(cfg: ClientConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref() {
        anyhow::ensure!(
            schema == "constraint-client.config.v1",
            "unsupported config schema: {schema} (expected constraint-client.config.v1)"
        );
    }

    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "default".to_string());

    let mut effective = presets::preset(&profile).with_context(|| {
        format!(
            "unknown profile: {profile} (expected one of {})",
            presets::PROFILES.join("|")
        )
    })?;

    if let Some(trace) = overrides.trace.or(cfg.trace) {
        effective.trace = trace;
    }

    // 0 means "shared pool" / "unlimited"
    if let Some(n) = overrides.max_parallelism.or(cfg.max_parallelism) {
        effective.max_parallelism = (n > 0).then_some(n as usize);
    }
    if let Some(n) = overrides.max_results.or(cfg.max_results) {
        effective.max_results = (n > 0).then_some(n as usize);
    }

    if let Some(v) = cfg.template_conflict.as_deref() {
        effective.template_conflict = parse_template_conflict(v)?;
    }

    Ok(ResolvedConfig { effective })
}

fn parse_template_conflict(v: &str) -> anyhow::Result<TemplateConflict> {
    match v {
        "replace" => Ok(TemplateConflict::Replace),
        "reject" => Ok(TemplateConflict::Reject),
        other => anyhow::bail!("unknown template_conflict: {other} (expected replace|reject)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_default_profile() {
        let resolved =
            resolve_config(ClientConfigV1::default(), Overrides::default()).expect("resolve");
        assert_eq!(resolved.effective, EffectiveConfig::default());
    }

    #[test]
    fn overrides_win_over_file() {
        let cfg = ClientConfigV1 {
            profile: Some("strict".to_string()),
            trace: Some(false),
            max_results: Some(10),
            ..ClientConfigV1::default()
        };
        let overrides = Overrides {
            profile: Some("audit".to_string()),
            trace: Some(true),
            max_results: Some(3),
            ..Overrides::default()
        };
        let eff = resolve_config(cfg, overrides).expect("resolve").effective;
        assert_eq!(eff.profile, "audit");
        assert!(eff.trace);
        assert_eq!(eff.max_results, Some(3));
    }

    #[test]
    fn zero_limits_mean_unbounded() {
        let cfg = ClientConfigV1 {
            profile: Some("audit".to_string()),
            max_parallelism: Some(0),
            max_results: Some(0),
            ..ClientConfigV1::default()
        };
        let eff = resolve_config(cfg, Overrides::default())
            .expect("resolve")
            .effective;
        assert_eq!(eff.max_parallelism, None);
        assert_eq!(eff.max_results, None);
    }

    #[test]
    fn explicit_template_conflict_overrides_preset() {
        let cfg = ClientConfigV1 {
            profile: Some("strict".to_string()),
            template_conflict: Some("replace".to_string()),
            ..ClientConfigV1::default()
        };
        let eff = resolve_config(cfg, Overrides::default())
            .expect("resolve")
            .effective;
        assert_eq!(eff.template_conflict, TemplateConflict::Replace);
    }

    #[test]
    fn rejects_unknown_values() {
        let bad_profile = ClientConfigV1 {
            profile: Some("lenient".to_string()),
            ..ClientConfigV1::default()
        };
        let err = resolve_config(bad_profile, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("unknown profile: lenient"));

        let bad_conflict = ClientConfigV1 {
            template_conflict: Some("merge".to_string()),
            ..ClientConfigV1::default()
        };
        let err = resolve_config(bad_conflict, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("unknown template_conflict"));

        let bad_schema = ClientConfigV1 {
            schema: Some("constraint-client.config.v9".to_string()),
            ..ClientConfigV1::default()
        };
        assert!(resolve_config(bad_schema, Overrides::default()).is_err());
    }
}
