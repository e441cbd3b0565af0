/// What AddTemplate does when a template with the same name is already registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateConflict {
    /// Fully replace the stored template.
    Replace,
    /// Reject with `TemplateExists` unless the new template is identical.
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub profile: String,
    /// Record a trace entry for every evaluation attempt.
    pub trace: bool,
    /// Worker threads for evaluator calls. `None` uses the shared rayon pool.
    pub max_parallelism: Option<usize>,
    /// Truncate the flattened results of one call. `None` keeps everything.
    pub max_results: Option<usize>,
    pub template_conflict: TemplateConflict,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            trace: true,
            max_parallelism: None,
            max_results: None,
            template_conflict: TemplateConflict::Replace,
        }
    }
}
