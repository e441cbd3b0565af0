#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableCall {
    Review,
    Audit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableResult {
    pub target: String,
    /// `kind/name` of the violated constraint.
    pub constraint: String,
    /// Compact JSON of the offending object.
    pub object: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFault {
    pub target: String,
    pub constraint: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableData {
    pub generation: u64,
    pub results_emitted: u32,
    pub results_total: u32,
    pub truncated_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableResponseSet {
    pub call: RenderableCall,
    pub targets: Vec<String>,
    pub results: Vec<RenderableResult>,
    pub faults: Vec<RenderableFault>,
    pub data: RenderableData,
}
