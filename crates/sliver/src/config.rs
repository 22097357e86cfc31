use serde::{Deserialize, Serialize};

/// Evaluator limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Nesting depth at which evaluation gives up with `DepthExceeded`.
    pub max_depth: usize,
    /// Reuse results of identical evaluations within one revision.
    pub memoize: bool,
}

impl EvalConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 10_000;
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            memoize: true,
        }
    }
}

/// Top-level configuration, as read from `Sliver.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub eval: EvalConfig,
}
