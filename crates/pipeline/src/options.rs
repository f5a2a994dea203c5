use serde::Deserialize;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Construction options for a [`Pipeline`](crate::Pipeline).
///
/// `suffix`, `postFix` and `prefix` all feed the trailing key segment; the
/// first one set in that order wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub states: Vec<String>,
    pub suffix: Option<String>,
    #[serde(alias = "postFix")]
    pub post_fix: Option<String>,
    pub prefix: Option<String>,
    /// Upper bound on store calls issued concurrently by batch operations.
    pub max_in_flight: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            suffix: None,
            post_fix: None,
            prefix: None,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn resolved_suffix(&self) -> &str {
        self.suffix
            .as_deref()
            .or(self.post_fix.as_deref())
            .or(self.prefix.as_deref())
            .unwrap_or_default()
    }

    pub fn resolved_max_in_flight(&self) -> usize {
        self.max_in_flight.max(1)
    }
}
