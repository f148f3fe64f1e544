//! Execution configuration types

/// Exponent of the power curve used around opcode execution.
pub const DEFAULT_GAMMA_EXPONENT: f32 = 2.2;

/// Configuration for one opcode execution pass
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyConfig {
    /// Linearise samples with `v^gamma` before the first opcode
    pub decode_gamma: bool,
    /// Re-encode samples with `v^(1/gamma)` after the last opcode
    pub encode_gamma: bool,
    pub gamma_exponent: f32,
    /// Worker threads for per-row stages; `None` uses one per available core
    pub threads: Option<usize>,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            decode_gamma: false,
            encode_gamma: false,
            gamma_exponent: DEFAULT_GAMMA_EXPONENT,
            threads: None,
        }
    }
}

impl ApplyConfig {
    pub fn builder() -> ApplyConfigBuilder {
        ApplyConfigBuilder::default()
    }
}

/// Builder for ApplyConfig
#[derive(Default)]
pub struct ApplyConfigBuilder {
    decode_gamma: Option<bool>,
    encode_gamma: Option<bool>,
    gamma_exponent: Option<f32>,
    threads: Option<Option<usize>>,
}

impl ApplyConfigBuilder {
    pub fn decode_gamma(mut self, enable: bool) -> Self {
        self.decode_gamma = Some(enable);
        self
    }

    pub fn encode_gamma(mut self, enable: bool) -> Self {
        self.encode_gamma = Some(enable);
        self
    }

    pub fn gamma_exponent(mut self, exponent: f32) -> Self {
        self.gamma_exponent = Some(exponent);
        self
    }

    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn build(self) -> ApplyConfig {
        let default = ApplyConfig::default();
        ApplyConfig {
            decode_gamma: self.decode_gamma.unwrap_or(default.decode_gamma),
            encode_gamma: self.encode_gamma.unwrap_or(default.encode_gamma),
            gamma_exponent: self.gamma_exponent.unwrap_or(default.gamma_exponent),
            threads: self.threads.unwrap_or(default.threads),
        }
    }
}
