use thiserror::Error;

/// Environment variable overriding [`StateLimits::max_stack_depth`].
pub const MAX_STACK_DEPTH_ENV: &str = "HID_DESCRIPTOR_MAX_STACK_DEPTH";

/// Default maximum number of state tables on the scope stack, base table included.
///
/// Real descriptors rarely nest Push more than a couple of levels; the cap only guards against
/// pathological input.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 32;

/// Resource bounds applied while replaying a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateLimits {
    pub max_stack_depth: usize,
}

impl Default for StateLimits {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
        }
    }
}

impl StateLimits {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_stack_depth = match lookup(MAX_STACK_DEPTH_ENV) {
            None => DEFAULT_MAX_STACK_DEPTH,
            Some(raw) => parse_depth(&raw).ok_or(ConfigError::InvalidEnv(MAX_STACK_DEPTH_ENV))?,
        };
        Ok(Self { max_stack_depth })
    }
}

fn parse_depth(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|depth| *depth > 0)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {0}")]
    InvalidEnv(&'static str),
}
