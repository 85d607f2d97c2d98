use sentinel_core::Heuristics;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SentinelConfig {
    #[serde(default)]
    pub heuristics: Heuristics,
}

impl SentinelConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load overrides from a file when given, otherwise shipped defaults.
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}
