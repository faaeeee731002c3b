use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Rule files (tab-separated), applied in order.
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,

    /// Diagnostic logging from the engine.
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub repl: ReplConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            verbose: false,
            context: ContextConfig::default(),
            repl: ReplConfig::default(),
        }
    }
}

fn default_rules() -> Vec<String> {
    vec!["rules.tsv".into()]
}

// ============================================================================
// Context Config
// ============================================================================

/// Runtime context used to filter rules at load time.
#[derive(Debug, Deserialize, Default)]
pub struct ContextConfig {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
}

// ============================================================================
// REPL Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReplConfig {
    /// Prompt shown before each utterance.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Initial buffer content.
    #[serde(default)]
    pub initial_text: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            initial_text: String::new(),
        }
    }
}

fn default_prompt() -> String {
    "> ".into()
}

impl Config {
    pub fn load() -> Self {
        let path = Path::new("voxedit.toml");
        if path.exists() {
            fs::read_to_string(path)
                .ok()
                .and_then(|s| toml::from_str(&s).ok())
                .unwrap_or_default()
        } else {
            Config::default()
        }
    }
}
