//! Configuration management for multialign.
//!
//! This module provides the [`Config`] struct which controls alignment
//! behavior: tab handling, block expansion switches and the ordered list of
//! alignment rules. Configuration can be loaded from:
//! - TOML files (`multialign.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the
//! file being aligned up to the filesystem root, plus the user's home
//! directory. Rule order in the file is match priority.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["multialign.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    // Try HOME environment variable first (works on Unix and some Windows setups)
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

// Serde default functions
fn default_tab_size() -> usize {
    4
}
fn default_true() -> bool {
    true
}
fn default_one_space() -> usize {
    1
}
fn default_alignment() -> Alignment {
    Alignment::Right
}

/// Side of the matched literal that stays fixed while the other side is padded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Literal keeps its configured left spacing; padding goes to the right
    Left,
    /// Literal is pushed right to the target column; right spacing stays fixed
    Right,
}

/// One alignment rule record
///
/// A rule names the literal to align plus its spacing and the contextual
/// constraints an occurrence must satisfy to be claimed by the rule.
/// Records without a literal are dropped during rule compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Literal character or string to align (required)
    #[serde(rename = "char")]
    pub literal: Option<String>,

    /// Alignment side (default: right)
    #[serde(default = "default_alignment")]
    pub alignment: Alignment,

    /// Spaces kept left of the literal (default: 1)
    #[serde(default = "default_one_space")]
    pub spaces_left: usize,

    /// Spaces kept right of the literal (default: 1)
    #[serde(default = "default_one_space")]
    pub spaces_right: usize,

    /// Single characters allowed immediately before the literal
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// Scope tokens the rule is limited to (empty = all scopes)
    #[serde(default)]
    pub is_in_scope: Vec<String>,

    /// Scope tokens the rule is excluded from
    #[serde(default)]
    pub not_in_scope: Vec<String>,

    /// 2-character bracket pairs the occurrence must sit inside
    #[serde(default)]
    pub is_enclosed_by: Vec<String>,

    /// 2-character bracket pairs the occurrence must not sit inside
    #[serde(default)]
    pub not_enclosed_by: Vec<String>,

    /// Literals of which one must occur earlier on the line
    #[serde(default)]
    pub is_left_of_char: Vec<String>,

    /// Literals of which none may occur earlier on the line
    #[serde(default)]
    pub not_left_of_char: Vec<String>,

    /// Literals of which one must occur later on the line
    #[serde(default)]
    pub is_right_of_char: Vec<String>,

    /// Literals of which none may occur later on the line
    #[serde(default)]
    pub not_right_of_char: Vec<String>,
}

impl RuleConfig {
    /// Create a rule for `literal` with all other fields at their defaults
    #[must_use]
    pub fn new(literal: &str) -> Self {
        RuleConfig {
            literal: Some(literal.to_string()),
            alignment: Alignment::Right,
            spaces_left: 1,
            spaces_right: 1,
            prefixes: Vec::new(),
            is_in_scope: Vec::new(),
            not_in_scope: Vec::new(),
            is_enclosed_by: Vec::new(),
            not_enclosed_by: Vec::new(),
            is_left_of_char: Vec::new(),
            not_left_of_char: Vec::new(),
            is_right_of_char: Vec::new(),
            not_right_of_char: Vec::new(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Built-in rule list used when no configuration supplies one
///
/// Priority order: earlier rules win ownership of an occurrence and define
/// earlier slot indices on the anchor row.
#[must_use]
pub fn default_rules() -> Vec<RuleConfig> {
    const FORTRAN_SCOPES: &[&str] = &["source.modern-fortran", "source.fixedform-fortran"];

    vec![
        RuleConfig {
            spaces_left: 0,
            spaces_right: 0,
            is_in_scope: strings(&["source.python"]),
            is_left_of_char: strings(&["from "]),
            ..RuleConfig::new(" import ")
        },
        RuleConfig {
            spaces_left: 0,
            spaces_right: 0,
            is_in_scope: strings(&["source.python"]),
            is_left_of_char: strings(&["import "]),
            ..RuleConfig::new(" as ")
        },
        RuleConfig {
            spaces_left: 3,
            is_in_scope: strings(&["source.python"]),
            ..RuleConfig::new("#")
        },
        RuleConfig {
            is_in_scope: strings(FORTRAN_SCOPES),
            ..RuleConfig::new("::")
        },
        RuleConfig {
            spaces_left: 0,
            spaces_right: 0,
            is_in_scope: strings(FORTRAN_SCOPES),
            is_right_of_char: strings(&["::"]),
            ..RuleConfig::new(" intent")
        },
        RuleConfig {
            spaces_right: 0,
            is_in_scope: strings(FORTRAN_SCOPES),
            ..RuleConfig::new("&")
        },
        RuleConfig::new("=>"),
        RuleConfig {
            prefixes: strings(&[
                "+", "-", "*", "/", ".", "%", "<", ">", "!", "=", "~", "&", "|",
            ]),
            not_enclosed_by: strings(&["()", "[]"]),
            ..RuleConfig::new("=")
        },
        RuleConfig {
            alignment: Alignment::Left,
            spaces_left: 0,
            not_enclosed_by: strings(&["[]"]),
            ..RuleConfig::new(":")
        },
    ]
}

/// Main configuration struct for multialign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of columns a tab expands to (default: 4)
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,

    /// Whether indentation is counted in tab stops rather than columns (default: false)
    #[serde(default)]
    pub translate_tabs_to_spaces: bool,

    /// Stop block expansion at empty lines (default: true)
    #[serde(default = "default_true")]
    pub break_at_empty_lines: bool,

    /// Stop block expansion at lines without a matching slot (default: true)
    #[serde(default = "default_true")]
    pub break_at_non_matching_lines: bool,

    /// Ordered alignment rules; order is match priority
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

/// Partial configuration for TOML parsing
///
/// All scalar fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub tab_size: Option<usize>,
    pub translate_tabs_to_spaces: Option<bool>,
    pub break_at_empty_lines: Option<bool>,
    pub break_at_non_matching_lines: Option<bool>,
    pub rules: Option<Vec<RuleConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tab_size: 4,
            translate_tabs_to_spaces: false,
            break_at_empty_lines: true,
            break_at_non_matching_lines: true,
            rules: default_rules(),
        }
    }
}

impl Config {
    /// Maximum reasonable tab size
    const MAX_TAB_SIZE: usize = 16;

    /// Validate configuration values are within reasonable bounds
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.tab_size == 0 {
            return Some("tab_size must be at least 1".to_string());
        }
        if self.tab_size > Self::MAX_TAB_SIZE {
            return Some(format!(
                "tab_size {} exceeds maximum of {}",
                self.tab_size,
                Self::MAX_TAB_SIZE
            ));
        }
        None
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let partial: PartialConfig = toml::from_str(&contents)?;
        let mut config = Self::default();
        config.apply_partial(partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    ///
    /// A `[[rules]]` list replaces the rule list wholesale; merging rule
    /// records across files has no sensible priority order.
    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.tab_size {
            self.tab_size = v;
        }
        if let Some(v) = partial.translate_tabs_to_spaces {
            self.translate_tabs_to_spaces = v;
        }
        if let Some(v) = partial.break_at_empty_lines {
            self.break_at_empty_lines = v;
        }
        if let Some(v) = partial.break_at_non_matching_lines {
            self.break_at_non_matching_lines = v;
        }
        if let Some(v) = partial.rules {
            self.rules = v;
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the file's directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        // Add home directory config first (lowest priority)
        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        // Start from the file's parent directory (or the path itself if it's a directory)
        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            // Path doesn't exist, use current directory
            std::env::current_dir().ok()
        };

        // Collect config files from parent directories (from root to current)
        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Reverse so we go from root to current (less specific to more specific)
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Returns default config if no files found.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let config_files = Self::discover_config_files(start_path);

        if config_files.is_empty() {
            return Self::default();
        }

        let mut config = Self::default();
        for path in &config_files {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(partial),
                    Err(e) => eprintln!("Warning: failed to parse {}: {e}", path.display()),
                },
                Err(e) => eprintln!("Warning: failed to read {}: {e}", path.display()),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tab_size, 4);
        assert!(!config.translate_tabs_to_spaces);
        assert!(config.break_at_empty_lines);
        assert!(config.break_at_non_matching_lines);
        assert_eq!(config.rules.len(), 9);
    }

    #[test]
    fn test_default_rules_priority_order() {
        let rules = default_rules();
        // '=>' must rank above '=' so pointer assignments are not claimed by '='
        let arrow = rules
            .iter()
            .position(|r| r.literal.as_deref() == Some("=>"))
            .unwrap();
        let equals = rules
            .iter()
            .position(|r| r.literal.as_deref() == Some("="))
            .unwrap();
        assert!(arrow < equals);
    }

    #[test]
    fn test_rule_config_defaults() {
        let rule = RuleConfig::new("=");
        assert_eq!(rule.literal.as_deref(), Some("="));
        assert_eq!(rule.alignment, Alignment::Right);
        assert_eq!(rule.spaces_left, 1);
        assert_eq!(rule.spaces_right, 1);
        assert!(rule.prefixes.is_empty());
        assert!(rule.is_in_scope.is_empty());
        assert!(rule.not_enclosed_by.is_empty());
    }

    #[test]
    fn test_rule_toml_defaults() {
        let rule: RuleConfig = toml::from_str("char = \"=\"").unwrap();
        assert_eq!(rule.literal.as_deref(), Some("="));
        assert_eq!(rule.alignment, Alignment::Right);
        assert_eq!(rule.spaces_left, 1);
        assert_eq!(rule.spaces_right, 1);
    }

    #[test]
    fn test_rule_toml_full() {
        let rule: RuleConfig = toml::from_str(
            r#"
            char = ":"
            alignment = "left"
            spaces_left = 0
            spaces_right = 1
            not_enclosed_by = ["[]"]
            "#,
        )
        .unwrap();
        assert_eq!(rule.literal.as_deref(), Some(":"));
        assert_eq!(rule.alignment, Alignment::Left);
        assert_eq!(rule.spaces_left, 0);
        assert_eq!(rule.not_enclosed_by, vec!["[]".to_string()]);
    }

    #[test]
    fn test_rule_toml_missing_literal() {
        // A record without 'char' parses; it is dropped later at compile time
        let rule: RuleConfig = toml::from_str("alignment = \"left\"").unwrap();
        assert!(rule.literal.is_none());
    }

    #[test]
    fn test_config_apply_partial() {
        let mut base = Config::default();

        let partial: PartialConfig = toml::from_str(
            r"
            tab_size = 8
            break_at_empty_lines = false
            ",
        )
        .unwrap();

        base.apply_partial(partial);
        assert_eq!(base.tab_size, 8);
        assert!(!base.break_at_empty_lines);
        // Other fields should remain at defaults
        assert!(base.break_at_non_matching_lines);
        assert_eq!(base.rules.len(), 9);
    }

    #[test]
    fn test_config_apply_partial_replaces_rules() {
        let mut base = Config::default();

        let partial: PartialConfig = toml::from_str(
            r#"
            [[rules]]
            char = "="

            [[rules]]
            char = ":"
            alignment = "left"
            "#,
        )
        .unwrap();

        base.apply_partial(partial);
        assert_eq!(base.rules.len(), 2);
        assert_eq!(base.rules[0].literal.as_deref(), Some("="));
        assert_eq!(base.rules[1].alignment, Alignment::Left);
    }

    #[test]
    fn test_config_apply_partial_preserves_unset() {
        let mut base = Config {
            tab_size: 2,
            ..Default::default()
        };

        let partial: PartialConfig = toml::from_str("break_at_empty_lines = false").unwrap();
        base.apply_partial(partial);

        // tab_size should be preserved (not reset to default)
        assert_eq!(base.tab_size, 2);
        assert!(!base.break_at_empty_lines);
    }

    #[test]
    fn test_discover_config_files_nonexistent_path() {
        // Discovery from a path that doesn't exist should not panic
        let path = PathBuf::from("/nonexistent/path/file.txt");
        let _files = Config::discover_config_files(&path);
    }

    #[test]
    fn test_from_discovered_files_returns_default_when_empty() {
        let path = PathBuf::from("/nonexistent/unique/path/file.txt");
        let config = Config::from_discovered_files(&path);
        assert_eq!(config.tab_size, 4);
        assert_eq!(config.rules.len(), 9);
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(config.validate().is_none());
    }

    #[test]
    fn test_validate_tab_size_zero() {
        let config = Config {
            tab_size: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap().contains("tab_size"));
    }

    #[test]
    fn test_validate_tab_size_too_large() {
        let config = Config {
            tab_size: 100,
            ..Default::default()
        };
        assert!(config.validate().is_some());
    }
}
