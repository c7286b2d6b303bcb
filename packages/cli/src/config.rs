use anyhow::Context;
use mention_editor::EditorConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "mention-editor.config.json";

/// Load the editor config.
///
/// An explicit path must exist. Without one, `DEFAULT_CONFIG_NAME` is read
/// from `cwd` when present and defaults are used otherwise.
pub fn load(cwd: &str, explicit: Option<&Path>) -> anyhow::Result<EditorConfig> {
    let config_path = match explicit {
        Some(path) if !path.exists() => {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME),
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        let config: EditorConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", config_path.display()))?;
        debug!(path = %config_path.display(), "Loaded config");
        Ok(config)
    } else {
        Ok(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_document::SaveFormat;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mention-editor-cli-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = scratch_dir("defaults");
        let config = load(&dir.display().to_string(), None).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_reads_config_from_cwd() {
        let dir = scratch_dir("cwd");
        std::fs::write(
            dir.join(DEFAULT_CONFIG_NAME),
            r#"{ "saveFormat": "text", "maxLength": 40 }"#,
        )
        .unwrap();

        let config = load(&dir.display().to_string(), None).unwrap();
        assert_eq!(config.save_format, SaveFormat::Text);
        assert_eq!(config.max_length, Some(40));
        assert_eq!(config.trigger_chars, EditorConfig::default().trigger_chars);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = scratch_dir("explicit");
        let missing = dir.join("nope.json");
        let err = load(&dir.display().to_string(), Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_config_names_the_file() {
        let dir = scratch_dir("invalid");
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load(&dir.display().to_string(), Some(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
