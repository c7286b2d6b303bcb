use crate::config::DEFAULT_CONFIG_NAME;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mention_editor::EditorConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!("{} {} already exists", "⚠️".yellow(), DEFAULT_CONFIG_NAME.bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config_json = serde_json::to_string_pretty(&EditorConfig::default())?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = std::env::temp_dir().join(format!("mention-editor-init-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let cwd = dir.display().to_string();

        init(InitArgs { force: true }, &cwd).unwrap();
        let config = crate::config::load(&cwd, None).unwrap();
        assert_eq!(config, EditorConfig::default());

        // without --force an existing file is left alone
        fs::write(dir.join(DEFAULT_CONFIG_NAME), r#"{ "debounceMs": 5 }"#).unwrap();
        init(InitArgs { force: false }, &cwd).unwrap();
        assert_eq!(crate::config::load(&cwd, None).unwrap().debounce_ms, 5);
    }
}
