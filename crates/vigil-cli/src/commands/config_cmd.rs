//! `vigil config` -- display the resolved configuration.
//!
//! The API key is never printed. The output says only whether one was
//! found and where.

use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use vigil_platform::env::{Environment, NativeEnvironment};
use vigil_platform::fs::NativeFileSystem;
use vigil_types::Config;

/// Arguments for `vigil config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let env = NativeEnvironment;
    let config = super::load_config(&NativeFileSystem, &env, args.config.as_deref()).await?;

    println!("{}", render(&config, &env)?);
    if let Err(e) = config.validate() {
        eprintln!("warning: {e}");
    }
    Ok(())
}

/// Pretty JSON with `api.api_key` replaced by where the key comes from.
pub fn render(config: &Config, env: &dyn Environment) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(config)?;

    let source = if !config.api.api_key.is_empty() {
        "[REDACTED] (config file)".to_string()
    } else if env
        .get_var(&config.api.api_key_env)
        .is_some_and(|key| !key.trim().is_empty())
    {
        format!("[REDACTED] (env {})", config.api.api_key_env)
    } else {
        "<unset>".to_string()
    };
    if let Some(api) = value.get_mut("api").and_then(Value::as_object_mut) {
        api.insert("api_key".into(), Value::String(source));
    }

    Ok(serde_json::to_string_pretty(&value)?)
}
