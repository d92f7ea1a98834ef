//! `parley config`: print the effective configuration.

use parley_config::AppConfig;

/// Render `config` as TOML with the API key masked.
pub fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("********".into());
    }
    toml::to_string_pretty(&shown)
}

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    print!("{}", render(config)?);
    Ok(())
}
