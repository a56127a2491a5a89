// crates/divvy-cli/src/commands/config.rs
//
// `divvy config`: print the resolved configuration.

use crate::config::CliConfig;

/// Run the config command.
pub async fn run(config: &CliConfig, source: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match source {
        Some(path) => println!("# loaded from {}", path),
        None => println!("# built-in defaults"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
