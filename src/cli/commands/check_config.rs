use crate::config::AppConfig;

/// Print the resolved configuration. The JWT secret is never serialized.
pub fn handle(config: AppConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&config)?);

    match config.validate() {
        Ok(()) => {
            println!("✓ Configuration is valid");
            Ok(())
        }
        Err(e) => anyhow::bail!("invalid configuration: {}", e),
    }
}
