use crate::chain_config::ChainConfig;

pub fn print_safe_config(config: &ChainConfig) -> Result<(), anyhow::Error> {
    let s = serde_yaml::to_string(&config.redacted())?;
    println!("{s}");
    Ok(())
}
