use clap::Subcommand;

use super::store_pool;
use crate::cli::OutputFormat;
use crate::delegation::CredentialBroker;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Delete expired delegated-token cache rows")]
    Prune,
}

pub async fn handle(cmd: TokenCommands, format: OutputFormat) -> anyhow::Result<()> {
    let pool = store_pool().await?;

    match cmd {
        TokenCommands::Prune => {
            let removed = CredentialBroker::new(pool).prune_expired().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "removed": removed })),
                OutputFormat::Text => println!("Removed {} expired delegated tokens", removed),
            }
        }
    }

    Ok(())
}
