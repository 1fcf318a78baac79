use clap::Subcommand;

use super::store_pool;
use crate::cli::OutputFormat;
use crate::session::SessionStore;

#[derive(Subcommand)]
pub enum SessionCommands {
    #[command(about = "Delete sessions past their absolute expiry")]
    Sweep,
}

pub async fn handle(cmd: SessionCommands, format: OutputFormat) -> anyhow::Result<()> {
    let pool = store_pool().await?;

    match cmd {
        SessionCommands::Sweep => {
            let removed = SessionStore::new(pool).sweep_expired().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "removed": removed })),
                OutputFormat::Text => println!("Removed {} expired sessions", removed),
            }
        }
    }

    Ok(())
}
