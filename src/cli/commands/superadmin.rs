use clap::Subcommand;
use uuid::Uuid;

use super::store_pool;
use crate::cli::OutputFormat;
use crate::superadmin::SuperadminRegistry;

#[derive(Subcommand)]
pub enum SuperadminCommands {
    #[command(about = "Add a superadmin account (out-of-band provisioning)")]
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "superadmin")]
        role: String,
    },

    #[command(about = "List all superadmin accounts")]
    List,

    #[command(about = "Deactivate an account (rows are never hard-deleted)")]
    Deactivate {
        #[arg(long)]
        id: Uuid,
    },
}

pub async fn handle(cmd: SuperadminCommands, format: OutputFormat) -> anyhow::Result<()> {
    let pool = store_pool().await?;
    let registry = SuperadminRegistry::new(pool);

    match cmd {
        SuperadminCommands::Add { email, name, role } => {
            let account = registry.create_account(&email, &name, &role).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&account)?),
                OutputFormat::Text => {
                    println!("Created superadmin {} ({})", account.email, account.id)
                }
            }
        }
        SuperadminCommands::List => {
            let accounts = registry.list_accounts().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&accounts)?),
                OutputFormat::Text => {
                    for account in accounts {
                        let state = if account.is_active { "active" } else { "inactive" };
                        println!(
                            "{}  {}  {}  {}  {}",
                            account.id, account.email, account.name, account.role, state
                        );
                    }
                }
            }
        }
        SuperadminCommands::Deactivate { id } => {
            let changed = registry.deactivate_account(id).await?;
            if !changed {
                anyhow::bail!("No superadmin with id {}", id);
            }
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "deactivated": id.to_string() }))
                }
                OutputFormat::Text => println!("Deactivated superadmin {}", id),
            }
        }
    }

    Ok(())
}
