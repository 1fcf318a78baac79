use clap::Subcommand;
use uuid::Uuid;

use super::store_pool;
use crate::cli::OutputFormat;
use crate::superadmin::TenantAuthorizer;

#[derive(Subcommand)]
pub enum AccessCommands {
    #[command(about = "Grant a superadmin access to a tenant")]
    Grant {
        #[arg(long)]
        account_id: Uuid,
        #[arg(long)]
        tenant: String,
        #[arg(long, default_value = "full")]
        level: String,
    },

    #[command(about = "Revoke a superadmin's access to a tenant")]
    Revoke {
        #[arg(long)]
        account_id: Uuid,
        #[arg(long)]
        tenant: String,
    },

    #[command(about = "List tenants a superadmin can access")]
    List {
        #[arg(long)]
        account_id: Uuid,
    },
}

pub async fn handle(cmd: AccessCommands, format: OutputFormat) -> anyhow::Result<()> {
    let pool = store_pool().await?;
    let authorizer = TenantAuthorizer::new(pool);

    match cmd {
        AccessCommands::Grant {
            account_id,
            tenant,
            level,
        } => {
            let access = authorizer.grant(account_id, &tenant, &level).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&access)?),
                OutputFormat::Text => println!(
                    "Granted {} access to tenant {} for {}",
                    access.access_level, access.tenant_id, access.superadmin_id
                ),
            }
        }
        AccessCommands::Revoke { account_id, tenant } => {
            let revoked = authorizer.revoke(account_id, &tenant).await?;
            if !revoked {
                anyhow::bail!("No grant for ({}, {})", account_id, tenant);
            }
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "revoked": { "account_id": account_id, "tenant": tenant } })
                ),
                OutputFormat::Text => println!("Revoked tenant {} from {}", tenant, account_id),
            }
        }
        AccessCommands::List { account_id } => {
            let grants = authorizer.tenants_for(account_id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&grants)?),
                OutputFormat::Text => {
                    for grant in grants {
                        println!("{}  {}", grant.tenant_id, grant.access_level);
                    }
                }
            }
        }
    }

    Ok(())
}
