use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::liqpay::{codec, LiqPay};

#[derive(Parser)]
#[command(name = "fusaf-payments")]
#[command(about = "FUSAF payments - LiqPay callback verification and reconciliation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Keep registrations in memory instead of Postgres (local development)
        #[arg(long)]
        in_memory: bool,
    },

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Print the effective configuration with secrets masked
    Config,

    /// Payment payload tooling for support and sandbox testing
    #[command(subcommand)]
    Payment(PaymentCommands),
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Sign a base64 data field with the configured private key
    Sign {
        #[arg(long)]
        data: String,
    },

    /// Check a data/signature pair against the configured private key
    Verify {
        #[arg(long)]
        data: String,
        #[arg(long)]
        signature: String,
    },

    /// Print the JSON inside a base64 data field
    Decode {
        #[arg(long)]
        data: String,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config.require_database_url()?).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    tracing::info!("Database migrations completed");
    println!("✓ Database migrations completed");

    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!(
        "  Database URL: {}",
        config
            .database_url
            .as_deref()
            .map(mask_password)
            .unwrap_or_else(|| "(not set, in-memory only)".to_string())
    );
    println!("  LiqPay Public Key: {}", config.liqpay_public_key);
    println!("  LiqPay Private Key: {}", mask_secret(config.liqpay_private_key.expose()));
    println!("  LiqPay Checkout URL: {}", config.liqpay_checkout_url);
    println!("  Order Namespace: {}", config.order_namespace);
    println!(
        "  Callback URL: {}",
        config.callback_url().as_deref().unwrap_or("(not set)")
    );
    println!("  Callback Allowed IPs: {:?}", config.callback_allowed_ips);
    println!("  Trusted Proxy Depth: {}", config.trusted_proxy_depth);
    println!("  Admin API Key: {}", mask_secret(config.admin_api_key.expose()));
    println!(
        "  Notify Webhook: {}",
        config.notify_webhook_url.as_deref().unwrap_or("(log only)")
    );

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

pub fn handle_payment_sign(liqpay: &LiqPay, data: &str) -> String {
    liqpay.sign(data.trim())
}

pub fn handle_payment_verify(liqpay: &LiqPay, data: &str, signature: &str) -> anyhow::Result<()> {
    if liqpay.verify(data.trim(), signature) {
        println!("✓ Signature is valid");
        Ok(())
    } else {
        anyhow::bail!("Signature does not match data")
    }
}

pub fn handle_payment_decode(data: &str) -> anyhow::Result<String> {
    let value: serde_json::Value = codec::decode(data.trim())?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn mask_secret(value: &str) -> &'static str {
    if value.is_empty() {
        "(not set)"
    } else {
        "****"
    }
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
