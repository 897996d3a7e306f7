use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::PgPool;

pub struct ValidationReport {
    pub environment: bool,
    pub database: Option<bool>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database.unwrap_or(true)
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(Some(self.environment)));
        println!("Database Connectivity: {}", status(self.database));

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("=================================\n");
    }
}

fn status(ok: Option<bool>) -> &'static str {
    match ok {
        Some(true) => "✅ OK",
        Some(false) => "❌ FAIL",
        None => "➖ SKIPPED",
    }
}

/// Checks configuration and, when a pool is given, the database. The
/// in-memory dev mode passes no pool.
pub async fn validate_environment(config: &Config, pool: Option<&PgPool>) -> ValidationReport {
    let mut report = ValidationReport {
        environment: true,
        database: None,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {:#}", e));
    }

    if let Some(pool) = pool {
        match validate_database(pool).await {
            Ok(()) => report.database = Some(true),
            Err(e) => {
                report.database = Some(false);
                report.errors.push(format!("Database: {:#}", e));
            }
        }
    }

    report
}

fn validate_env_vars(config: &Config) -> Result<()> {
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }
    if config.liqpay_public_key.trim().is_empty() {
        anyhow::bail!("LIQPAY_PUBLIC_KEY is empty");
    }
    if config.liqpay_private_key.is_empty() {
        anyhow::bail!("LIQPAY_PRIVATE_KEY is empty");
    }
    if config.order_namespace.is_empty() || config.order_namespace.contains('_') {
        anyhow::bail!("ORDER_NAMESPACE must be a non-empty token without '_'");
    }

    url::Url::parse(&config.liqpay_checkout_url)
        .context("LIQPAY_CHECKOUT_URL is not a valid URL")?;
    if let Some(base) = &config.public_base_url {
        url::Url::parse(base).context("PUBLIC_BASE_URL is not a valid URL")?;
    }
    if let Some(result) = &config.payment_result_url {
        url::Url::parse(result).context("PAYMENT_RESULT_URL is not a valid URL")?;
    }
    if let Some(webhook) = &config.notify_webhook_url {
        url::Url::parse(webhook).context("NOTIFY_WEBHOOK_URL is not a valid URL")?;
    }

    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to check migrations table")?;

    if applied == 0 {
        anyhow::bail!("No migrations applied");
    }

    Ok(())
}
