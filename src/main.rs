use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fusaf_payments::adapters::{
    HttpNotifier, InMemoryRegistrationRepository, LoggingNotifier, PostgresRegistrationRepository,
};
use fusaf_payments::cli::{self, Cli, Commands, DbCommands, PaymentCommands};
use fusaf_payments::config::{Config, LogFormat};
use fusaf_payments::health::{PostgresChecker, WebhookChecker};
use fusaf_payments::liqpay::LiqPay;
use fusaf_payments::ports::{Notifier, RegistrationRepository};
use fusaf_payments::secrets::SecretsManager;
use fusaf_payments::use_cases::CreateCheckout;
use fusaf_payments::{create_app, db, startup, AppState, HttpOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    init_tracing(config.log_format);

    if let Some(secrets) = SecretsManager::from_env().await? {
        let keys = secrets.get_liqpay_keys().await?;
        config.liqpay_public_key = keys.public_key;
        config.liqpay_private_key = keys.private_key;
        tracing::info!("LiqPay keys loaded from Vault");
    }

    match cli.command.unwrap_or(Commands::Serve { in_memory: false }) {
        Commands::Serve { in_memory } => serve(config, in_memory).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => {
            cli::handle_config_validate(&config)?;
            startup::validate_environment(&config, None).await.print();
            Ok(())
        }
        Commands::Payment(command) => {
            let liqpay = liqpay_client(&config);
            match command {
                PaymentCommands::Sign { data } => {
                    println!("{}", cli::handle_payment_sign(&liqpay, &data));
                    Ok(())
                }
                PaymentCommands::Verify { data, signature } => {
                    cli::handle_payment_verify(&liqpay, &data, &signature)
                }
                PaymentCommands::Decode { data } => {
                    println!("{}", cli::handle_payment_decode(&data)?);
                    Ok(())
                }
            }
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn liqpay_client(config: &Config) -> LiqPay {
    LiqPay::new(
        config.liqpay_public_key.clone(),
        config.liqpay_private_key.clone(),
        config.liqpay_checkout_url.clone(),
    )
}

async fn serve(config: Config, in_memory: bool) -> anyhow::Result<()> {
    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Arc::new(HttpNotifier::new(url.clone())),
        None => Arc::new(LoggingNotifier),
    };

    let pool = if in_memory {
        tracing::warn!("registrations are kept in memory and lost on restart");
        None
    } else {
        let pool = db::create_pool(config.require_database_url()?)
            .await
            .context("failed to connect to database")?;
        db::run_migrations(&pool).await?;
        tracing::info!("Database migrations completed");
        Some(pool)
    };

    let repository: Arc<dyn RegistrationRepository> = match &pool {
        Some(pool) => Arc::new(PostgresRegistrationRepository::new(pool.clone())),
        None => Arc::new(InMemoryRegistrationRepository::new()),
    };

    let report = startup::validate_environment(&config, pool.as_ref()).await;
    if !report.is_valid() {
        report.print();
        anyhow::bail!("startup validation failed");
    }

    let liqpay = liqpay_client(&config);
    let checkout = CreateCheckout::new(liqpay.clone(), config.order_namespace.clone(), repository.clone())
        .with_urls(config.callback_url(), config.payment_result_url.clone());

    let mut state = AppState::new(liqpay, config.order_namespace.clone(), repository, notifier)
        .with_checkout(checkout)
        .with_admin_key(config.admin_api_key.clone());
    if let Some(pool) = pool {
        state = state.with_dependency(Arc::new(PostgresChecker::new(pool)));
    }
    if let Some(url) = &config.notify_webhook_url {
        state = state.with_dependency(Arc::new(WebhookChecker::new(url.clone())));
    }

    let app = create_app(state, HttpOptions::from(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
