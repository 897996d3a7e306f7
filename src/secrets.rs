use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use vaultrs::auth::approle;
use vaultrs::client::{Client, VaultClient, VaultClientSettingsBuilder};
use vaultrs::kv2;

use crate::config::Secret;

/// Vault path holding the merchant key pair.
const LIQPAY_SECRET_PATH: &str = "liqpay";

/// Optional Vault source for the LiqPay keys, enabled by `VAULT_ADDR`.
pub struct SecretsManager {
    client: VaultClient,
    kv_mount: String,
}

pub struct LiqPayKeys {
    pub public_key: String,
    pub private_key: Secret,
}

impl SecretsManager {
    /// `None` when Vault is not configured for this deployment.
    pub async fn from_env() -> Result<Option<Self>> {
        match env::var("VAULT_ADDR") {
            Ok(addr) if !addr.trim().is_empty() => Self::connect(&addr).await.map(Some),
            _ => Ok(None),
        }
    }

    async fn connect(vault_addr: &str) -> Result<Self> {
        let role_id = env::var("VAULT_ROLE_ID").context("VAULT_ROLE_ID is required")?;
        let secret_id = env::var("VAULT_SECRET_ID").context("VAULT_SECRET_ID is required")?;
        let auth_mount = env::var("VAULT_AUTH_MOUNT").unwrap_or_else(|_| "approle".to_string());
        let kv_mount = env::var("VAULT_KV_MOUNT").unwrap_or_else(|_| "secret".to_string());

        let mut client = VaultClient::new(
            VaultClientSettingsBuilder::default()
                .address(vault_addr)
                .build()
                .context("failed to build Vault client settings")?,
        )
        .context("failed to create Vault client")?;

        let auth = approle::login(&client, &auth_mount, &role_id, &secret_id)
            .await
            .context("failed to authenticate to Vault with AppRole")?;
        client.set_token(&auth.client_token);

        Ok(Self { client, kv_mount })
    }

    pub async fn get_liqpay_keys(&self) -> Result<LiqPayKeys> {
        let secret: HashMap<String, String> =
            kv2::read(&self.client, &self.kv_mount, LIQPAY_SECRET_PATH)
                .await
                .with_context(|| format!("failed to read {}/{} from Vault", self.kv_mount, LIQPAY_SECRET_PATH))?;

        let field = |name: &str| {
            secret
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .with_context(|| format!("{} key not found in Vault secret {}", name, LIQPAY_SECRET_PATH))
        };

        Ok(LiqPayKeys {
            public_key: field("public_key")?,
            private_key: Secret::new(field("private_key")?),
        })
    }
}
