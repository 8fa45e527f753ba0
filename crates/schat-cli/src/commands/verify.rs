//! `schat verify`: check a token against the combined key

use anyhow::bail;
use schat_core::{SchatConfig, SystemClock};
use schat_token::{InMemoryRevocationStore, TokenValidator};
use std::path::Path;
use std::sync::Arc;

pub async fn run(config: &SchatConfig, keys: Option<&Path>, token: &str) -> anyhow::Result<()> {
    let signer = super::load_signer(config, keys)?;
    let clock = Arc::new(SystemClock);
    let validator = TokenValidator::new(
        signer,
        Arc::new(InMemoryRevocationStore::new(clock.clone())),
        clock,
    );

    match validator.validate(token).await {
        Ok(validated) => {
            let claims = &validated.claims;
            println!("subject:     {}", claims.subject);
            println!("issued at:   {}", claims.issued_at);
            println!("expires at:  {}", claims.expires_at);
            println!("fingerprint: {}", validated.fingerprint);
            println!("claims:      {}", serde_json::to_string_pretty(&claims.claims)?);
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "token rejected");
            bail!("token rejected: {}", e.kind())
        }
    }
}
