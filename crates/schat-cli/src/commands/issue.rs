//! `schat issue`: sign a token offline

use anyhow::{bail, Context};
use schat_core::{SchatConfig, SystemClock};
use schat_token::{ClaimsBuilder, TokenIssuer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    config: &SchatConfig,
    keys: Option<&Path>,
    subject: &str,
    ttl: Option<u64>,
    claims: &[String],
) -> anyhow::Result<()> {
    let signer = super::load_signer(config, keys)?;
    let ttl = ttl.map_or_else(|| config.access_token_ttl(), Duration::from_secs);
    let issuer = TokenIssuer::new(ClaimsBuilder::new(Arc::new(SystemClock)), signer, ttl);

    let issued = issuer
        .issue(subject, parse_claims(claims)?)
        .await
        .context("signing token")?;
    tracing::info!(subject, expires_at = issued.claims.expires_at, "token issued");
    println!("{}", issued.wire);
    Ok(())
}

/// Parse `key=value` pairs; values that are valid JSON keep their type
pub fn parse_claims(pairs: &[String]) -> anyhow::Result<BTreeMap<String, Value>> {
    let mut claims = BTreeMap::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("claim {pair:?} is not of the form key=value");
        };
        if key.is_empty() {
            bail!("claim {pair:?} has an empty key");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
        claims.insert(key.to_string(), value);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claims_keep_json_types() {
        let claims = parse_claims(&[
            "party=2".to_string(),
            "roles=[\"ROLE_USER\"]".to_string(),
            "email=alice@example.com".to_string(),
        ])
        .unwrap();
        assert_eq!(claims["party"], json!(2));
        assert_eq!(claims["roles"], json!(["ROLE_USER"]));
        assert_eq!(claims["email"], json!("alice@example.com"));
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_claims(&["novalue".to_string()]).is_err());
        assert!(parse_claims(&["=x".to_string()]).is_err());
    }
}
