//! Construction of the full authentication stack from configuration

use crate::directory::UserDirectory;
use crate::error::AuthError;
use crate::gate::AuthenticationGate;
use crate::service::AuthService;
use schat_core::{PhysicalClock, RandomSource, SchatConfig};
use schat_threshold::{PartyRegistry, RegistryError, ThresholdSigner};
use schat_token::{
    ClaimsBuilder, RefreshTokenManager, RefreshTokenStore, RevocationStore, RotationPolicy,
    TokenIssuer, TokenValidator,
};
use std::num::NonZeroU16;
use std::sync::Arc;

/// External state and effects the stack is built around
pub struct Collaborators {
    /// User persistence
    pub directory: Arc<dyn UserDirectory>,
    /// Blacklist of revoked access tokens
    pub revocations: Arc<dyn RevocationStore>,
    /// Persistence for refresh tokens
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    /// Time source for issuance and expiry
    pub clock: Arc<dyn PhysicalClock>,
    /// Entropy for refresh token values
    pub random: Arc<dyn RandomSource>,
}

/// Every component, constructed once and shared by handle
#[derive(Debug)]
pub struct AuthStack {
    /// Quorum signer over the registry
    pub signer: Arc<ThresholdSigner>,
    /// Access token issuer
    pub issuer: Arc<TokenIssuer>,
    /// Access token validator
    pub validator: Arc<TokenValidator>,
    /// Refresh token lifecycle
    pub refresh: Arc<RefreshTokenManager>,
    /// Per-request authentication
    pub gate: AuthenticationGate,
    /// Register, login, refresh and logout
    pub service: AuthService,
}

impl AuthStack {
    /// Build every component from `config` around `registry`.
    ///
    /// Fails with a configuration error when the registry's roster does not
    /// match the configured party count and threshold.
    pub async fn from_config(
        config: &SchatConfig,
        registry: Arc<PartyRegistry>,
        collaborators: Collaborators,
    ) -> Result<Self, AuthError> {
        if registry.party_count() != config.parties || registry.threshold() != config.threshold {
            let err = RegistryError::ConfigMismatch {
                configured_parties: config.parties,
                configured_threshold: config.threshold,
                parties: registry.party_count(),
                threshold: registry.threshold(),
            };
            tracing::error!(error = %err, "refusing to start");
            return Err(err.into());
        }

        let Collaborators {
            directory,
            revocations,
            refresh_tokens,
            clock,
            random,
        } = collaborators;
        let parties = NonZeroU16::new(registry.party_count()).unwrap_or(NonZeroU16::MIN);

        let signer = Arc::new(ThresholdSigner::new(registry, config.quorum_timeout()));
        let issuer = Arc::new(TokenIssuer::new(
            ClaimsBuilder::new(Arc::clone(&clock)),
            Arc::clone(&signer),
            config.access_token_ttl(),
        ));
        let validator = Arc::new(TokenValidator::new(
            Arc::clone(&signer),
            revocations,
            Arc::clone(&clock),
        ));
        let refresh = Arc::new(
            RefreshTokenManager::new(refresh_tokens, clock, random, config.refresh_token_ttl())
                .with_policy(RotationPolicy::from_flag(config.rotate_refresh_on_redeem)),
        );
        let service = AuthService::new(
            directory,
            Arc::clone(&issuer),
            Arc::clone(&validator),
            Arc::clone(&refresh),
            parties,
        )
        .await?;

        tracing::info!(
            parties = parties.get(),
            rotate_refresh = config.rotate_refresh_on_redeem,
            "authentication stack ready"
        );
        Ok(Self {
            gate: AuthenticationGate::new(Arc::clone(&validator)),
            signer,
            issuer,
            validator,
            refresh,
            service,
        })
    }
}
