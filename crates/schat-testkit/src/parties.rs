//! Misbehaving signing parties

use async_trait::async_trait;
use schat_core::PartyIndex;
use schat_threshold::frost;
use schat_threshold::{PartialSignature, PartyError, SessionId, SigningCommitment, SigningParty};
use std::sync::Arc;
use std::time::Duration;

/// Party that refuses every request
#[derive(Debug, Clone, Copy)]
pub struct UnavailableParty {
    index: PartyIndex,
}

impl UnavailableParty {
    pub fn new(index: PartyIndex) -> Self {
        Self { index }
    }

    fn refuse(&self) -> PartyError {
        PartyError::Unavailable {
            party: self.index,
            reason: "party offline".into(),
        }
    }
}

#[async_trait]
impl SigningParty for UnavailableParty {
    fn index(&self) -> PartyIndex {
        self.index
    }

    async fn commit(&self, _session: SessionId) -> Result<SigningCommitment, PartyError> {
        Err(self.refuse())
    }

    async fn sign_share(
        &self,
        _session: SessionId,
        _package: &frost::SigningPackage,
    ) -> Result<PartialSignature, PartyError> {
        Err(self.refuse())
    }
}

/// Wraps a party and delays each response
pub struct SlowParty {
    inner: Arc<dyn SigningParty>,
    delay: Duration,
}

impl SlowParty {
    pub fn new(inner: Arc<dyn SigningParty>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl SigningParty for SlowParty {
    fn index(&self) -> PartyIndex {
        self.inner.index()
    }

    async fn commit(&self, session: SessionId) -> Result<SigningCommitment, PartyError> {
        tokio::time::sleep(self.delay).await;
        self.inner.commit(session).await
    }

    async fn sign_share(
        &self,
        session: SessionId,
        package: &frost::SigningPackage,
    ) -> Result<PartialSignature, PartyError> {
        tokio::time::sleep(self.delay).await;
        self.inner.sign_share(session, package).await
    }
}

/// Wraps a party and signs a different message than the one requested.
///
/// The share is well-formed, so only share verification during combination
/// can catch it.
pub struct CorruptingParty {
    inner: Arc<dyn SigningParty>,
}

impl CorruptingParty {
    pub fn new(inner: Arc<dyn SigningParty>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SigningParty for CorruptingParty {
    fn index(&self) -> PartyIndex {
        self.inner.index()
    }

    async fn commit(&self, session: SessionId) -> Result<SigningCommitment, PartyError> {
        self.inner.commit(session).await
    }

    async fn sign_share(
        &self,
        session: SessionId,
        package: &frost::SigningPackage,
    ) -> Result<PartialSignature, PartyError> {
        let mut message = package.message().to_vec();
        message.push(0xff);
        let forged = frost::SigningPackage::new(package.signing_commitments().clone(), &message);
        self.inner.sign_share(session, &forged).await
    }
}
