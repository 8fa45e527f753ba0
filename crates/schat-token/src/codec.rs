//! Wire format: `base64url(claims) "::" base64url(signature)`, unpadded.
//!
//! The separator cannot occur inside either segment because the URL-safe
//! alphabet has no `:`.

use crate::error::TokenError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Separates the encoded claims from the encoded signature
pub const SEPARATOR: &str = "::";

/// Decoded token segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    /// Canonical claims bytes that were signed
    pub unsigned_part: Vec<u8>,
    /// Combined threshold signature
    pub signature: Vec<u8>,
}

impl SignedToken {
    /// Render the token in its wire form
    pub fn encode(&self) -> String {
        format!(
            "{}{SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(&self.unsigned_part),
            URL_SAFE_NO_PAD.encode(&self.signature)
        )
    }

    /// Split a wire token into its segments
    pub fn decode(wire: &str) -> Result<Self, TokenError> {
        let (claims, signature) = wire
            .split_once(SEPARATOR)
            .ok_or_else(|| TokenError::MalformedToken("missing separator".into()))?;
        if claims.is_empty() || signature.is_empty() {
            return Err(TokenError::MalformedToken("empty segment".into()));
        }
        let unsigned_part = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|e| TokenError::MalformedToken(format!("claims segment: {e}")))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| TokenError::MalformedToken(format!("signature segment: {e}")))?;
        Ok(Self {
            unsigned_part,
            signature,
        })
    }
}
