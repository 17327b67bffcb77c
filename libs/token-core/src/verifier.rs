//! Token Verification Capability
//!
//! The pipeline consumes verification through the [`TokenVerifier`] trait:
//! a pure function of token plus key material. [`JwtVerifier`] is the
//! JWT-backed implementation; swapping in another scheme only requires
//! another implementation of the trait.
//!
//! ## Security Design
//!
//! - **Allow-list first**: the algorithm named in the token header is
//!   checked against the configured allow-list before any signature
//!   verification, so an attacker cannot pick the algorithm
//! - **No fallback**: a token that fails verification fails; there is no
//!   retry with weaker settings
//! - **Audience is policy**: audience matching belongs to the enforcer's
//!   claim predicates, not to cryptographic verification

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::Claims;

/// Clock skew tolerance when expiry validation is enabled
const DEFAULT_VALIDATION_LEEWAY_SECS: u64 = 30;

/// Why a located token failed verification
///
/// These never surface to callers directly; the verifier middleware records
/// them per identity slot and the enforcer turns them into a denial.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token algorithm {alg:?} is not in the allow-list")]
    DisallowedAlgorithm { alg: Algorithm },

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Construction-time verifier misconfiguration
///
/// The only failure surface that is allowed to abort startup. Request-time
/// code never sees these.
#[derive(Debug, Error)]
pub enum VerifierConfigError {
    #[error("algorithm allow-list must not be empty")]
    EmptyAlgorithmList,

    #[error("invalid verification key: {0}")]
    InvalidKey(String),
}

/// External verification capability consumed by the request pipeline
///
/// Implementations must be pure with respect to re-invocation: the same
/// token against the same key material yields the same outcome.
pub trait TokenVerifier: Send + Sync {
    /// Verify a token cryptographically and decode its claims
    fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}

/// JWT implementation of [`TokenVerifier`]
///
/// Holds the decoding key, the algorithm allow-list and the validation
/// settings. All of it is immutable after construction, so one instance can
/// be shared across concurrent requests without locking.
pub struct JwtVerifier {
    key: DecodingKey,
    algorithms: Vec<Algorithm>,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier for HMAC-signed tokens (HS256/HS384/HS512)
    pub fn from_hmac_secret(
        secret: &[u8],
        algorithms: &[Algorithm],
    ) -> Result<Self, VerifierConfigError> {
        Self::build(DecodingKey::from_secret(secret), algorithms)
    }

    /// Build a verifier for RSA-signed tokens from a PEM public key
    ///
    /// ## Errors
    ///
    /// `VerifierConfigError::InvalidKey` if the PEM cannot be parsed.
    pub fn from_rsa_pem(
        public_key_pem: &[u8],
        algorithms: &[Algorithm],
    ) -> Result<Self, VerifierConfigError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| VerifierConfigError::InvalidKey(e.to_string()))?;
        Self::build(key, algorithms)
    }

    fn build(key: DecodingKey, algorithms: &[Algorithm]) -> Result<Self, VerifierConfigError> {
        if algorithms.is_empty() {
            return Err(VerifierConfigError::EmptyAlgorithmList);
        }

        let mut validation = Validation::new(algorithms[0]);
        validation.algorithms = algorithms.to_vec();
        validation.leeway = DEFAULT_VALIDATION_LEEWAY_SECS;
        // Audience matching is an enforcer predicate, not a crypto concern
        validation.validate_aud = false;

        Ok(Self {
            key,
            algorithms: algorithms.to_vec(),
            validation,
        })
    }

    /// Disable expiry validation
    ///
    /// Tokens are then accepted regardless of their `exp` claim (or its
    /// absence); expiry becomes purely a policy concern.
    pub fn without_expiry_validation(mut self) -> Self {
        self.validation.validate_exp = false;
        self.validation.required_spec_claims.clear();
        self
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        // 1. Peek at the header and gate on the allow-list before touching
        //    the signature
        let header =
            decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;
        if !self.algorithms.contains(&header.alg) {
            return Err(VerifyError::DisallowedAlgorithm { alg: header.alg });
        }

        // 2. Verify the signature and decode the payload
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> VerifyError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        _ => VerifyError::Malformed(err.to_string()),
    }
}
