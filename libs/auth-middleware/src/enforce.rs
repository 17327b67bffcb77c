//! Enforcer Middleware
//!
//! Gates downstream processing on the presence of a policy-satisfying
//! verification outcome at a configured identity slot. The enforcer itself
//! never produces a response: denials are delegated to the caller-supplied
//! [`DenialHandler`], whose response becomes the outcome seen by the client.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::context::{Outcome, RequestContext, Slot};
use crate::error::ConfigError;
use crate::pipeline::Middleware;

/// Why a request was denied
///
/// All three reasons travel the same denied path; the reason tag is the only
/// way a denial handler can tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum DenyReason {
    /// No verification was attempted for the required slot
    NoCredential,
    /// A credential was present but failed cryptographic verification
    VerificationFailed(String),
    /// Claims verified but a configured predicate did not hold
    ClaimMismatch { claim: String },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoCredential => f.write_str("no credential for required slot"),
            DenyReason::VerificationFailed(err) => write!(f, "verification failed: {err}"),
            DenyReason::ClaimMismatch { claim } => {
                write!(f, "claim {claim:?} does not satisfy policy")
            }
        }
    }
}

/// Caller-supplied denial contract
///
/// Invoked with the request context and the reason tag. Handlers are
/// expected to set whatever response outline they need (status, markers in
/// the extensions) and halt the context; the enforcer halts it afterwards
/// regardless, so a forgetful handler cannot leave the pipeline running.
pub trait DenialHandler: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext, reason: DenyReason);
}

impl<F> DenialHandler for F
where
    F: Fn(&mut RequestContext, DenyReason) + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext, reason: DenyReason) {
        self(ctx, reason)
    }
}

/// Middleware that denies the request unless its slot holds verified claims
/// satisfying every configured predicate
///
/// ## State machine (per request)
///
/// - Slot absent, or `Failed`, or `Verified` with any predicate mismatch:
///   **denied** — the denial handler runs and the pipeline halts
/// - `Verified` with all predicates holding: **allowed** — control passes
///   through unchanged, no writes, no side effects beyond the read
///
/// Predicates are ANDed; with none configured, verified well-formed claims
/// are sufficient.
pub struct EnsureAuthenticated {
    slot: Slot,
    predicates: Vec<(String, Value)>,
    on_deny: Arc<dyn DenialHandler>,
}

impl EnsureAuthenticated {
    /// Start configuring an enforcer
    ///
    /// [`EnforcerBuilder::build`] fails unless a denial handler is supplied;
    /// there is no way to construct an enforcer that denies silently.
    pub fn builder() -> EnforcerBuilder {
        EnforcerBuilder {
            slot: Slot::Default,
            predicates: Vec::new(),
            on_deny: None,
        }
    }

    fn evaluate(&self, ctx: &RequestContext) -> Result<(), DenyReason> {
        let entry = ctx.entry(&self.slot).ok_or(DenyReason::NoCredential)?;

        let claims = match &entry.outcome {
            Outcome::Failed(err) => {
                return Err(DenyReason::VerificationFailed(err.to_string()));
            }
            Outcome::Verified(claims) => claims,
        };

        for (name, expected) in &self.predicates {
            if !claims.matches(name, expected) {
                return Err(DenyReason::ClaimMismatch {
                    claim: name.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Middleware for EnsureAuthenticated {
    fn call(&self, ctx: &mut RequestContext) {
        if let Err(reason) = self.evaluate(ctx) {
            warn!(slot = %self.slot, reason = %reason, "request denied");
            self.on_deny.handle(ctx, reason);
            // The halted invariant holds even if the handler forgot
            ctx.halt();
        }
    }
}

/// Builder for [`EnsureAuthenticated`]
pub struct EnforcerBuilder {
    slot: Slot,
    predicates: Vec<(String, Value)>,
    on_deny: Option<Arc<dyn DenialHandler>>,
}

impl EnforcerBuilder {
    /// Require the outcome at a specific slot (default slot otherwise)
    pub fn slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    /// Require a claim to be present and equal to the expected value
    ///
    /// May be called repeatedly; all predicates must hold.
    pub fn require_claim(mut self, name: impl Into<String>, expected: impl Into<Value>) -> Self {
        self.predicates.push((name.into(), expected.into()));
        self
    }

    /// Supply the denial handler (required)
    pub fn denial_handler(mut self, handler: impl DenialHandler + 'static) -> Self {
        self.on_deny = Some(Arc::new(handler));
        self
    }

    /// ## Errors
    ///
    /// `ConfigError::MissingDenialHandler` when no handler was supplied.
    pub fn build(self) -> Result<EnsureAuthenticated, ConfigError> {
        let on_deny = self.on_deny.ok_or(ConfigError::MissingDenialHandler)?;

        Ok(EnsureAuthenticated {
            slot: self.slot,
            predicates: self.predicates,
            on_deny,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use token_core::{Claims, VerifyError};

    /// Marker the test handler leaves on denied contexts
    #[derive(Debug, Clone, PartialEq)]
    struct Denied(DenyReason);

    fn recording_handler() -> impl DenialHandler + 'static {
        |ctx: &mut RequestContext, reason: DenyReason| {
            ctx.extensions_mut().insert(Denied(reason));
            ctx.set_status(StatusCode::UNAUTHORIZED);
            ctx.halt();
        }
    }

    fn enforcer_with(predicates: &[(&str, &str)]) -> EnsureAuthenticated {
        let mut builder = EnsureAuthenticated::builder().denial_handler(recording_handler());
        for (name, expected) in predicates {
            builder = builder.require_claim(*name, *expected);
        }
        builder.build().unwrap()
    }

    fn verified_ctx(audience: &str) -> RequestContext {
        let mut claims = Claims::new();
        claims.insert("sub", "user-1");
        claims.insert("aud", audience);

        let mut ctx = RequestContext::new();
        ctx.record(Slot::Default, "token".into(), Outcome::Verified(claims));
        ctx
    }

    fn denial(ctx: &RequestContext) -> Option<&Denied> {
        ctx.extensions().get::<Denied>()
    }

    #[test]
    fn test_build_without_handler_fails() {
        let result = EnsureAuthenticated::builder().build();
        assert!(matches!(result, Err(ConfigError::MissingDenialHandler)));
    }

    #[test]
    fn test_absent_slot_denies_with_no_credential() {
        let mut ctx = RequestContext::new();
        enforcer_with(&[]).call(&mut ctx);

        assert!(ctx.is_halted());
        assert_eq!(ctx.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(denial(&ctx), Some(&Denied(DenyReason::NoCredential)));
    }

    #[test]
    fn test_failed_outcome_denies_with_verification_failed() {
        let mut ctx = RequestContext::new();
        ctx.record(
            Slot::Default,
            "token".into(),
            Outcome::Failed(VerifyError::InvalidSignature),
        );

        enforcer_with(&[]).call(&mut ctx);

        assert!(ctx.is_halted());
        assert!(matches!(
            denial(&ctx),
            Some(Denied(DenyReason::VerificationFailed(_)))
        ));
    }

    #[test]
    fn test_verified_claims_without_predicates_allow() {
        let mut ctx = verified_ctx("anything");
        enforcer_with(&[]).call(&mut ctx);

        assert!(!ctx.is_halted());
        assert!(denial(&ctx).is_none());
        assert_eq!(ctx.status(), None);
    }

    #[test]
    fn test_predicate_mismatch_denies_and_names_the_claim() {
        let mut ctx = verified_ctx("oauth");
        enforcer_with(&[("aud", "token")]).call(&mut ctx);

        assert!(ctx.is_halted());
        assert_eq!(
            denial(&ctx),
            Some(&Denied(DenyReason::ClaimMismatch {
                claim: "aud".into()
            }))
        );
    }

    #[test]
    fn test_all_predicates_must_hold() {
        let mut ctx = verified_ctx("internal-api");
        enforcer_with(&[("aud", "internal-api"), ("sub", "someone-else")]).call(&mut ctx);

        assert!(ctx.is_halted());
        assert_eq!(
            denial(&ctx),
            Some(&Denied(DenyReason::ClaimMismatch {
                claim: "sub".into()
            }))
        );
    }

    #[test]
    fn test_enforcer_reads_only_its_own_slot() {
        // A verified default slot does not satisfy an enforcer on "client"
        let mut ctx = verified_ctx("internal-api");

        let enforcer = EnsureAuthenticated::builder()
            .slot(Slot::named("client"))
            .denial_handler(recording_handler())
            .build()
            .unwrap();
        enforcer.call(&mut ctx);

        assert!(ctx.is_halted());
        assert_eq!(denial(&ctx), Some(&Denied(DenyReason::NoCredential)));
    }

    #[test]
    fn test_enforcer_halts_even_if_handler_does_not() {
        let enforcer = EnsureAuthenticated::builder()
            .denial_handler(|_ctx: &mut RequestContext, _reason: DenyReason| {
                // Handler neglects to halt
            })
            .build()
            .unwrap();

        let mut ctx = RequestContext::new();
        enforcer.call(&mut ctx);

        assert!(ctx.is_halted());
    }
}
