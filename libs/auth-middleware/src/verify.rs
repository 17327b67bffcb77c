//! Verifier Middleware
//!
//! Turns a located token into a verification outcome and persists it to the
//! context's slot registry. Verification itself is delegated to the
//! [`TokenVerifier`] capability configured at construction.

use std::sync::Arc;

use token_core::TokenVerifier;
use tracing::{debug, warn};

use crate::context::{Outcome, RequestContext, Slot};
use crate::locator::TokenLocator;
use crate::pipeline::Middleware;

/// Middleware that verifies the bearer credential for one identity slot
///
/// ## Behavior
///
/// 1. No token located: the slot is left untouched. An entry written by an
///    earlier stage for the same slot survives — absence is additive, never
///    destructive
/// 2. Token located: the outcome (verified claims or failure reason) is
///    written to the slot together with the raw token, overwriting any prior
///    entry. The raw token is preserved on failure for audit purposes
///
/// Exactly one registry write happens per invocation when a token is
/// present, zero otherwise; a token without an outcome is never observable.
pub struct VerifyHeader {
    slot: Slot,
    locator: TokenLocator,
    verifier: Arc<dyn TokenVerifier>,
}

impl VerifyHeader {
    /// Verify the `Authorization` header into the default slot, no realm
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            slot: Slot::Default,
            locator: TokenLocator::new(),
            verifier,
        }
    }

    /// Write the outcome to a specific identity slot
    pub fn slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    /// Only consider header occurrences carrying this realm
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.locator = self.locator.realm(realm);
        self
    }

    /// Search a different credential header
    pub fn header(mut self, name: http::HeaderName) -> Self {
        self.locator = self.locator.header(name);
        self
    }
}

impl Middleware for VerifyHeader {
    fn call(&self, ctx: &mut RequestContext) {
        let Some(token) = self.locator.locate(ctx.headers()) else {
            debug!(slot = %self.slot, "no credential located, slot left untouched");
            return;
        };

        match self.verifier.verify(&token) {
            Ok(claims) => {
                debug!(slot = %self.slot, subject = ?claims.subject(), "token verified");
                ctx.record(self.slot.clone(), token, Outcome::Verified(claims));
            }
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "token verification failed");
                ctx.record(self.slot.clone(), token, Outcome::Failed(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;
    use http::HeaderValue;
    use token_core::{Claims, VerifyError};

    /// Canned verifier: accepts a single known token, rejects everything else
    struct StaticVerifier {
        accepted: &'static str,
    }

    impl TokenVerifier for StaticVerifier {
        fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
            if token == self.accepted {
                let mut claims = Claims::new();
                claims.insert("sub", "user-1");
                Ok(claims)
            } else {
                Err(VerifyError::InvalidSignature)
            }
        }
    }

    fn verifier() -> Arc<dyn TokenVerifier> {
        Arc::new(StaticVerifier {
            accepted: "good-token",
        })
    }

    fn ctx_with_auth(value: &str) -> RequestContext {
        let mut ctx = RequestContext::new();
        ctx.append_header(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        ctx
    }

    #[test]
    fn test_valid_token_written_to_slot() {
        let mut ctx = ctx_with_auth("good-token");

        VerifyHeader::new(verifier()).call(&mut ctx);

        assert!(ctx.is_verified(&Slot::Default));
        assert_eq!(ctx.token(&Slot::Default), Some("good-token"));
    }

    #[test]
    fn test_failure_written_with_raw_token() {
        let mut ctx = ctx_with_auth("forged-token");

        VerifyHeader::new(verifier()).call(&mut ctx);

        assert!(!ctx.is_verified(&Slot::Default));
        // Raw token survives for audit even though verification failed
        assert_eq!(ctx.token(&Slot::Default), Some("forged-token"));
    }

    #[test]
    fn test_absence_leaves_existing_entry_untouched() {
        let mut ctx = RequestContext::new();
        let mut claims = Claims::new();
        claims.insert("sub", "earlier-session");
        ctx.record(
            Slot::Default,
            "earlier-token".into(),
            Outcome::Verified(claims),
        );

        // No Authorization header at all
        VerifyHeader::new(verifier()).call(&mut ctx);

        assert_eq!(ctx.token(&Slot::Default), Some("earlier-token"));
        assert!(ctx.is_verified(&Slot::Default));
    }

    #[test]
    fn test_failure_overwrites_existing_entry() {
        let mut ctx = ctx_with_auth("forged-token");
        let mut claims = Claims::new();
        claims.insert("sub", "earlier-session");
        ctx.record(
            Slot::Default,
            "earlier-token".into(),
            Outcome::Verified(claims),
        );

        VerifyHeader::new(verifier()).call(&mut ctx);

        // Destructive on failure, unlike absence
        assert_eq!(ctx.token(&Slot::Default), Some("forged-token"));
        assert!(!ctx.is_verified(&Slot::Default));
    }

    #[test]
    fn test_named_slot_does_not_touch_default() {
        let mut ctx = ctx_with_auth("good-token");

        VerifyHeader::new(verifier())
            .slot(Slot::named("client"))
            .call(&mut ctx);

        assert!(ctx.entry(&Slot::Default).is_none());
        assert!(ctx.is_verified(&Slot::named("client")));
    }
}
