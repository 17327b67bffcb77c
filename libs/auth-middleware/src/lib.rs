//! # Request-Scoped Token Authentication Middleware
//!
//! Middleware components that extract a bearer credential from an incoming
//! request, verify it, and gate downstream processing on caller-supplied
//! policy. Multiple independent identity slots (a primary user, a
//! service-to-service token, ...) coexist on one request, each addressed by
//! its own key.
//!
//! ## Modules
//! - `context`: per-request state — headers, identity slot registry, halted flag
//! - `locator`: bearer token discovery across repeated header occurrences
//! - `verify`: verifier middleware writing outcomes into a slot
//! - `enforce`: enforcer middleware applying claim predicates and delegating
//!   denials to a caller-supplied handler
//! - `pipeline`: the sequential driver with cooperative halting
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use auth_middleware::{DenyReason, EnsureAuthenticated, Pipeline, RequestContext, VerifyHeader};
//! use token_core::{Algorithm, JwtVerifier};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = Arc::new(JwtVerifier::from_hmac_secret(b"secret", &[Algorithm::HS256])?);
//!
//! let pipeline = Pipeline::new()
//!     .stage(VerifyHeader::new(verifier).realm("Bearer"))
//!     .stage(
//!         EnsureAuthenticated::builder()
//!             .require_claim("aud", "internal-api")
//!             .denial_handler(|ctx: &mut RequestContext, _reason: DenyReason| {
//!                 ctx.set_status(http::StatusCode::UNAUTHORIZED);
//!                 ctx.halt();
//!             })
//!             .build()?,
//!     );
//!
//! let mut ctx = RequestContext::new();
//! pipeline.run(&mut ctx);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod enforce;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod verify;

pub use context::{Outcome, RequestContext, Slot, SlotEntry};
pub use enforce::{DenialHandler, DenyReason, EnsureAuthenticated};
pub use error::ConfigError;
pub use locator::TokenLocator;
pub use pipeline::{Middleware, Pipeline};
pub use verify::VerifyHeader;
