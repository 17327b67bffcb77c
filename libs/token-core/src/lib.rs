//! Shared token primitives for the authentication layer
//!
//! This crate owns everything that touches token material directly, so that
//! the request pipeline in `auth-middleware` never depends on a concrete
//! signature scheme:
//!
//! ## Modules
//! - `claims`: decoded token payload as a typed JSON object
//! - `verifier`: the `TokenVerifier` capability and its JWT implementation
//! - `issuer`: token minting for bootstrap and test flows
//!
//! ## Security Design
//!
//! - **Algorithm allow-list**: the token header's algorithm is checked against
//!   the configured allow-list before any signature work, preventing
//!   algorithm confusion attacks
//! - **Fail-fast configuration**: bad key material or an empty allow-list is
//!   rejected at construction time, never at request time

pub mod claims;
pub mod issuer;
pub mod verifier;

pub use claims::Claims;
pub use jsonwebtoken::Algorithm;
pub use issuer::{IssueError, TokenIssuer};
pub use verifier::{JwtVerifier, TokenVerifier, VerifierConfigError, VerifyError};
