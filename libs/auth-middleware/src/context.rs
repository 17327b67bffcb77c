//! Per-Request Context and Identity Slot Registry
//!
//! One [`RequestContext`] exists per inbound request and is passed `&mut`
//! through the pipeline, so every stage observes earlier writes. It is never
//! shared across requests and needs no locking.
//!
//! The slot registry maps an identity [`Slot`] to the verification
//! [`Outcome`] for that slot plus the raw token that produced it. Distinct
//! slots never share storage; a later write to the same slot overwrites
//! unconditionally (last write wins).

use std::collections::HashMap;
use std::fmt;

use http::{Extensions, HeaderMap, HeaderName, HeaderValue, StatusCode};
use token_core::{Claims, VerifyError};

/// Addressable identity location on a request
///
/// The default slot carries the primary identity; named slots carry
/// additional ones (e.g. a service-to-service token) without
/// cross-contamination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Slot {
    #[default]
    Default,
    Named(String),
}

impl Slot {
    /// A named slot
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Default => f.write_str("default"),
            Slot::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Slot {
    fn from(name: &str) -> Self {
        Slot::Named(name.to_string())
    }
}

/// Verification outcome stored per slot
#[derive(Debug)]
pub enum Outcome {
    /// Cryptographic verification succeeded; claims are decoded
    Verified(Claims),
    /// Cryptographic or structural verification failed
    Failed(VerifyError),
}

/// Registry entry: the raw token alongside its outcome
///
/// The raw token is kept on failure too, so downstream code can audit the
/// literal credential without re-parsing headers.
#[derive(Debug)]
pub struct SlotEntry {
    pub token: String,
    pub outcome: Outcome,
}

/// Per-request state threaded through the middleware pipeline
#[derive(Debug, Default)]
pub struct RequestContext {
    headers: HeaderMap,
    slots: HashMap<Slot, SlotEntry>,
    extensions: Extensions,
    status: Option<StatusCode>,
    halted: bool,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context around existing request headers
    pub fn from_headers(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Append a header occurrence, preserving earlier occurrences of the
    /// same name
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    // ------------------------------------------------------------------
    // Identity slot registry
    // ------------------------------------------------------------------

    /// Record a verification outcome for a slot
    ///
    /// Unconditionally overwrites any prior entry for that slot. The token
    /// and the outcome are written together; no partial entry is ever
    /// observable.
    pub fn record(&mut self, slot: Slot, token: String, outcome: Outcome) {
        self.slots.insert(slot, SlotEntry { token, outcome });
    }

    /// Read the entry for a slot, if any verification was attempted
    pub fn entry(&self, slot: &Slot) -> Option<&SlotEntry> {
        self.slots.get(slot)
    }

    /// Claims for a slot, when verification succeeded
    pub fn claims(&self, slot: &Slot) -> Option<&Claims> {
        match &self.entry(slot)?.outcome {
            Outcome::Verified(claims) => Some(claims),
            Outcome::Failed(_) => None,
        }
    }

    /// Raw token for a slot, kept on success and on failure
    pub fn token(&self, slot: &Slot) -> Option<&str> {
        self.entry(slot).map(|entry| entry.token.as_str())
    }

    /// Whether the slot holds a successfully verified outcome
    pub fn is_verified(&self, slot: &Slot) -> bool {
        self.claims(slot).is_some()
    }

    // ------------------------------------------------------------------
    // Typed request attributes
    // ------------------------------------------------------------------

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    // ------------------------------------------------------------------
    // Response outline and cooperative halting
    // ------------------------------------------------------------------

    /// Status code chosen by a denial handler, if any
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Stop the pipeline: no later stage runs for this request
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
