//! Cross-domain engagement-key ownership verification.

pub mod cache;
pub mod domain_resolver;
pub mod verifier;

pub use cache::VerificationCache;
pub use domain_resolver::DomainResolver;
pub use verifier::{CrossDomainVerifier, FakeCrossDomainVerifier, HttpCrossDomainVerifier, VerifierConfig};
