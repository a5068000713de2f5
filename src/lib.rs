//! Processing of SUIT (Software Updates for IoT) manifest envelopes.
//!
//! A raw manifest is wrapped in a signed envelope with [`envelope::wrap`]
//! and released again by [`envelope::unwrap`], which verifies the COSE
//! Sign1 authentication wrapper and the signed SHA-256 digest. The
//! manifest itself is decoded with [`SuitContext::parse`] into a
//! fixed-capacity component context whose string fields borrow from the
//! caller's manifest buffer. The [`build`] module holds the typed model
//! used to produce manifests.

pub mod build;
pub mod envelope;

mod cbor;
mod constant;
mod cose;
mod error;
mod parse;

pub use cbor::Cbor;
pub use constant::{ArchiveAlg, DigestAlg};
pub use error::Error;
pub use parse::{SuitContext, MAX_COMPONENTS};
