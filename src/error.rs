use thiserror::Error;

/// Failure modes of envelope and manifest processing.
///
/// There is no partial recovery; any variant means the envelope or
/// manifest as a whole has been rejected and must be discarded.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed CBOR item")]
    Decode(#[from] minicbor::decode::Error),

    #[error("indefinite-length items are not supported")]
    IndefiniteLength,

    #[error("envelope is missing a required entry")]
    IncompleteEnvelope,

    #[error("malformed COSE Sign1 item")]
    Sign1,

    #[error("unsupported signature algorithm {0}")]
    SignatureAlgorithm(i32),

    #[error("signature verification failed")]
    BadSignature,

    #[error("manifest digest does not match the signed digest")]
    DigestMismatch,

    #[error("unsupported digest algorithm {0}")]
    DigestAlgorithm(i32),

    #[error("unsupported archive algorithm {0}")]
    ArchiveAlgorithm(u32),

    #[error("unsupported manifest version {0}")]
    Version(u32),

    #[error("unrecognized manifest field {0}")]
    ManifestField(u32),

    #[error("manifest declares too many components ({0})")]
    TooManyComponents(u64),

    #[error("component index {0} is out of range")]
    ComponentIndex(usize),

    #[error("unsupported command {0}")]
    Command(u32),

    #[error("unsupported parameter {0}")]
    Parameter(u32),

    #[error("every try-each candidate failed")]
    TryEachExhausted,

    #[error(transparent)]
    Crypto(#[from] openssl::error::ErrorStack),
}
