//! Integer identifiers from the SUIT manifest draft.
//!
//! The same numbers serve both directions: the parser matches on the
//! `const` namespaces, the builder converts `SuitConstant` into CBOR keys.

use crate::cbor::Cbor;
use crate::error::Error;

pub(crate) mod envelope_key {
    pub const AUTH_WRAPPER: u32 = 2;
    pub const MANIFEST: u32 = 3;
}

pub(crate) mod manifest_key {
    pub const VERSION: u32 = 1;
    pub const SEQUENCE_NUMBER: u32 = 2;
    pub const COMMON: u32 = 3;
    pub const PAYLOAD_FETCH: u32 = 8;
    pub const INSTALL: u32 = 9;
    pub const VALIDATE: u32 = 10;
    pub const LOAD: u32 = 11;
    pub const RUN: u32 = 12;
}

pub(crate) mod common_key {
    pub const COMPONENTS: u32 = 2;
    pub const COMMON_SEQUENCE: u32 = 4;
}

pub(crate) mod command {
    /* conditions */
    pub const VENDOR_ID: u32 = 1;
    pub const CLASS_ID: u32 = 2;
    pub const IMAGE_MATCH: u32 = 3;
    pub const COMPONENT_OFFSET: u32 = 5;

    /* directives */
    pub const SET_COMPONENT_INDEX: u32 = 12;
    pub const TRY_EACH: u32 = 15;
    pub const SET_PARAMETERS: u32 = 19;
    pub const OVERRIDE_PARAMETERS: u32 = 20;
    pub const FETCH: u32 = 21;
    pub const COPY: u32 = 22;
    pub const RUN: u32 = 23;
}

pub(crate) mod parameter {
    pub const VENDOR_ID: u32 = 1;
    pub const CLASS_ID: u32 = 2;
    pub const IMAGE_DIGEST: u32 = 3;
    pub const ARCHIVE_INFO: u32 = 7;
    pub const IMAGE_SIZE: u32 = 14;
    pub const URI: u32 = 21;
    pub const SOURCE_COMPONENT: u32 = 22;
}

pub(crate) mod cose_alg {
    pub const ES256: i32 = -7;
    pub const SHA256: i32 = -16;
    pub const SHAKE128: i32 = -18;
    pub const SHA384: i32 = -43;
    pub const SHA512: i32 = -44;
    pub const SHAKE256: i32 = -45;
}

/// Digest algorithm of an image, identified by its COSE algorithm id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlg {
    Sha256,
    Shake128,
    Sha384,
    Sha512,
    Shake256,
}

impl DigestAlg {
    pub fn cose_id(self) -> i32 {
        match self {
            DigestAlg::Sha256 => cose_alg::SHA256,
            DigestAlg::Shake128 => cose_alg::SHAKE128,
            DigestAlg::Sha384 => cose_alg::SHA384,
            DigestAlg::Sha512 => cose_alg::SHA512,
            DigestAlg::Shake256 => cose_alg::SHAKE256,
        }
    }
}

impl TryFrom<i32> for DigestAlg {
    type Error = Error;

    fn try_from(id: i32) -> Result<Self, Error> {
        match id {
            cose_alg::SHA256 => Ok(DigestAlg::Sha256),
            cose_alg::SHAKE128 => Ok(DigestAlg::Shake128),
            cose_alg::SHA384 => Ok(DigestAlg::Sha384),
            cose_alg::SHA512 => Ok(DigestAlg::Sha512),
            cose_alg::SHAKE256 => Ok(DigestAlg::Shake256),
            other => Err(Error::DigestAlgorithm(other)),
        }
    }
}

impl From<DigestAlg> for Cbor {
    fn from(alg: DigestAlg) -> Cbor {
        Cbor::Nint(-(alg.cose_id() as i64) as u64)
    }
}

/// Compression applied to an image before transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveAlg {
    Gzip,
    Bzip2,
    Deflate,
    Lz4,
    Lzma,
}

impl ArchiveAlg {
    pub fn id(self) -> u32 {
        match self {
            ArchiveAlg::Gzip => 1,
            ArchiveAlg::Bzip2 => 2,
            ArchiveAlg::Deflate => 3,
            ArchiveAlg::Lz4 => 4,
            ArchiveAlg::Lzma => 7,
        }
    }
}

impl TryFrom<u32> for ArchiveAlg {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self, Error> {
        match id {
            1 => Ok(ArchiveAlg::Gzip),
            2 => Ok(ArchiveAlg::Bzip2),
            3 => Ok(ArchiveAlg::Deflate),
            4 => Ok(ArchiveAlg::Lz4),
            7 => Ok(ArchiveAlg::Lzma),
            other => Err(Error::ArchiveAlgorithm(other)),
        }
    }
}

impl From<ArchiveAlg> for Cbor {
    fn from(alg: ArchiveAlg) -> Cbor {
        Cbor::Uint(alg.id() as u64)
    }
}

pub(crate) enum SuitConstant {
    AuthenticationWrapper,
    Manifest,

    ManifestVersion,
    ManifestSequenceNumber,
    Common,
    Components,
    CommonSequence,
    PayloadFetch,
    Install,
    Validate,
    Load,
    Run,

    ConditionVendorIdentifier,
    ConditionClassIdentifier,
    ConditionImageMatch,
    ConditionComponentOffset,

    DirectiveSetComponentIndex,
    DirectiveTryEach,
    DirectiveSetParameters,
    DirectiveOverrideParameters,
    DirectiveFetch,
    DirectiveCopy,
    DirectiveRun,

    ParameterVendorIdentifier,
    ParameterClassIdentifier,
    ParameterImageDigest,
    ParameterArchiveInfo,
    ParameterImageSize,
    ParameterUri,
    ParameterSourceComponent,
}

impl From<SuitConstant> for Cbor {
    fn from(suit_constant: SuitConstant) -> Self {
        use Cbor::Uint;
        use SuitConstant::*;

        match suit_constant {
            AuthenticationWrapper => Uint(envelope_key::AUTH_WRAPPER as u64),
            Manifest => Uint(envelope_key::MANIFEST as u64),

            ManifestVersion => Uint(manifest_key::VERSION as u64),
            ManifestSequenceNumber => Uint(manifest_key::SEQUENCE_NUMBER as u64),
            Common => Uint(manifest_key::COMMON as u64),
            Components => Uint(common_key::COMPONENTS as u64),
            CommonSequence => Uint(common_key::COMMON_SEQUENCE as u64),
            PayloadFetch => Uint(manifest_key::PAYLOAD_FETCH as u64),
            Install => Uint(manifest_key::INSTALL as u64),
            Validate => Uint(manifest_key::VALIDATE as u64),
            Load => Uint(manifest_key::LOAD as u64),
            Run => Uint(manifest_key::RUN as u64),

            ConditionVendorIdentifier => Uint(command::VENDOR_ID as u64),
            ConditionClassIdentifier => Uint(command::CLASS_ID as u64),
            ConditionImageMatch => Uint(command::IMAGE_MATCH as u64),
            ConditionComponentOffset => Uint(command::COMPONENT_OFFSET as u64),

            DirectiveSetComponentIndex => Uint(command::SET_COMPONENT_INDEX as u64),
            DirectiveTryEach => Uint(command::TRY_EACH as u64),
            DirectiveSetParameters => Uint(command::SET_PARAMETERS as u64),
            DirectiveOverrideParameters => Uint(command::OVERRIDE_PARAMETERS as u64),
            DirectiveFetch => Uint(command::FETCH as u64),
            DirectiveCopy => Uint(command::COPY as u64),
            DirectiveRun => Uint(command::RUN as u64),

            ParameterVendorIdentifier => Uint(parameter::VENDOR_ID as u64),
            ParameterClassIdentifier => Uint(parameter::CLASS_ID as u64),
            ParameterImageDigest => Uint(parameter::IMAGE_DIGEST as u64),
            ParameterArchiveInfo => Uint(parameter::ARCHIVE_INFO as u64),
            ParameterImageSize => Uint(parameter::IMAGE_SIZE as u64),
            ParameterUri => Uint(parameter::URI as u64),
            ParameterSourceComponent => Uint(parameter::SOURCE_COMPONENT as u64),
        }
    }
}
