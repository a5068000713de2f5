//! Typed manifest model for the produce side.
//!
//! The model serializes through [`Cbor`] into exactly the wire layout the
//! parser consumes: the common block, the component list and every
//! command sequence are wrapped in byte strings, and the manifest always
//! carries version 1.

use openssl::hash::{hash, MessageDigest};

use crate::cbor::Cbor;
use crate::constant::{ArchiveAlg, DigestAlg, SuitConstant};

#[derive(Debug)]
pub struct Manifest {
    pub sequence_number: u64,

    pub common: Common,

    pub payload_fetch: Option<Vec<Command>>,
    pub install: Option<Vec<Command>>,
    pub validate: Option<Vec<Command>>,
    pub load: Option<Vec<Command>>,
    pub run: Option<Vec<Command>>,
}

impl Manifest {
    /// Serialize to the raw manifest bytes the parser consumes and the
    /// envelope codec signs.
    pub fn serialize(self) -> Vec<u8> {
        Cbor::from(self).serialize()
    }
}

impl From<Manifest> for Cbor {
    fn from(manifest: Manifest) -> Cbor {
        let head = vec![
            (SuitConstant::ManifestVersion.into(), 1u64.into()),
            (
                SuitConstant::ManifestSequenceNumber.into(),
                manifest.sequence_number.into(),
            ),
            (SuitConstant::Common.into(), manifest.common.into()),
        ];

        let command_sequences = [
            (SuitConstant::PayloadFetch, manifest.payload_fetch),
            (SuitConstant::Install, manifest.install),
            (SuitConstant::Validate, manifest.validate),
            (SuitConstant::Load, manifest.load),
            (SuitConstant::Run, manifest.run),
        ]
        .into_iter()
        .filter(|(_key, value)| value.is_some())
        .map(|(key, value)| (key.into(), sequence_bstr(value.unwrap())));

        Cbor::Map(head.into_iter().chain(command_sequences).collect())
    }
}

#[derive(Debug)]
pub struct Common {
    pub components: Vec<ComponentIdentifier>,
    pub common_sequence: Option<Vec<Command>>,
}

impl From<Common> for Cbor {
    fn from(common: Common) -> Cbor {
        let identifiers = common
            .components
            .into_iter()
            .map(|component| component.into())
            .collect();

        let components = (
            SuitConstant::Components.into(),
            Cbor::Bstr(Cbor::Array(identifiers).serialize()),
        );

        let content = match common.common_sequence {
            Some(sequence) => Cbor::Map(vec![
                components,
                (SuitConstant::CommonSequence.into(), sequence_bstr(sequence)),
            ]),
            None => Cbor::Map(vec![components]),
        };

        Cbor::Bstr(content.serialize())
    }
}

#[derive(Debug)]
pub struct ComponentIdentifier(pub u32);

impl From<u32> for ComponentIdentifier {
    fn from(address: u32) -> Self {
        Self(address)
    }
}

impl From<ComponentIdentifier> for Cbor {
    fn from(component: ComponentIdentifier) -> Cbor {
        Cbor::Array(vec![component.0.to_be_bytes().to_vec().into()])
    }
}

#[derive(Debug)]
pub enum Command {
    ConditionVendorIdentifier(ReportingPolicy),
    ConditionClassIdentifier(ReportingPolicy),
    ConditionImageMatch(ReportingPolicy),
    ConditionComponentOffset(ReportingPolicy),

    DirectiveSetComponentIndex(usize),
    DirectiveTryEach(Vec<Vec<Command>>),
    DirectiveSetParameters(Vec<Parameter>),
    DirectiveOverrideParameters(Vec<Parameter>),
    DirectiveFetch(ReportingPolicy),
    DirectiveCopy(ReportingPolicy),
    DirectiveRun(ReportingPolicy),
}

impl Command {
    fn into_cbor_pair(self) -> (Cbor, Cbor) {
        match self {
            Command::ConditionVendorIdentifier(policy) => (
                SuitConstant::ConditionVendorIdentifier.into(),
                policy.into(),
            ),
            Command::ConditionClassIdentifier(policy) => {
                (SuitConstant::ConditionClassIdentifier.into(), policy.into())
            }
            Command::ConditionImageMatch(policy) => {
                (SuitConstant::ConditionImageMatch.into(), policy.into())
            }
            Command::ConditionComponentOffset(policy) => (
                SuitConstant::ConditionComponentOffset.into(),
                policy.into(),
            ),

            Command::DirectiveSetComponentIndex(index) => (
                SuitConstant::DirectiveSetComponentIndex.into(),
                Cbor::Uint(index as u64),
            ),
            Command::DirectiveTryEach(candidates) => (
                SuitConstant::DirectiveTryEach.into(),
                Cbor::Array(candidates.into_iter().map(sequence_bstr).collect()),
            ),
            Command::DirectiveSetParameters(parameters) => (
                SuitConstant::DirectiveSetParameters.into(),
                parameters.into(),
            ),
            Command::DirectiveOverrideParameters(parameters) => (
                SuitConstant::DirectiveOverrideParameters.into(),
                parameters.into(),
            ),
            Command::DirectiveFetch(policy) => (SuitConstant::DirectiveFetch.into(), policy.into()),
            Command::DirectiveCopy(policy) => (SuitConstant::DirectiveCopy.into(), policy.into()),
            Command::DirectiveRun(policy) => (SuitConstant::DirectiveRun.into(), policy.into()),
        }
    }
}

impl From<Vec<Command>> for Cbor {
    fn from(sequence: Vec<Command>) -> Cbor {
        Cbor::Array(sequence.into_iter().fold(Vec::new(), |mut acc, x| {
            let (key, value) = x.into_cbor_pair();
            acc.push(key);
            acc.push(value);
            acc
        }))
    }
}

/// A command sequence as embedded in the manifest: byte-string wrapped.
fn sequence_bstr(sequence: Vec<Command>) -> Cbor {
    Cbor::Bstr(Cbor::from(sequence).serialize())
}

#[derive(Debug)]
pub enum Parameter {
    VendorIdentifier(Vec<u8>),
    ClassIdentifier(Vec<u8>),
    ImageDigest(Digest),
    ImageSize(u64),
    ArchiveInfo(ArchiveAlg),
    Uri(String),
    SourceComponent(usize),
}

impl Parameter {
    fn into_cbor_pair(self) -> (Cbor, Cbor) {
        match self {
            Parameter::VendorIdentifier(id) => {
                (SuitConstant::ParameterVendorIdentifier.into(), id.into())
            }
            Parameter::ClassIdentifier(id) => {
                (SuitConstant::ParameterClassIdentifier.into(), id.into())
            }
            Parameter::ImageDigest(digest) => {
                (SuitConstant::ParameterImageDigest.into(), digest.into())
            }
            Parameter::ImageSize(size) => (SuitConstant::ParameterImageSize.into(), size.into()),
            Parameter::ArchiveInfo(algorithm) => {
                (SuitConstant::ParameterArchiveInfo.into(), algorithm.into())
            }
            Parameter::Uri(uri) => (SuitConstant::ParameterUri.into(), uri.into()),
            Parameter::SourceComponent(source) => (
                SuitConstant::ParameterSourceComponent.into(),
                Cbor::Uint(source as u64),
            ),
        }
    }
}

impl From<Vec<Parameter>> for Cbor {
    fn from(parameters: Vec<Parameter>) -> Cbor {
        Cbor::Map(
            parameters
                .into_iter()
                .map(|parameter| parameter.into_cbor_pair())
                .collect(),
        )
    }
}

#[derive(Debug)]
pub struct Digest {
    pub algorithm: DigestAlg,
    pub bytes: Vec<u8>,
}

impl Digest {
    /// Digest `input` with `algorithm`.
    pub fn compute(algorithm: DigestAlg, input: &[u8]) -> Digest {
        let hasher = match algorithm {
            DigestAlg::Sha256 => MessageDigest::sha256(),
            DigestAlg::Sha384 => MessageDigest::sha384(),
            DigestAlg::Sha512 => MessageDigest::sha512(),
            DigestAlg::Shake128 => MessageDigest::shake_128(),
            DigestAlg::Shake256 => MessageDigest::shake_256(),
        };

        Digest {
            algorithm,
            bytes: hash(hasher, input).unwrap().to_vec(),
        }
    }
}

impl From<Digest> for Cbor {
    fn from(digest: Digest) -> Cbor {
        Cbor::Array(vec![digest.algorithm.into(), digest.bytes.into()])
    }
}

#[derive(Debug)]
pub struct ReportingPolicy {
    pub record_success: bool,
    pub record_failure: bool,
    pub sysinfo_success: bool,
    pub sysinfo_failure: bool,
}

impl ReportingPolicy {
    pub fn all() -> Self {
        Self {
            record_success: true,
            record_failure: true,
            sysinfo_success: true,
            sysinfo_failure: true,
        }
    }

    pub fn none() -> Self {
        Self {
            record_success: false,
            record_failure: false,
            sysinfo_success: false,
            sysinfo_failure: false,
        }
    }
}

impl From<ReportingPolicy> for Cbor {
    fn from(policy: ReportingPolicy) -> Cbor {
        Cbor::Uint(
            (policy.record_success as u64)
                | ((policy.record_failure as u64) << 1)
                | ((policy.sysinfo_success as u64) << 2)
                | ((policy.sysinfo_failure as u64) << 3),
        )
    }
}
