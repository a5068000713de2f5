use hex_literal::hex;

use suit_manifest::build::{
    Command, Common, ComponentIdentifier, Digest, Manifest, Parameter, ReportingPolicy,
};
use suit_manifest::{ArchiveAlg, Cbor, DigestAlg, Error, SuitContext, MAX_COMPONENTS};

const TEST_SIZE: u64 = 34768;
const TEST_DIGEST: [u8; 32] =
    hex!("00112233445566778899aabbccddeeff0123456789abcdeffedcba9876543210");
const TEST_DIGEST_2: [u8; 32] =
    hex!("102132435465768798a9bacbdcedfe0f112233445566778899aabbccddeeff00");
const TEST_VENDOR_ID: [u8; 16] = hex!("fa6b4a53d5ad5fdfbe9de663e4d41ffe");
const TEST_CLASS_ID: [u8; 16] = hex!("1492af1425695e48bf429b2d51f2ab45");
const TEST_URI: &str = "http://example.com/file.bin";

fn components(count: usize) -> Common {
    Common {
        components: (0..count)
            .map(|index| ComponentIdentifier(index as u32))
            .collect(),
        common_sequence: None,
    }
}

fn base_manifest(common: Common) -> Manifest {
    Manifest {
        sequence_number: 1,
        common,
        payload_fetch: None,
        install: None,
        validate: None,
        load: None,
        run: None,
    }
}

fn image_digest() -> Parameter {
    Parameter::ImageDigest(Digest {
        algorithm: DigestAlg::Sha256,
        bytes: TEST_DIGEST.to_vec(),
    })
}

fn full_metadata() -> Vec<Parameter> {
    vec![
        Parameter::VendorIdentifier(TEST_VENDOR_ID.to_vec()),
        Parameter::ClassIdentifier(TEST_CLASS_ID.to_vec()),
        image_digest(),
        Parameter::ImageSize(TEST_SIZE),
        Parameter::Uri(TEST_URI.to_string()),
    ]
}

/// A common block for hand-encoded manifests: `count` component IDs,
/// no common sequence.
fn raw_common(count: usize) -> Cbor {
    let identifiers = (0..count)
        .map(|index| Cbor::Array(vec![Cbor::Bstr((index as u32).to_be_bytes().to_vec())]))
        .collect();

    Cbor::Bstr(
        Cbor::Map(vec![(
            Cbor::Uint(2),
            Cbor::Bstr(Cbor::Array(identifiers).serialize()),
        )])
        .serialize(),
    )
}

#[test]
fn boot_only() {
    let mut manifest = base_manifest(components(1));
    manifest.run = Some(vec![
        Command::DirectiveSetComponentIndex(0),
        Command::DirectiveRun(ReportingPolicy::none()),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.version(), 1);
    assert_eq!(ctx.sequence_number(), 1);
    assert_eq!(ctx.component_count(), 1);
    assert!(ctx.must_run(0));
    assert!(!ctx.has_uri(0));
    assert!(!ctx.has_digest(0));
    assert!(!ctx.has_vendor_id(0));
    assert!(!ctx.has_class_id(0));
    assert!(!ctx.has_size(0));
}

#[test]
fn download_and_install() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![
        Command::DirectiveSetComponentIndex(0),
        Command::DirectiveOverrideParameters(full_metadata()),
        Command::DirectiveFetch(ReportingPolicy::all()),
        Command::ConditionImageMatch(ReportingPolicy::all()),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert!(ctx.vendor_id_matches(0, &TEST_VENDOR_ID));
    assert!(ctx.class_id_matches(0, &TEST_CLASS_ID));
    assert!(ctx.digest_matches(0, &TEST_DIGEST));
    assert_eq!(ctx.digest_alg(0), Some(DigestAlg::Sha256));
    assert_eq!(ctx.uri(0), Some(TEST_URI));
    assert_eq!(ctx.size(0), TEST_SIZE);
    assert!(!ctx.must_run(0));
}

#[test]
fn download_install_and_boot() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![
        Command::DirectiveSetComponentIndex(0),
        Command::DirectiveOverrideParameters(full_metadata()),
        Command::DirectiveFetch(ReportingPolicy::all()),
    ]);
    manifest.run = Some(vec![
        Command::DirectiveSetComponentIndex(0),
        Command::DirectiveRun(ReportingPolicy::none()),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert!(ctx.vendor_id_matches(0, &TEST_VENDOR_ID));
    assert!(ctx.class_id_matches(0, &TEST_CLASS_ID));
    assert!(ctx.digest_matches(0, &TEST_DIGEST));
    assert_eq!(ctx.uri(0), Some(TEST_URI));
    assert_eq!(ctx.size(0), TEST_SIZE);
    assert!(ctx.must_run(0));
}

#[test]
fn load_from_external_storage() {
    let mut manifest = base_manifest(components(2));
    manifest.install = Some(vec![
        Command::DirectiveSetComponentIndex(0),
        Command::DirectiveOverrideParameters(vec![
            image_digest(),
            Parameter::ImageSize(TEST_SIZE),
            Parameter::Uri(TEST_URI.to_string()),
        ]),
        Command::DirectiveFetch(ReportingPolicy::all()),
    ]);
    manifest.load = Some(vec![
        Command::DirectiveSetComponentIndex(1),
        Command::DirectiveOverrideParameters(vec![Parameter::SourceComponent(0)]),
        Command::DirectiveCopy(ReportingPolicy::all()),
    ]);
    manifest.run = Some(vec![
        Command::DirectiveSetComponentIndex(1),
        Command::DirectiveRun(ReportingPolicy::none()),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.component_count(), 2);
    assert_eq!(ctx.uri(0), Some(TEST_URI));
    assert_eq!(ctx.size(0), TEST_SIZE);
    assert!(ctx.digest_matches(0, &TEST_DIGEST));
    assert!(ctx.has_source_component(1));
    assert_eq!(ctx.source_component(1), Some(0));
    assert!(!ctx.must_run(0));
    assert!(ctx.must_run(1));
}

#[test]
fn compatibility_driven_install() {
    let mut manifest = base_manifest(Common {
        components: vec![ComponentIdentifier(0), ComponentIdentifier(1)],
        common_sequence: Some(vec![
            Command::DirectiveSetComponentIndex(1),
            Command::DirectiveOverrideParameters(vec![
                Parameter::VendorIdentifier(TEST_VENDOR_ID.to_vec()),
                Parameter::ClassIdentifier(TEST_CLASS_ID.to_vec()),
            ]),
            Command::ConditionVendorIdentifier(ReportingPolicy::all()),
            Command::ConditionClassIdentifier(ReportingPolicy::all()),
        ]),
    });
    manifest.install = Some(vec![
        Command::DirectiveSetComponentIndex(1),
        Command::DirectiveOverrideParameters(vec![image_digest(), Parameter::ImageSize(TEST_SIZE)]),
    ]);
    manifest.run = Some(vec![
        Command::DirectiveSetComponentIndex(1),
        Command::DirectiveRun(ReportingPolicy::none()),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert!(!ctx.has_vendor_id(0));
    assert!(!ctx.has_class_id(0));
    assert!(ctx.vendor_id_matches(1, &TEST_VENDOR_ID));
    assert!(ctx.class_id_matches(1, &TEST_CLASS_ID));
    assert!(ctx.digest_matches(1, &TEST_DIGEST));
    assert_eq!(ctx.size(1), TEST_SIZE);
    assert!(!ctx.must_run(0));
    assert!(ctx.must_run(1));
}

#[test]
fn two_images() {
    let mut manifest = base_manifest(components(2));
    manifest.install = Some(vec![
        Command::DirectiveSetComponentIndex(0),
        Command::DirectiveOverrideParameters(vec![
            image_digest(),
            Parameter::ImageSize(TEST_SIZE),
            Parameter::Uri("http://example.com/file1.bin".to_string()),
        ]),
        Command::DirectiveFetch(ReportingPolicy::all()),
        Command::DirectiveSetComponentIndex(1),
        Command::DirectiveOverrideParameters(vec![
            Parameter::ImageDigest(Digest {
                algorithm: DigestAlg::Sha256,
                bytes: TEST_DIGEST_2.to_vec(),
            }),
            Parameter::ImageSize(1024),
            Parameter::Uri("http://example.com/file2.bin".to_string()),
        ]),
        Command::DirectiveFetch(ReportingPolicy::all()),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.uri(0), Some("http://example.com/file1.bin"));
    assert_eq!(ctx.uri(1), Some("http://example.com/file2.bin"));
    assert!(ctx.digest_matches(0, &TEST_DIGEST));
    assert!(ctx.digest_matches(1, &TEST_DIGEST_2));
    assert_eq!(ctx.size(0), TEST_SIZE);
    assert_eq!(ctx.size(1), 1024);
}

#[test]
fn version_gate() {
    let bytes = Cbor::Map(vec![(Cbor::Uint(1), Cbor::Uint(2))]).serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::Version(2))
    ));
}

#[test]
fn capacity_gate() {
    let over = MAX_COMPONENTS + 1;
    let bytes = base_manifest(components(over)).serialize();

    match SuitContext::parse(&bytes) {
        Err(Error::TooManyComponents(count)) => assert_eq!(count, over as u64),
        other => panic!("expected capacity rejection, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn set_respects_earlier_override() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![
        Command::DirectiveOverrideParameters(vec![
            Parameter::ImageSize(100),
            Parameter::Uri("http://example.com/first.bin".to_string()),
        ]),
        Command::DirectiveSetParameters(vec![
            Parameter::ImageSize(200),
            Parameter::Uri("http://example.com/second.bin".to_string()),
        ]),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.size(0), 100);
    assert_eq!(ctx.uri(0), Some("http://example.com/first.bin"));
}

#[test]
fn override_replaces_earlier_set() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![
        Command::DirectiveSetParameters(vec![
            Parameter::ImageSize(200),
            Parameter::Uri("http://example.com/second.bin".to_string()),
        ]),
        Command::DirectiveOverrideParameters(vec![
            Parameter::ImageSize(100),
            Parameter::Uri("http://example.com/first.bin".to_string()),
        ]),
    ]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.size(0), 100);
    assert_eq!(ctx.uri(0), Some("http://example.com/first.bin"));
}

#[test]
fn set_fills_unset_fields() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![Command::DirectiveSetParameters(vec![
        Parameter::ImageSize(TEST_SIZE),
    ])]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.size(0), TEST_SIZE);
}

#[test]
fn try_each_accepts_first_passing_candidate() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![Command::DirectiveTryEach(vec![
        /* component index 4 does not exist, so this candidate fails */
        vec![Command::DirectiveSetComponentIndex(4)],
        vec![Command::DirectiveOverrideParameters(vec![
            Parameter::ImageSize(TEST_SIZE),
        ])],
    ])]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.size(0), TEST_SIZE);
}

#[test]
fn try_each_rolls_back_failed_candidates() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![Command::DirectiveTryEach(vec![
        /* writes a URI before failing; the write must not survive */
        vec![
            Command::DirectiveOverrideParameters(vec![Parameter::Uri(
                "http://example.com/rollback.bin".to_string(),
            )]),
            Command::DirectiveSetComponentIndex(7),
        ],
        vec![Command::DirectiveOverrideParameters(vec![
            Parameter::ImageSize(TEST_SIZE),
        ])],
    ])]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert!(!ctx.has_uri(0));
    assert_eq!(ctx.size(0), TEST_SIZE);
}

#[test]
fn try_each_fails_when_all_candidates_fail() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![Command::DirectiveTryEach(vec![
        vec![Command::DirectiveSetComponentIndex(4)],
        vec![Command::DirectiveSetComponentIndex(5)],
    ])]);
    let bytes = manifest.serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::TryEachExhausted)
    ));
}

#[test]
fn component_index_out_of_range_is_rejected() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![Command::DirectiveSetComponentIndex(3)]);
    let bytes = manifest.serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::ComponentIndex(3))
    ));
}

#[test]
fn source_out_of_range_is_rejected() {
    let mut manifest = base_manifest(components(2));
    manifest.install = Some(vec![Command::DirectiveOverrideParameters(vec![
        Parameter::SourceComponent(5),
    ])]);
    let bytes = manifest.serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::ComponentIndex(5))
    ));
}

#[test]
fn unknown_top_level_field_is_rejected() {
    let bytes = Cbor::Map(vec![
        (Cbor::Uint(1), Cbor::Uint(1)),
        (Cbor::Uint(99), Cbor::Uint(0)),
    ])
    .serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::ManifestField(99))
    ));
}

#[test]
fn unknown_common_field_is_tolerated() {
    let common = Cbor::Bstr(
        Cbor::Map(vec![
            (
                Cbor::Uint(2),
                Cbor::Bstr(
                    Cbor::Array(vec![Cbor::Array(vec![Cbor::Bstr(vec![0, 0, 0, 0])])]).serialize(),
                ),
            ),
            (Cbor::Uint(99), Cbor::Tstr("from the future".to_string())),
        ])
        .serialize(),
    );
    let bytes = Cbor::Map(vec![
        (Cbor::Uint(1), Cbor::Uint(1)),
        (Cbor::Uint(2), Cbor::Uint(7)),
        (Cbor::Uint(3), common),
    ])
    .serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.sequence_number(), 7);
    assert_eq!(ctx.component_count(), 1);
}

#[test]
fn archive_info_is_recorded() {
    let mut manifest = base_manifest(components(1));
    manifest.install = Some(vec![Command::DirectiveOverrideParameters(vec![
        Parameter::ArchiveInfo(ArchiveAlg::Gzip),
        Parameter::ImageSize(TEST_SIZE),
    ])]);
    let bytes = manifest.serialize();

    let ctx = SuitContext::parse(&bytes).unwrap();

    assert_eq!(ctx.archive_alg(0), Some(ArchiveAlg::Gzip));
}

#[test]
fn unknown_digest_algorithm_is_rejected() {
    let digest_pair = Cbor::Array(vec![Cbor::Uint(99), Cbor::Bstr(TEST_DIGEST.to_vec())]);
    let parameters = Cbor::Map(vec![(Cbor::Uint(3), digest_pair)]);
    let sequence = Cbor::Bstr(Cbor::Array(vec![Cbor::Uint(20), parameters]).serialize());
    let bytes = Cbor::Map(vec![
        (Cbor::Uint(1), Cbor::Uint(1)),
        (Cbor::Uint(3), raw_common(1)),
        (Cbor::Uint(9), sequence),
    ])
    .serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::DigestAlgorithm(99))
    ));
}

#[test]
fn unsupported_command_is_rejected() {
    /* directive 31 (swap) is outside the supported command set */
    let sequence = Cbor::Bstr(Cbor::Array(vec![Cbor::Uint(31), Cbor::Uint(0)]).serialize());
    let bytes = Cbor::Map(vec![
        (Cbor::Uint(1), Cbor::Uint(1)),
        (Cbor::Uint(3), raw_common(1)),
        (Cbor::Uint(9), sequence),
    ])
    .serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::Command(31))
    ));
}

#[test]
fn unsupported_parameter_is_rejected() {
    let parameters = Cbor::Map(vec![(Cbor::Uint(99), Cbor::Uint(0))]);
    let sequence = Cbor::Bstr(Cbor::Array(vec![Cbor::Uint(20), parameters]).serialize());
    let bytes = Cbor::Map(vec![
        (Cbor::Uint(1), Cbor::Uint(1)),
        (Cbor::Uint(3), raw_common(1)),
        (Cbor::Uint(9), sequence),
    ])
    .serialize();

    assert!(matches!(
        SuitContext::parse(&bytes),
        Err(Error::Parameter(99))
    ));
}
