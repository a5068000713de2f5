use std::path::PathBuf;

use clap::{Parser, ValueEnum};

mod payload;

use suit_manifest::build::{
    Command, Common, ComponentIdentifier, Digest, Manifest, Parameter, ReportingPolicy,
};
use suit_manifest::{envelope, DigestAlg};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Payload image list to use in manifest
    #[clap(value_parser = cli_legal_image_file)]
    payload: Vec<PathBuf>,

    /// Manifest sequence number
    #[clap(short, long, value_parser, default_value_t = 0)]
    sequence_number: u64,

    /// Base URI that payload file names are appended to
    #[clap(short, long, value_parser, default_value = "http://example.com/")]
    uri_base: String,

    /// Algorithm to create payload digests with
    #[clap(short, long, value_parser, default_value = "sha256")]
    digest_algorithm: CliDigestAlgorithm,

    /// PEM file holding a P-256 signing key; when given, the manifest is
    /// wrapped in a signed envelope
    #[clap(short, long, value_parser)]
    key: Option<PathBuf>,
}

fn cli_legal_image_file(arg: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(arg);

    let extension = path
        .extension()
        .ok_or(String::from("Unknown file type; no extension specified"))?;

    match extension.to_str().unwrap() {
        "bin" | "img" => Ok(path),
        file_type => Err(format!("Unsupported file format `{}`", file_type)),
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Cli::parse();

    let payloads = payload::from_files(&args.payload, &args.uri_base);

    let components: Vec<ComponentIdentifier> = payloads
        .iter()
        .enumerate()
        .map(|(component_index, _payload)| ComponentIdentifier(component_index as u32))
        .collect();

    let common = Common {
        components,
        common_sequence: None,
    };

    let validate = payloads
        .iter()
        .enumerate()
        .map(|(component_index, payload)| {
            vec![
                Command::DirectiveSetComponentIndex(component_index),
                Command::DirectiveOverrideParameters(vec![
                    Parameter::ImageDigest(Digest::compute(
                        args.digest_algorithm.into(),
                        &payload.bytes,
                    )),
                    Parameter::ImageSize(payload.size as u64),
                ]),
                Command::ConditionImageMatch(ReportingPolicy::all()),
            ]
        })
        .reduce(|mut acc, mut sequence| {
            acc.append(&mut sequence);
            acc
        });

    let load = payloads
        .iter()
        .enumerate()
        .map(|(component_index, payload)| {
            vec![
                Command::DirectiveSetComponentIndex(component_index),
                Command::DirectiveOverrideParameters(vec![Parameter::Uri(payload.uri.clone())]),
                Command::DirectiveFetch(ReportingPolicy::all()),
            ]
        })
        .reduce(|mut acc, mut sequence| {
            acc.append(&mut sequence);
            acc
        });

    let run = (!payloads.is_empty()).then(|| {
        vec![
            Command::DirectiveSetComponentIndex(0),
            Command::DirectiveRun(ReportingPolicy::none()),
        ]
    });

    let manifest = Manifest {
        sequence_number: args.sequence_number,

        common,

        validate,
        load,
        run,

        payload_fetch: None,
        install: None,
    };

    let manifest = manifest.serialize();

    match args.key {
        Some(key) => {
            let pem = std::fs::read(&key)
                .unwrap_or_else(|_| panic!("could not read key file `{:?}`", key));
            let envelope = envelope::wrap(&pem, &manifest)
                .unwrap_or_else(|error| panic!("could not wrap manifest: {}", error));

            println!("{}", hex::encode(envelope));
        }
        None => println!("{}", hex::encode(manifest)),
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
    Shake128,
    Shake256,
}

impl From<CliDigestAlgorithm> for DigestAlg {
    fn from(algorithm: CliDigestAlgorithm) -> Self {
        match algorithm {
            CliDigestAlgorithm::Sha256 => DigestAlg::Sha256,
            CliDigestAlgorithm::Sha384 => DigestAlg::Sha384,
            CliDigestAlgorithm::Sha512 => DigestAlg::Sha512,
            CliDigestAlgorithm::Shake128 => DigestAlg::Shake128,
            CliDigestAlgorithm::Shake256 => DigestAlg::Shake256,
        }
    }
}
