//! Single-signer COSE Sign1 over ECDSA P-256, keys loaded from PEM.

use minicbor::data::Type;
use minicbor::Decoder;
use openssl::bn::BigNum;
use openssl::ec::EcKey;
use openssl::ecdsa::EcdsaSig;
use openssl::pkey::{Private, Public};
use openssl::sha::sha256;

use crate::cbor::Cbor;
use crate::constant::cose_alg;
use crate::error::Error;

/* raw r||s over P-256 */
const SIGNATURE_LEN: usize = 64;

pub(crate) struct Signer {
    key: EcKey<Private>,
}

pub(crate) struct Verifier {
    key: EcKey<Public>,
}

impl Signer {
    pub(crate) fn from_pem(pem: &[u8]) -> Result<Self, Error> {
        Ok(Signer {
            key: EcKey::private_key_from_pem(pem)?,
        })
    }

    /// Emit an untagged COSE_Sign1 item carrying `payload`, signed with ES256.
    pub(crate) fn sign1(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let protected = protected_headers();
        let digest = sha256(&sig_structure(&protected, payload));

        let signature = EcdsaSig::sign(&digest, &self.key)?;
        let mut raw = signature.r().to_vec_padded(32)?;
        raw.extend(signature.s().to_vec_padded(32)?);

        Ok(Cbor::Array(vec![
            Cbor::Bstr(protected),
            Cbor::Map(Vec::new()),
            Cbor::Bstr(payload.to_vec()),
            Cbor::Bstr(raw),
        ])
        .serialize())
    }
}

impl Verifier {
    pub(crate) fn from_pem(pem: &[u8]) -> Result<Self, Error> {
        Ok(Verifier {
            key: EcKey::public_key_from_pem(pem)?,
        })
    }

    /// Verify a serialized COSE_Sign1 item and release its payload.
    /// A leading tag is tolerated; the signature must be ES256.
    pub(crate) fn verify1<'a>(&self, item: &'a [u8]) -> Result<&'a [u8], Error> {
        let mut decoder = Decoder::new(item);

        if decoder.datatype()? == Type::Tag {
            decoder.tag()?;
        }
        if decoder.array()?.ok_or(Error::IndefiniteLength)? != 4 {
            return Err(Error::Sign1);
        }

        let protected = decoder.bytes()?;
        decoder.skip()?; /* unprotected headers */
        let payload = decoder.bytes()?;
        let signature = decoder.bytes()?;

        if signature.len() != SIGNATURE_LEN {
            return Err(Error::Sign1);
        }
        match signed_algorithm(protected)? {
            cose_alg::ES256 => (),
            other => return Err(Error::SignatureAlgorithm(other)),
        }

        let digest = sha256(&sig_structure(protected, payload));
        let r = BigNum::from_slice(&signature[..32])?;
        let s = BigNum::from_slice(&signature[32..])?;

        if EcdsaSig::from_private_components(r, s)?.verify(&digest, &self.key)? {
            Ok(payload)
        } else {
            Err(Error::BadSignature)
        }
    }
}

/// The serialized protected header map `{1: ES256}`.
fn protected_headers() -> Vec<u8> {
    Cbor::Map(vec![(
        Cbor::Uint(1),
        Cbor::Nint(-(cose_alg::ES256 as i64) as u64),
    )])
    .serialize()
}

/// The Sig_structure covered by the signature (RFC 9052, Section 4.4):
/// `["Signature1", protected, external_aad = h'', payload]`.
fn sig_structure(protected: &[u8], payload: &[u8]) -> Vec<u8> {
    Cbor::Array(vec![
        Cbor::Tstr("Signature1".to_string()),
        Cbor::Bstr(protected.to_vec()),
        Cbor::Bstr(Vec::new()),
        Cbor::Bstr(payload.to_vec()),
    ])
    .serialize()
}

fn signed_algorithm(protected: &[u8]) -> Result<i32, Error> {
    let mut decoder = Decoder::new(protected);
    let entries = decoder.map()?.ok_or(Error::IndefiniteLength)?;

    let mut algorithm = None;
    for _ in 0..entries {
        if decoder.i32()? == 1 {
            algorithm = Some(decoder.i32()?);
        } else {
            decoder.skip()?;
        }
    }
    algorithm.ok_or(Error::Sign1)
}
