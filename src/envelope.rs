//! The outer SUIT envelope: a CBOR map binding a signed digest of the
//! manifest to the manifest bytes themselves.

use minicbor::Decoder;
use openssl::sha::sha256;
use tracing::debug;

use crate::cbor::Cbor;
use crate::constant::{cose_alg, envelope_key, SuitConstant};
use crate::cose;
use crate::error::Error;

/// Sign `manifest` into an envelope with the P-256 private key in `pem`.
///
/// The envelope is `{auth-wrapper: bstr, manifest: bstr}` where the
/// wrapper holds a one-element array with a COSE Sign1 item whose payload
/// is `[digest-algorithm, digest]` over the manifest bytes.
pub fn wrap(pem: &[u8], manifest: &[u8]) -> Result<Vec<u8>, Error> {
    let signer = cose::Signer::from_pem(pem)?;

    let digest = sha256(manifest);
    let payload = Cbor::Array(vec![
        Cbor::Nint(-(cose_alg::SHA256 as i64) as u64),
        Cbor::Bstr(digest.to_vec()),
    ])
    .serialize();

    let auth_item = signer.sign1(&payload)?;
    let auth_wrapper = Cbor::Array(vec![Cbor::Raw(auth_item)]).serialize();

    let envelope = Cbor::Map(vec![
        (
            SuitConstant::AuthenticationWrapper.into(),
            Cbor::Bstr(auth_wrapper),
        ),
        (SuitConstant::Manifest.into(), Cbor::Bstr(manifest.to_vec())),
    ])
    .serialize();

    debug!(len = envelope.len(), "wrapped manifest envelope");
    Ok(envelope)
}

/// Verify an envelope with the P-256 public key in `pem` and release the
/// manifest bytes. The returned slice borrows from `envelope`.
pub fn unwrap<'a>(pem: &[u8], envelope: &'a [u8]) -> Result<&'a [u8], Error> {
    let verifier = cose::Verifier::from_pem(pem)?;

    let mut decoder = Decoder::new(envelope);
    let entries = decoder.map()?.ok_or(Error::IndefiniteLength)?;

    let mut auth = None;
    let mut manifest = None;
    for _ in 0..entries {
        match decoder.u32()? {
            envelope_key::AUTH_WRAPPER => auth = Some(decoder.bytes()?),
            envelope_key::MANIFEST => manifest = Some(decoder.bytes()?),
            _ => decoder.skip()?,
        }
    }
    let (auth, manifest) = match (auth, manifest) {
        (Some(auth), Some(manifest)) => (auth, manifest),
        _ => return Err(Error::IncompleteEnvelope),
    };

    /* the wrapper must hold exactly one COSE Sign1 item */
    let mut wrapper = Decoder::new(auth);
    if wrapper.array()?.ok_or(Error::IndefiniteLength)? != 1 {
        return Err(Error::IncompleteEnvelope);
    }
    let payload = verifier.verify1(&auth[wrapper.position()..])?;

    /* signed payload: [digest-algorithm, digest] */
    let mut signed = Decoder::new(payload);
    signed.array()?.ok_or(Error::IndefiniteLength)?;
    signed.skip()?; /* digest algorithm, implied by the 32-byte comparison */
    let digest = signed.bytes()?;

    let computed = sha256(manifest);
    if digest.len() != 32 || digest != &computed[..] {
        return Err(Error::DigestMismatch);
    }

    debug!(len = manifest.len(), "verified manifest envelope");
    Ok(manifest)
}
