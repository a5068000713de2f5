//! Manifest parsing: decode the inner CBOR manifest, walk its command
//! sequences, and populate a fixed-capacity component context.
//!
//! All strings in the manifest are copied by reference to their memory
//! locations in the manifest itself, so the buffer must outlive the
//! context; the lifetime parameter enforces this. The parser does not
//! support soft failure; any error results in total manifest rejection.

use minicbor::Decoder;
use tracing::trace;

use crate::constant::{command, common_key, manifest_key, parameter, ArchiveAlg, DigestAlg};
use crate::error::Error;

/// Upper bound on the number of components a manifest may declare.
pub const MAX_COMPONENTS: usize = 8;

#[derive(Clone, Copy, Debug, Default)]
struct Component<'m> {
    run: bool,
    size: u64,
    digest_alg: Option<DigestAlg>,
    archive_alg: Option<ArchiveAlg>,
    digest: Option<&'m [u8]>,
    vendor_id: Option<&'m [u8]>,
    class_id: Option<&'m [u8]>,
    uri: Option<&'m str>,
    source: Option<usize>,
}

/// Parsed manifest state: header fields plus one record per component.
///
/// Per-component accessors index into the fixed array without a range
/// check; callers gate on [`SuitContext::component_count`].
#[derive(Debug)]
pub struct SuitContext<'m> {
    version: u32,
    sequence_number: u64,
    component_count: usize,
    components: [Component<'m>; MAX_COMPONENTS],
}

fn enter_map(decoder: &mut Decoder) -> Result<u64, Error> {
    decoder.map()?.ok_or(Error::IndefiniteLength)
}

fn enter_array(decoder: &mut Decoder) -> Result<u64, Error> {
    decoder.array()?.ok_or(Error::IndefiniteLength)
}

impl<'m> SuitContext<'m> {
    /// Parse a raw manifest. No partially populated context is ever
    /// released; on error the caller holds nothing to discard.
    pub fn parse(manifest: &'m [u8]) -> Result<Self, Error> {
        let mut ctx = SuitContext {
            version: 0,
            sequence_number: 0,
            component_count: 0,
            components: [Component::default(); MAX_COMPONENTS],
        };

        let mut decoder = Decoder::new(manifest);
        let entries = enter_map(&mut decoder)?;

        for _ in 0..entries {
            match decoder.u32()? {
                manifest_key::VERSION => {
                    ctx.version = decoder.u32()?;
                    if ctx.version != 1 {
                        return Err(Error::Version(ctx.version));
                    }
                }
                manifest_key::SEQUENCE_NUMBER => {
                    ctx.sequence_number = decoder.u64()?;
                }
                manifest_key::COMMON => {
                    let common = decoder.bytes()?;
                    ctx.parse_common(common)?;
                }
                manifest_key::PAYLOAD_FETCH
                | manifest_key::INSTALL
                | manifest_key::VALIDATE
                | manifest_key::LOAD
                | manifest_key::RUN => {
                    let sequence = decoder.bytes()?;
                    ctx.eval_sequence(0, sequence)?;
                }
                other => return Err(Error::ManifestField(other)),
            }
        }
        Ok(ctx)
    }

    fn parse_common(&mut self, common: &'m [u8]) -> Result<(), Error> {
        let mut decoder = Decoder::new(common);
        let entries = enter_map(&mut decoder)?;

        for _ in 0..entries {
            match decoder.u32()? {
                /*
                 * Components are referenced by index throughout the
                 * manifest; only the cardinality of the list is consumed
                 * and the component-ID descriptors are discarded.
                 */
                common_key::COMPONENTS => {
                    let list = decoder.bytes()?;
                    let count = enter_array(&mut Decoder::new(list))?;
                    if count > MAX_COMPONENTS as u64 {
                        return Err(Error::TooManyComponents(count));
                    }
                    self.component_count = count as usize;
                }
                common_key::COMMON_SEQUENCE => {
                    let sequence = decoder.bytes()?;
                    self.eval_sequence(0, sequence)?;
                }
                /* tolerated for forward compatibility */
                _ => decoder.skip()?,
            }
        }
        Ok(())
    }

    /// Evaluate one command sequence: an array of (command, argument)
    /// pairs. The component index register is received by value, so index
    /// changes inside nested sequences never leak into the caller's.
    fn eval_sequence(&mut self, mut index: usize, sequence: &'m [u8]) -> Result<(), Error> {
        let mut decoder = Decoder::new(sequence);

        let items = enter_array(&mut decoder)?;
        if items % 2 != 0 {
            return Err(minicbor::decode::Error::message("dangling command without argument").into());
        }
        trace!(index, commands = items / 2, "evaluating command sequence");

        for _ in 0..items / 2 {
            match decoder.u32()? {
                command::OVERRIDE_PARAMETERS => {
                    self.parse_parameters(index, &mut decoder, true)?;
                }

                command::SET_PARAMETERS => {
                    self.parse_parameters(index, &mut decoder, false)?;
                }

                command::RUN => {
                    self.components[index].run = true;
                    decoder.skip()?;
                }

                command::SET_COMPONENT_INDEX => {
                    let new = decoder.u32()? as usize;
                    if new >= self.component_count {
                        return Err(Error::ComponentIndex(new));
                    }
                    index = new;
                }

                /*
                 * An ordered list of candidate sequences. Each candidate
                 * runs against a snapshot of the component records so a
                 * failed attempt leaves no partial writes; the first to
                 * succeed is accepted and the rest are skipped over. If
                 * all fail, the manifest is rejected.
                 */
                command::TRY_EACH => {
                    let candidates = enter_array(&mut decoder)?;
                    let mut passed = false;
                    for _ in 0..candidates {
                        let candidate = decoder.bytes()?;
                        if passed {
                            continue;
                        }
                        let snapshot = self.components;
                        match self.eval_sequence(index, candidate) {
                            Ok(()) => passed = true,
                            Err(_) => self.components = snapshot,
                        }
                    }
                    if !passed {
                        return Err(Error::TryEachExhausted);
                    }
                }

                /*
                 * Conditions and transfer directives are not interpreted
                 * here. They are implied by the presence of the fields
                 * they concern:
                 *  - vendor and class IDs should be checked, if present
                 *  - digests should be verified, if present
                 *  - components should be fetched if a URI is present
                 *  - components should be copied if a source component
                 *    is declared
                 * check-component-offset is underspecified in the draft
                 * and tolerated without effect.
                 */
                command::VENDOR_ID
                | command::CLASS_ID
                | command::IMAGE_MATCH
                | command::COMPONENT_OFFSET
                | command::FETCH
                | command::COPY => decoder.skip()?,

                other => return Err(Error::Command(other)),
            }
        }
        Ok(())
    }

    /// Merge a parameter map into the component at `index`. With
    /// `override_set` every recognized field is replaced; without it only
    /// fields still in their unset state are written. The wire value is
    /// consumed either way.
    fn parse_parameters(
        &mut self,
        index: usize,
        decoder: &mut Decoder<'m>,
        override_set: bool,
    ) -> Result<(), Error> {
        let entries = enter_map(decoder)?;

        for _ in 0..entries {
            let key = decoder.u32()?;
            let component = &mut self.components[index];
            match key {
                parameter::VENDOR_ID => {
                    let value = decoder.bytes()?;
                    if override_set || component.vendor_id.is_none() {
                        component.vendor_id = Some(value);
                    }
                }

                parameter::CLASS_ID => {
                    let value = decoder.bytes()?;
                    if override_set || component.class_id.is_none() {
                        component.class_id = Some(value);
                    }
                }

                parameter::URI => {
                    let value = decoder.str()?;
                    if override_set || component.uri.is_none() {
                        component.uri = Some(value);
                    }
                }

                /* sub-array of algorithm identifier and digest bytes */
                parameter::IMAGE_DIGEST => {
                    if enter_array(decoder)? != 2 {
                        return Err(minicbor::decode::Error::message(
                            "image digest must be [algorithm, digest]",
                        )
                        .into());
                    }
                    let algorithm = decoder.i32()?;
                    let value = decoder.bytes()?;
                    if override_set || component.digest.is_none() {
                        component.digest_alg = Some(DigestAlg::try_from(algorithm)?);
                        component.digest = Some(value);
                    }
                }

                parameter::IMAGE_SIZE => {
                    let value = decoder.u64()?;
                    if override_set || component.size == 0 {
                        component.size = value;
                    }
                }

                parameter::ARCHIVE_INFO => {
                    let value = decoder.u32()?;
                    if override_set || component.archive_alg.is_none() {
                        component.archive_alg = Some(ArchiveAlg::try_from(value)?);
                    }
                }

                /* an index-based link from one component to another */
                parameter::SOURCE_COMPONENT => {
                    let value = decoder.u32()? as usize;
                    if value >= self.component_count {
                        return Err(Error::ComponentIndex(value));
                    }
                    if override_set || component.source.is_none() {
                        component.source = Some(value);
                    }
                }

                other => return Err(Error::Parameter(other)),
            }
        }
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Whether a run directive targeted component `index`.
    pub fn must_run(&self, index: usize) -> bool {
        self.components[index].run
    }

    /// Declared image size; 0 means no size was declared.
    pub fn size(&self, index: usize) -> u64 {
        self.components[index].size
    }

    pub fn has_size(&self, index: usize) -> bool {
        self.size(index) != 0
    }

    pub fn digest_alg(&self, index: usize) -> Option<DigestAlg> {
        self.components[index].digest_alg
    }

    pub fn has_digest(&self, index: usize) -> bool {
        self.components[index].digest_alg.is_some() && self.components[index].digest.is_some()
    }

    pub fn digest_matches(&self, index: usize, digest: &[u8]) -> bool {
        self.has_digest(index) && self.components[index].digest == Some(digest)
    }

    pub fn archive_alg(&self, index: usize) -> Option<ArchiveAlg> {
        self.components[index].archive_alg
    }

    pub fn has_uri(&self, index: usize) -> bool {
        self.components[index].uri.is_some()
    }

    /// The payload URI, borrowed from the manifest buffer.
    pub fn uri(&self, index: usize) -> Option<&'m str> {
        self.components[index].uri
    }

    pub fn has_vendor_id(&self, index: usize) -> bool {
        self.components[index].vendor_id.is_some()
    }

    pub fn vendor_id_matches(&self, index: usize, vendor_id: &[u8]) -> bool {
        self.components[index].vendor_id == Some(vendor_id)
    }

    pub fn has_class_id(&self, index: usize) -> bool {
        self.components[index].class_id.is_some()
    }

    pub fn class_id_matches(&self, index: usize, class_id: &[u8]) -> bool {
        self.components[index].class_id == Some(class_id)
    }

    pub fn has_source_component(&self, index: usize) -> bool {
        self.components[index].source.is_some()
    }

    /// Index of the component this one is copied from, if declared.
    pub fn source_component(&self, index: usize) -> Option<usize> {
        self.components[index].source
    }
}
