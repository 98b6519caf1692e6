use crate::{Feature, FeatureConjunction, Predicate, SectionKind};

/// A type that knows how to serialize itself into the wire format.
pub trait Encode {
    /// Writes this value's encoding into `sink`.
    fn encode(&self, sink: &mut Vec<u8>);
}

impl Encode for u32 {
    fn encode(&self, sink: &mut Vec<u8>) {
        // Writing into a `Vec` cannot fail.
        leb128::write::unsigned(sink, u64::from(*self)).unwrap();
    }
}

impl Encode for str {
    fn encode(&self, sink: &mut Vec<u8>) {
        u32::try_from(self.len()).unwrap().encode(sink);
        sink.extend_from_slice(self.as_bytes());
    }
}

impl Encode for Feature<'_> {
    fn encode(&self, sink: &mut Vec<u8>) {
        sink.push(self.negated as u8);
        self.name.encode(sink);
    }
}

impl Encode for FeatureConjunction<'_> {
    fn encode(&self, sink: &mut Vec<u8>) {
        u32::try_from(self.features().len()).unwrap().encode(sink);
        for feature in self.features() {
            feature.encode(sink);
        }
    }
}

impl Encode for Predicate<'_> {
    fn encode(&self, sink: &mut Vec<u8>) {
        u32::try_from(self.conjunctions().len()).unwrap().encode(sink);
        for conjunction in self.conjunctions() {
            conjunction.encode(sink);
        }
    }
}

/// Encodes one standalone section record: id byte, payload length, payload.
///
/// This is the shape a conditional section's contents field must hold.
pub fn section_record(kind: SectionKind, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 5);
    bytes.push(kind.id());
    u32::try_from(payload.len()).unwrap().encode(&mut bytes);
    bytes.extend_from_slice(payload);
    bytes
}

/// A module binary being encoded.
///
/// The builder performs no ordering or predicate validation. It is your
/// responsibility to emit sections in an order the decoder will accept; this
/// is a potential footgun, but it also makes it easy to construct test cases
/// for bad module encodings.
#[derive(Clone, Debug)]
pub struct ModuleBuilder {
    bytes: Vec<u8>,
}

impl ModuleBuilder {
    /// Begin writing a new module.
    #[rustfmt::skip]
    pub fn new() -> Self {
        ModuleBuilder {
            bytes: vec![
                // Magic
                0x00, 0x61, 0x73, 0x6D,
                // Version
                0x01, 0x00, 0x00, 0x00,
            ],
        }
    }

    /// Writes a section with the given raw payload into this module.
    pub fn section(&mut self, kind: SectionKind, payload: &[u8]) -> &mut Self {
        self.bytes.push(kind.id());
        u32::try_from(payload.len()).unwrap().encode(&mut self.bytes);
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Writes a vector section holding `count` items encoded in `items`.
    pub fn vector_section(&mut self, kind: SectionKind, count: u32, items: &[u8]) -> &mut Self {
        let mut payload = Vec::with_capacity(items.len() + 5);
        count.encode(&mut payload);
        payload.extend_from_slice(items);
        self.section(kind, &payload)
    }

    /// Writes a start section naming one function index.
    pub fn start_section(&mut self, func_index: u32) -> &mut Self {
        let mut payload = Vec::new();
        func_index.encode(&mut payload);
        self.section(SectionKind::Start, &payload)
    }

    /// Writes a data count section.
    pub fn data_count_section(&mut self, count: u32) -> &mut Self {
        let mut payload = Vec::new();
        count.encode(&mut payload);
        self.section(SectionKind::DataCount, &payload)
    }

    /// Writes a custom section.
    pub fn custom_section(&mut self, name: &str, data: &[u8]) -> &mut Self {
        let mut payload = Vec::with_capacity(name.len() + data.len() + 5);
        name.encode(&mut payload);
        payload.extend_from_slice(data);
        self.section(SectionKind::Custom, &payload)
    }

    /// Writes a conditional section gating `contents` behind `predicate`.
    ///
    /// `contents` must be one full encoded section record, as produced by
    /// [`section_record`]; the builder does not check this.
    pub fn conditional_section(&mut self, predicate: &Predicate<'_>, contents: &[u8]) -> &mut Self {
        let mut payload = Vec::with_capacity(contents.len() + 16);
        predicate.encode(&mut payload);
        u32::try_from(contents.len()).unwrap().encode(&mut payload);
        payload.extend_from_slice(contents);
        self.section(SectionKind::Conditional, &payload)
    }

    /// Splats raw bytes into the module, useful for building malformed
    /// encodings.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Get the encoded module as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Finish writing this module and extract ownership of the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
