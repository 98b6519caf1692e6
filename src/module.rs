use crate::{
    BinaryReader, CustomSection, Error, ErrorKind, HostFeatures, ModuleBuilder, Resolver, Result,
    SectionIter, SectionKind, SectionPayload,
};
use indexmap::IndexMap;

/// The merged contents of every occurrence of one vector section kind.
///
/// Item payloads stay in stream order: element, code and data items are
/// positionally correlated with function and type indices that must already
/// be fully known, so append order is final order.
#[derive(Clone, Debug, Default)]
pub struct MergedSection<'a> {
    count: u32,
    chunks: Vec<&'a [u8]>,
}

impl<'a> MergedSection<'a> {
    /// The total item count across all occurrences.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The item bytes of each occurrence, in stream order.
    pub fn chunks(&self) -> &[&'a [u8]] {
        &self.chunks
    }

    /// The concatenated item bytes of all occurrences.
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.chunks.iter().map(|c| c.len()).sum());
        for chunk in &self.chunks {
            bytes.extend_from_slice(chunk);
        }
        bytes
    }

    fn append(&mut self, count: u32, items: &'a [u8], offset: usize) -> Result<()> {
        self.count = self
            .count
            .checked_add(count)
            .ok_or_else(|| Error::new(ErrorKind::CountOverflow, offset))?;
        self.chunks.push(items);
        Ok(())
    }
}

// Chunk boundaries are an artifact of how many occurrences the wire had, not
// part of the merged value, so equality compares the flattened bytes.
impl PartialEq for MergedSection<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self
                .chunks
                .iter()
                .flat_map(|c| c.iter())
                .eq(other.chunks.iter().flat_map(|c| c.iter()))
    }
}

impl Eq for MergedSection<'_> {}

/// A fully resolved and merged module.
///
/// This is the flattened result of one decode: every conditional section has
/// been resolved against the host's features, repeated sections of the same
/// kind are concatenated in stream order, start sections are collected into
/// one ordered list and data count sections are summed. The module carries no
/// conditionality; it is what gets handed to a validator or instantiator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Module<'a> {
    sections: IndexMap<SectionKind, MergedSection<'a>>,
    start: Vec<u32>,
    data_count: Option<u32>,
    customs: Vec<CustomSection<'a>>,
}

impl<'a> Module<'a> {
    /// Decodes a whole module binary, resolving conditional sections against
    /// `features`.
    ///
    /// `data` must start with the `\0asm` magic and version header. Any
    /// decode failure aborts with no partial module.
    pub fn parse(data: &'a [u8], features: &HostFeatures) -> Result<Module<'a>> {
        let mut reader = BinaryReader::new(data, 0);
        reader.read_header()?;
        Module::assemble(Resolver::new(SectionIter::new(reader), features))
    }

    /// Folds a resolved section stream into a module.
    pub fn assemble(resolver: Resolver<'a, '_>) -> Result<Module<'a>> {
        let mut module = Module::default();
        for section in resolver {
            let section = section?;
            match section.payload {
                SectionPayload::Vector { count, items } => {
                    module
                        .sections
                        .entry(section.kind)
                        .or_default()
                        .append(count, items, section.offset)?;
                }
                SectionPayload::Start { func_index } => {
                    module.start.push(func_index);
                }
                SectionPayload::DataCount { count } => {
                    let sum = module
                        .data_count
                        .unwrap_or(0)
                        .checked_add(count)
                        .ok_or_else(|| Error::new(ErrorKind::CountOverflow, section.offset))?;
                    module.data_count = Some(sum);
                }
                SectionPayload::Custom(custom) => {
                    module.customs.push(custom);
                }
            }
        }
        Ok(module)
    }

    /// The merged contents of the given vector section kind, if any
    /// occurrence was resolved.
    pub fn section(&self, kind: SectionKind) -> Option<&MergedSection<'a>> {
        self.sections.get(&kind)
    }

    /// The start function indices, in the order their sections appeared.
    ///
    /// An instantiator is contracted to run these sequentially.
    pub fn start(&self) -> &[u32] {
        &self.start
    }

    /// The summed data count, or `None` if no data count section appeared.
    pub fn data_count(&self) -> Option<u32> {
        self.data_count
    }

    /// The custom sections, in stream order.
    pub fn custom_sections(&self) -> &[CustomSection<'a>] {
        &self.customs
    }

    /// Re-encodes this module as a plain, condition-free binary with one
    /// section per populated kind in canonical order.
    ///
    /// A start list with more than one entry is emitted as repeated start
    /// sections, which only a decoder aware of this format's aggregation
    /// rules will accept.
    pub fn encode(&self) -> Vec<u8> {
        use SectionKind::*;
        let mut builder = ModuleBuilder::new();
        for kind in [Type, Import, Function, Table, Memory, Tag, Global, Export] {
            self.encode_vector(&mut builder, kind);
        }
        for index in &self.start {
            builder.start_section(*index);
        }
        self.encode_vector(&mut builder, Element);
        if let Some(count) = self.data_count {
            builder.data_count_section(count);
        }
        self.encode_vector(&mut builder, Code);
        self.encode_vector(&mut builder, Data);
        for custom in &self.customs {
            builder.custom_section(custom.name, custom.data);
        }
        builder.finish()
    }

    fn encode_vector(&self, builder: &mut ModuleBuilder, kind: SectionKind) {
        if let Some(merged) = self.sections.get(&kind) {
            builder.vector_section(kind, merged.count, &merged.bytes());
        }
    }
}
