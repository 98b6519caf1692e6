use crate::{BinaryReader, Error, ErrorKind, Predicate, Result};
use core::fmt;

/// Known section identifiers of a module.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum SectionKind {
    /// The custom section. Never gated by a predicate and exempt from the
    /// ordering constraint.
    Custom = 0,
    /// The type section.
    Type = 1,
    /// The import section.
    Import = 2,
    /// The function section.
    Function = 3,
    /// The table section.
    Table = 4,
    /// The memory section.
    Memory = 5,
    /// The global section.
    Global = 6,
    /// The export section.
    Export = 7,
    /// The start section.
    Start = 8,
    /// The element section.
    Element = 9,
    /// The code section.
    Code = 10,
    /// The data section.
    Data = 11,
    /// The data count section.
    DataCount = 12,
    /// The tag section.
    Tag = 13,
    /// The conditional section: a predicate over features plus one wrapped
    /// section record.
    Conditional = 14,
}

impl SectionKind {
    /// Decodes a section id byte.
    pub fn from_id(id: u8) -> Option<SectionKind> {
        Some(match id {
            0 => SectionKind::Custom,
            1 => SectionKind::Type,
            2 => SectionKind::Import,
            3 => SectionKind::Function,
            4 => SectionKind::Table,
            5 => SectionKind::Memory,
            6 => SectionKind::Global,
            7 => SectionKind::Export,
            8 => SectionKind::Start,
            9 => SectionKind::Element,
            10 => SectionKind::Code,
            11 => SectionKind::Data,
            12 => SectionKind::DataCount,
            13 => SectionKind::Tag,
            14 => SectionKind::Conditional,
            _ => return None,
        })
    }

    /// The id byte this kind is encoded as.
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Returns whether this kind's payload is an item vector that repeated
    /// occurrences concatenate.
    pub fn is_vector(self) -> bool {
        use SectionKind::*;
        matches!(
            self,
            Type | Import | Function | Table | Memory | Tag | Global | Export | Element | Code
                | Data
        )
    }

    /// Position of this kind in the fixed section ordering, or `None` for
    /// kinds exempt from it.
    pub(crate) fn order(self) -> Option<u8> {
        use SectionKind::*;
        Some(match self {
            Type => 0,
            Import => 1,
            Function => 2,
            Table => 3,
            Memory => 4,
            Tag => 5,
            Global => 6,
            Export => 7,
            Start => 8,
            Element => 9,
            DataCount => 10,
            Code => 11,
            Data => 12,
            Custom | Conditional => return None,
        })
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SectionKind::Custom => "custom",
            SectionKind::Type => "type",
            SectionKind::Import => "import",
            SectionKind::Function => "function",
            SectionKind::Table => "table",
            SectionKind::Memory => "memory",
            SectionKind::Global => "global",
            SectionKind::Export => "export",
            SectionKind::Start => "start",
            SectionKind::Element => "element",
            SectionKind::Code => "code",
            SectionKind::Data => "data",
            SectionKind::DataCount => "data count",
            SectionKind::Tag => "tag",
            SectionKind::Conditional => "conditional",
        })
    }
}

/// One raw section record: a kind tag and exactly the bytes its declared
/// length covered. The payload is not interpreted, even for conditional
/// sections.
#[derive(Clone, Debug)]
pub struct RawSection<'a> {
    /// The kind of this section.
    pub kind: SectionKind,
    /// The section's payload bytes.
    pub bytes: &'a [u8],
    pub(crate) offset: usize,
}

impl<'a> RawSection<'a> {
    /// The offset of this section's payload relative to the start of the
    /// input.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// A lazy iterator of raw section records over a section list.
///
/// Each record reports its kind and exactly the bytes its declared length
/// specified; the cursor advances past those bytes unconditionally, whether
/// or not downstream logic will look at them.
#[derive(Clone, Debug)]
pub struct SectionIter<'a> {
    reader: BinaryReader<'a>,
    done: bool,
}

impl<'a> SectionIter<'a> {
    /// Creates a section iterator over the given reader, which must be
    /// positioned at the start of a section list.
    pub fn new(reader: BinaryReader<'a>) -> SectionIter<'a> {
        SectionIter {
            reader,
            done: false,
        }
    }

    pub(crate) fn read_section(&mut self) -> Result<RawSection<'a>> {
        let id_offset = self.reader.original_position();
        let id = self.reader.read_u8()?;
        let kind = SectionKind::from_id(id)
            .ok_or_else(|| Error::new(ErrorKind::UnknownSection(id), id_offset))?;
        let len = self.reader.read_var_u32()? as usize;
        let offset = self.reader.original_position();
        let bytes = self.reader.read_bytes(len)?;
        Ok(RawSection {
            kind,
            bytes,
            offset,
        })
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.reader.eof()
    }

    pub(crate) fn position(&self) -> usize {
        self.reader.original_position()
    }
}

impl<'a> Iterator for SectionIter<'a> {
    type Item = Result<RawSection<'a>>;

    fn next(&mut self) -> Option<Result<RawSection<'a>>> {
        if self.done || self.reader.eof() {
            return None;
        }
        let section = self.read_section();
        if section.is_err() {
            self.done = true;
        }
        Some(section)
    }
}

/// A reader for the payload of a conditional section.
///
/// Splits the payload into the gating predicate and the opaque wrapped
/// contents. The contents are length-delimited and are never inspected here:
/// that split must itself be skippable so that unknown constructs behind an
/// unsatisfied predicate never trigger a parse error.
#[derive(Clone, Debug)]
pub struct ConditionalSectionReader<'a> {
    predicate: Predicate<'a>,
    contents: &'a [u8],
    contents_offset: usize,
}

impl<'a> ConditionalSectionReader<'a> {
    /// Constructs a new `ConditionalSectionReader` for the given payload and
    /// offset.
    pub fn new(data: &'a [u8], offset: usize) -> Result<ConditionalSectionReader<'a>> {
        let mut reader = BinaryReader::new(data, offset);
        let predicate = reader.read()?;
        let len = reader.read_var_u32()? as usize;
        let contents_offset = reader.original_position();
        let contents = reader.read_bytes(len)?;
        if !reader.eof() {
            return Err(Error::new(
                ErrorKind::TrailingBytes,
                reader.original_position(),
            ));
        }
        Ok(ConditionalSectionReader {
            predicate,
            contents,
            contents_offset,
        })
    }

    /// The predicate gating this section's contents.
    pub fn predicate(&self) -> &Predicate<'a> {
        &self.predicate
    }

    /// The wrapped contents: one full section record, opaque until the
    /// predicate is known to be satisfied.
    pub fn contents(&self) -> &'a [u8] {
        self.contents
    }

    /// The offset of the wrapped contents relative to the start of the input.
    pub fn contents_offset(&self) -> usize {
        self.contents_offset
    }
}
