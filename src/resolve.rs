use crate::{
    BinaryReader, ConditionalSectionReader, Error, ErrorKind, HostFeatures, RawSection, Result,
    SectionIter, SectionKind,
};
use log::debug;

/// A custom section: a name and opaque contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustomSection<'a> {
    /// The name of the custom section.
    pub name: &'a str,
    /// The contents of the custom section.
    pub data: &'a [u8],
}

/// The decoded payload of a resolved section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionPayload<'a> {
    /// An item vector: the declared item count and the raw item bytes.
    ///
    /// Item grammars are not interpreted by this crate; merging repeated
    /// sections needs only the count and the bytes, and anything finer is the
    /// downstream validator's concern.
    Vector {
        /// The number of items in this occurrence.
        count: u32,
        /// The encoded items, uninterpreted.
        items: &'a [u8],
    },
    /// A start section: a single function index.
    Start {
        /// The index of the function to run at instantiation.
        func_index: u32,
    },
    /// A data count section: the number of data segments this occurrence
    /// declares.
    DataCount {
        /// The declared count.
        count: u32,
    },
    /// A custom section, passed through unchanged.
    Custom(CustomSection<'a>),
}

/// A section after conditional gating has been applied.
///
/// Conditional wrappers never appear here, only what they resolved to.
#[derive(Clone, Debug)]
pub struct ResolvedSection<'a> {
    /// The kind of this section. Never [`SectionKind::Conditional`].
    pub kind: SectionKind,
    /// The decoded payload.
    pub payload: SectionPayload<'a>,
    pub(crate) offset: usize,
}

impl ResolvedSection<'_> {
    /// The offset of this section's payload relative to the start of the
    /// input.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Turns a raw section stream into a resolved section stream.
///
/// For each raw section the resolver either decodes its payload, passes a
/// custom section through unchanged, or, for a conditional section, evaluates
/// the predicate against the host's features: unsatisfied contents are
/// discarded without being inspected at all, satisfied contents are decoded
/// as exactly one non-conditional section record.
///
/// The resolver also enforces the ordering invariant on the stream it emits:
/// once a section kind has been passed in the fixed kind ordering it may not
/// reopen. The check runs on the resolved stream, not the raw wire stream,
/// since skipped conditional contents never reach it.
#[derive(Debug)]
pub struct Resolver<'a, 'f> {
    sections: SectionIter<'a>,
    features: &'f HostFeatures,
    last_order: Option<u8>,
    done: bool,
}

impl<'a, 'f> Resolver<'a, 'f> {
    /// Creates a resolver over `sections`, gating conditional sections
    /// against `features`.
    pub fn new(sections: SectionIter<'a>, features: &'f HostFeatures) -> Resolver<'a, 'f> {
        Resolver {
            sections,
            features,
            last_order: None,
            done: false,
        }
    }

    fn resolve(&mut self, raw: RawSection<'a>) -> Result<Option<ResolvedSection<'a>>> {
        let resolved = match raw.kind {
            SectionKind::Conditional => match self.unwrap_conditional(&raw)? {
                Some(inner) => decode_payload(inner)?,
                None => return Ok(None),
            },
            _ => decode_payload(raw)?,
        };
        self.check_order(&resolved)?;
        Ok(Some(resolved))
    }

    /// Splits a conditional payload and applies the skip-or-descend rule,
    /// returning the inner record when the predicate is satisfied.
    fn unwrap_conditional(&self, raw: &RawSection<'a>) -> Result<Option<RawSection<'a>>> {
        let cond = ConditionalSectionReader::new(raw.bytes, raw.offset)?;
        if !cond.predicate().matches(self.features) {
            debug!(
                "skipping conditional section at offset {:#x}: {} unsatisfied",
                raw.offset,
                cond.predicate(),
            );
            return Ok(None);
        }
        debug!(
            "descending into conditional section at offset {:#x}: {} satisfied",
            raw.offset,
            cond.predicate(),
        );
        let mut inner = SectionIter::new(BinaryReader::new(
            cond.contents(),
            cond.contents_offset(),
        ));
        if inner.is_at_end() {
            return Err(Error::eof(cond.contents_offset()));
        }
        let record = inner.read_section()?;
        if record.kind == SectionKind::Conditional {
            return Err(Error::new(ErrorKind::NestedConditional, record.offset));
        }
        if !inner.is_at_end() {
            return Err(Error::new(ErrorKind::TrailingBytes, inner.position()));
        }
        Ok(Some(record))
    }

    fn check_order(&mut self, section: &ResolvedSection<'a>) -> Result<()> {
        let order = match section.kind.order() {
            Some(order) => order,
            // Custom sections never participate in the ordering.
            None => return Ok(()),
        };
        if let Some(last) = self.last_order {
            if order < last {
                return Err(Error::new(
                    ErrorKind::SectionOrder(section.kind),
                    section.offset,
                ));
            }
        }
        self.last_order = Some(order);
        Ok(())
    }
}

impl<'a> Iterator for Resolver<'a, '_> {
    type Item = Result<ResolvedSection<'a>>;

    fn next(&mut self) -> Option<Result<ResolvedSection<'a>>> {
        if self.done {
            return None;
        }
        loop {
            let raw = match self.sections.next()? {
                Ok(raw) => raw,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            match self.resolve(raw) {
                Ok(Some(section)) => return Some(Ok(section)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Decodes a non-conditional raw section's payload.
fn decode_payload(raw: RawSection<'_>) -> Result<ResolvedSection<'_>> {
    debug_assert!(raw.kind != SectionKind::Conditional);
    let mut reader = BinaryReader::new(raw.bytes, raw.offset);
    let payload = match raw.kind {
        SectionKind::Custom => {
            let name = reader.read_string()?;
            SectionPayload::Custom(CustomSection {
                name,
                data: reader.remaining_buffer(),
            })
        }
        SectionKind::Start => {
            let func_index = reader.read_var_u32()?;
            expect_end(&reader)?;
            SectionPayload::Start { func_index }
        }
        SectionKind::DataCount => {
            let count = reader.read_var_u32()?;
            expect_end(&reader)?;
            SectionPayload::DataCount { count }
        }
        _ => {
            let count = reader.read_var_u32()?;
            SectionPayload::Vector {
                count,
                items: reader.remaining_buffer(),
            }
        }
    };
    Ok(ResolvedSection {
        kind: raw.kind,
        payload,
        offset: raw.offset,
    })
}

fn expect_end(reader: &BinaryReader<'_>) -> Result<()> {
    if reader.eof() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::TrailingBytes,
            reader.original_position(),
        ))
    }
}
