use crate::{BinaryReader, Error, ErrorKind, FromReader, HostFeatures, Result};
use core::fmt;

const MAX_FEATURES: usize = 10_000;
const MAX_CONJUNCTIONS: usize = 10_000;

/// One literal of a boolean conjunction: a feature name, possibly negated.
///
/// A feature is satisfied by a [`HostFeatures`] set iff the name is a member
/// of the set and `negated` is `false`, or the name is not a member and
/// `negated` is `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Feature<'a> {
    /// Whether this literal is negated.
    pub negated: bool,
    /// The feature name. Opaque to this crate.
    pub name: &'a str,
}

impl<'a> Feature<'a> {
    /// Creates a non-negated literal for `name`.
    pub fn require(name: &'a str) -> Feature<'a> {
        Feature {
            negated: false,
            name,
        }
    }

    /// Creates a negated literal for `name`.
    pub fn forbid(name: &'a str) -> Feature<'a> {
        Feature {
            negated: true,
            name,
        }
    }

    /// Returns this literal with its polarity flipped.
    pub fn negate(self) -> Feature<'a> {
        Feature {
            negated: !self.negated,
            name: self.name,
        }
    }

    /// Returns whether this literal is satisfied by `features`.
    pub fn matches(&self, features: &HostFeatures) -> bool {
        features.contains(self.name) != self.negated
    }
}

impl<'a> FromReader<'a> for Feature<'a> {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let pos = reader.original_position();
        let negated = match reader.read_u8()? {
            0 => false,
            1 => true,
            flag => return Err(Error::new(ErrorKind::MalformedFeature(flag), pos)),
        };
        let name = reader.read_string()?;
        Ok(Feature { negated, name })
    }
}

impl fmt::Display for Feature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!{}", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

/// An AND of feature literals.
///
/// The literal order carries no meaning but is preserved for deterministic
/// round-tripping. The empty conjunction is vacuously true. A conjunction
/// containing a name both negated and non-negated is unsatisfiable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeatureConjunction<'a> {
    features: Vec<Feature<'a>>,
}

impl<'a> FeatureConjunction<'a> {
    /// Creates a conjunction of the given literals.
    pub fn new(features: Vec<Feature<'a>>) -> FeatureConjunction<'a> {
        FeatureConjunction { features }
    }

    /// Creates the empty, always-true conjunction.
    pub fn always() -> FeatureConjunction<'a> {
        FeatureConjunction::default()
    }

    /// The literals of this conjunction.
    pub fn features(&self) -> &[Feature<'a>] {
        &self.features
    }

    /// Returns whether this conjunction has no literals.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns whether every literal is satisfied by `features`.
    ///
    /// Vacuously true for the empty conjunction.
    pub fn matches(&self, features: &HostFeatures) -> bool {
        self.features.iter().all(|f| f.matches(features))
    }

    pub(crate) fn push(&mut self, feature: Feature<'a>) {
        self.features.push(feature);
    }

    /// Sorts and deduplicates literals, returning `None` if the conjunction
    /// contains a literal and its negation and is therefore unsatisfiable.
    pub(crate) fn normalize(mut self) -> Option<FeatureConjunction<'a>> {
        self.features.sort_unstable_by(|a, b| {
            a.name.cmp(b.name).then(a.negated.cmp(&b.negated))
        });
        self.features.dedup();
        let contradiction = self
            .features
            .windows(2)
            .any(|w| w[0].name == w[1].name && w[0].negated != w[1].negated);
        if contradiction {
            None
        } else {
            Some(self)
        }
    }
}

impl<'a> FromReader<'a> for FeatureConjunction<'a> {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let count = reader.read_size(MAX_FEATURES, "feature list")?;
        let mut features = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            features.push(reader.read()?);
        }
        Ok(FeatureConjunction { features })
    }
}

impl fmt::Display for FeatureConjunction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.features.is_empty() {
            return f.write_str("(true)");
        }
        f.write_str("(")?;
        for (i, feature) in self.features.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{feature}")?;
        }
        f.write_str(")")
    }
}

/// An OR of conjunctions: a boolean predicate over features in disjunctive
/// normal form.
///
/// The empty predicate is vacuously false; the always-true predicate is one
/// holding a single empty conjunction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Predicate<'a> {
    conjunctions: Vec<FeatureConjunction<'a>>,
}

impl<'a> Predicate<'a> {
    /// Creates a predicate from the given conjunctions.
    pub fn new(conjunctions: Vec<FeatureConjunction<'a>>) -> Predicate<'a> {
        Predicate { conjunctions }
    }

    /// Creates the always-true predicate: one empty conjunction.
    pub fn always() -> Predicate<'a> {
        Predicate {
            conjunctions: vec![FeatureConjunction::always()],
        }
    }

    /// Creates the never-true predicate: zero conjunctions.
    pub fn never() -> Predicate<'a> {
        Predicate::default()
    }

    /// The conjunctions of this predicate.
    pub fn conjunctions(&self) -> &[FeatureConjunction<'a>] {
        &self.conjunctions
    }

    /// Returns whether at least one conjunction is satisfied by `features`.
    ///
    /// Vacuously false for the empty predicate. Evaluation is pure: repeated
    /// calls with equal inputs yield equal results.
    pub fn matches(&self, features: &HostFeatures) -> bool {
        self.conjunctions.iter().any(|c| c.matches(features))
    }
}

impl<'a> FromReader<'a> for Predicate<'a> {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let count = reader.read_size(MAX_CONJUNCTIONS, "feature set list")?;
        let mut conjunctions = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            conjunctions.push(reader.read()?);
        }
        Ok(Predicate { conjunctions })
    }
}

impl fmt::Display for Predicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conjunctions.is_empty() {
            return f.write_str("(false)");
        }
        for (i, conjunction) in self.conjunctions.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{conjunction}")?;
        }
        Ok(())
    }
}
