use indexmap::IndexSet;

/// The set of feature names a host declares support for.
///
/// Feature names are opaque identifier strings; this crate never interprets
/// them semantically. A `HostFeatures` is supplied by the caller for the
/// duration of one decode, analogous to a compile-time configuration option,
/// and is never negotiated after decoding starts.
///
/// Iteration order is insertion order, which keeps diagnostics and tests
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostFeatures {
    names: IndexSet<String>,
}

impl HostFeatures {
    /// Creates an empty feature set.
    pub fn new() -> HostFeatures {
        HostFeatures::default()
    }

    /// Adds `name` to this feature set, returning whether it was newly
    /// inserted.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Returns whether `name` is a member of this feature set.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns the number of features in this set.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether this set contains no features.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over the feature names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for HostFeatures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> HostFeatures {
        HostFeatures {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
