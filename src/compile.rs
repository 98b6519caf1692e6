use crate::{ErrorKind, FeatureConjunction, Predicate, Result};
use log::warn;

/// The output of [`compile`]: one predicate per input alternative, in
/// priority order.
#[derive(Clone, Debug)]
pub struct Compiled<'a, T> {
    /// The `(predicate, payload)` pairs, in the input's priority order.
    ///
    /// The predicates are mutually exclusive: for any host feature set at
    /// most one of them matches, and it is the one whose input conjunction
    /// was the first satisfied by that host. An alternative shadowed by an
    /// earlier catch-all gets the never-true empty predicate.
    pub cases: Vec<(Predicate<'a>, T)>,
    /// Whether the produced predicates are jointly exhaustive, i.e. some
    /// input conjunction was the empty last-resort case.
    ///
    /// When `false` a host feature set satisfying no input conjunction will
    /// match none of the predicates. That can be intentional, so it is
    /// surfaced as an advisory flag rather than an error.
    pub exhaustive: bool,
}

/// Collapses a priority-ordered list of feature-set alternatives into
/// mutually exclusive DNF predicates.
///
/// `alternatives` lists, highest priority first, declarations of the form
/// "this payload applies when the host satisfies this conjunction". The
/// produced predicate for entry `i` is
/// `conj_i AND NOT(conj_1) AND … AND NOT(conj_{i-1})`, expanded to
/// disjunctive normal form by distribution. Conjunctions containing a literal
/// and its negation are dropped, and duplicate literals and duplicate
/// conjunctions are removed. These local simplifications are all the compiler
/// does; the result is correct but not guaranteed minimal, which keeps
/// compilation polynomial instead of invoking general boolean minimization.
///
/// Fails with [`ErrorKind::EmptyPriorityList`] when given zero alternatives.
pub fn compile<'a, T>(alternatives: Vec<(FeatureConjunction<'a>, T)>) -> Result<Compiled<'a, T>> {
    if alternatives.is_empty() {
        return Err(ErrorKind::EmptyPriorityList.into());
    }
    let exhaustive = alternatives.iter().any(|(conj, _)| conj.is_empty());
    let mut cases = Vec::with_capacity(alternatives.len());
    let mut prefix: Vec<FeatureConjunction<'a>> = Vec::new();
    for (conj, payload) in alternatives {
        let predicate = exclude_prefix(&conj, &prefix);
        prefix.push(conj);
        cases.push((predicate, payload));
    }
    if !exhaustive {
        warn!("compiled predicate list is not exhaustive: no alternative carries the empty feature set");
    }
    Ok(Compiled { cases, exhaustive })
}

/// Builds the DNF of `conj AND NOT(prev_1) AND … AND NOT(prev_n)`.
fn exclude_prefix<'a>(
    conj: &FeatureConjunction<'a>,
    prefix: &[FeatureConjunction<'a>],
) -> Predicate<'a> {
    let mut conjunctions = match conj.clone().normalize() {
        Some(c) => vec![c],
        // The entry's own conjunction is contradictory; nothing selects it.
        None => Vec::new(),
    };
    for prev in prefix {
        // NOT(prev) is the disjunction of its negated literals; distribute it
        // over the running DNF. An empty `prev` negates to false and empties
        // the result: everything after a catch-all is unreachable.
        let mut next: Vec<FeatureConjunction<'a>> = Vec::new();
        for current in &conjunctions {
            for literal in prev.features() {
                let mut expanded = current.clone();
                expanded.push(literal.negate());
                if let Some(expanded) = expanded.normalize() {
                    if !next.contains(&expanded) {
                        next.push(expanded);
                    }
                }
            }
        }
        conjunctions = next;
    }
    Predicate::new(conjunctions)
}
