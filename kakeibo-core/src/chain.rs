//! Ordered fallback chains: try cheap producers first, remember who won.
//!
//! The extraction components all share the same control flow — a ladder of
//! candidate producers where the first non-empty result wins. This utility
//! replaces the per-component early-return ladders and keeps the winning
//! tier's name around for logging and tests.

/// A value plus the name of the step that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: &'static str,
}

/// Ordered list of named candidate producers.
pub struct FallbackChain<'a, T> {
    steps: Vec<(&'static str, Box<dyn FnMut() -> Option<T> + 'a>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn step(mut self, name: &'static str, produce: impl FnMut() -> Option<T> + 'a) -> Self {
        self.steps.push((name, Box::new(produce)));
        self
    }

    /// Run the steps in order; the first producer returning `Some` wins and
    /// later steps are never invoked.
    pub fn resolve(self) -> Option<Resolved<T>> {
        for (name, mut produce) in self.steps {
            if let Some(value) = produce() {
                return Some(Resolved { value, source: name });
            }
        }
        None
    }
}

impl<T> Default for FallbackChain<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}
