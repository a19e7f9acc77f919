//! Ordered, named extraction strategies.
//!
//! Each strategy returns an optional value; the first one that yields
//! something wins. Chains are listed from most to least precise so the
//! winning strategy name says how much to trust the value.

use tracing::debug;

/// One named extraction rule over an input `I`.
pub struct Strategy<I: ?Sized, T> {
    pub name: &'static str,
    pub run: fn(&I) -> Option<T>,
}

impl<I: ?Sized, T> Strategy<I, T> {
    pub const fn new(name: &'static str, run: fn(&I) -> Option<T>) -> Self {
        Self { name, run }
    }
}

/// Run `chain` in order and return the first success with its strategy name.
pub fn first_success<I: ?Sized, T>(input: &I, chain: &[Strategy<I, T>]) -> Option<(&'static str, T)> {
    for strategy in chain {
        if let Some(value) = (strategy.run)(input) {
            debug!(strategy = strategy.name, "extraction strategy matched");
            return Some((strategy.name, value));
        }
    }
    None
}
