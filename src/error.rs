use thiserror::Error;

use crate::automaton::{State, Symbol};

/// Errors raised by the automaton model and the construction algorithms.
///
/// Precondition violations of callers are reported as values rather than aborting, resource
/// limits are reported as [`FaError::LimitExceeded`] so a caller can give up on a single rule
/// and continue with the rest of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaError {
    /// A configured size limit was exceeded.
    #[error("{what} of size {len} exceeds the configured maximum of {max}")]
    LimitExceeded {
        /// What grew too large.
        what: &'static str,
        /// The size that was requested.
        len: usize,
        /// The configured maximum.
        max: usize,
    },
    /// A state outside of `0..=max_state` was used.
    #[error("state {state} does not exist, maximal state is {max_state:?}")]
    InvalidState {
        /// The offending state.
        state: State,
        /// The maximal state of the automaton, `None` if it has no states.
        max_state: Option<State>,
    },
    /// A symbol larger than the maximal input weight was used.
    #[error("symbol {symbol} exceeds the maximal input weight {max_iw}")]
    InvalidSymbol {
        /// The offending symbol.
        symbol: Symbol,
        /// The maximal input weight of the automaton.
        max_iw: Symbol,
    },
    /// The automaton has no states at all.
    #[error("automaton has no states")]
    EmptyAutomaton,
    /// A write method was called after `prepare`.
    #[error("automaton is read-only after prepare")]
    AlreadyPrepared,
    /// An algorithm was handed an automaton on which `prepare` was not called.
    #[error("automaton must be prepared before it is read")]
    NotPrepared,
    /// The epsilon transitions contain a cycle.
    #[error("epsilon transitions form a cycle through state {state}")]
    EpsilonCycle {
        /// A state lying on the cycle.
        state: State,
    },
    /// Some other precondition of an operation does not hold.
    #[error("precondition violated: {0}")]
    PreconditionViolation(&'static str),
}
