use crate::error::FaError;

mod nfa;
pub use nfa::Nfa;

mod dfa;
pub use dfa::Dfa;

mod builder;
pub use builder::{DfaBuilder, NfaBuilder};

/// Contains the sweep that drops states which are unreachable from the initial states.
pub mod reachability;

mod run;
pub use run::RunOptions;

/// Identifies a state, states of an automaton are numbered densely from `0` to its maximal state.
pub type State = u32;

/// Identifies an input symbol, also called input weight. Epsilon and the wildcard ("any other")
/// symbol are ordinary values that are designated per run through the options of an algorithm.
pub type Symbol = u32;

/// Read access to a non-deterministic automaton. A state may have several destinations for the
/// same symbol and the automaton may have several initial states.
///
/// All read methods may only be called after [`NfaWrite::prepare`] (or an equivalent
/// finalization of the implementor) has been called, which is signalled by [`NfaRead::is_prepared`].
pub trait NfaRead {
    /// Returns `true` once the automaton has been finalized and may be read.
    fn is_prepared(&self) -> bool;

    /// The maximal state, `None` if the automaton has no states at all.
    fn max_state(&self) -> Option<State>;

    /// The maximal input weight that may be used on a transition.
    fn max_iw(&self) -> Symbol;

    /// The initial states, sorted ascending and free of duplicates.
    fn initials(&self) -> &[State];

    /// The final states, sorted ascending and free of duplicates.
    fn finals(&self) -> &[State];

    /// The symbols on which `state` has outgoing transitions, sorted ascending and unique.
    /// Returns an empty slice for states that do not exist.
    fn iws(&self, state: State) -> &[Symbol];

    /// The destinations of `state` on `iw`, sorted ascending and unique. An empty slice means
    /// there is no transition.
    fn dest(&self, state: State, iw: Symbol) -> &[State];

    /// Returns `true` if `state` is final.
    fn is_final(&self, state: State) -> bool {
        self.finals().binary_search(&state).is_ok()
    }

    /// The number of states, i.e. `max_state + 1`.
    fn size(&self) -> usize {
        self.max_state().map_or(0, |m| m as usize + 1)
    }
}

/// Read access to a deterministic automaton, every `(state, symbol)` pair has at most one
/// destination. A missing destination stands for the implicit dead state.
pub trait DfaRead {
    /// Returns `true` once the automaton has been finalized and may be read.
    fn is_prepared(&self) -> bool;

    /// The maximal state, `None` if the automaton has no states at all.
    fn max_state(&self) -> Option<State>;

    /// The maximal input weight that may be used on a transition.
    fn max_iw(&self) -> Symbol;

    /// The initial state, always present if the automaton has at least one state.
    fn initial(&self) -> Option<State>;

    /// The final states, sorted ascending and free of duplicates.
    fn finals(&self) -> &[State];

    /// The symbols on which `state` has an outgoing transition, sorted ascending and unique.
    fn iws(&self, state: State) -> &[Symbol];

    /// The destination of `state` on `iw`, `None` if there is no such transition.
    fn dest(&self, state: State, iw: Symbol) -> Option<State>;

    /// Returns `true` if `state` is final.
    fn is_final(&self, state: State) -> bool {
        self.finals().binary_search(&state).is_ok()
    }

    /// The number of states, i.e. `max_state + 1`.
    fn size(&self) -> usize {
        self.max_state().map_or(0, |m| m as usize + 1)
    }
}

/// Write access to a non-deterministic automaton. After [`NfaWrite::prepare`] has been called,
/// every write method fails with [`FaError::AlreadyPrepared`] until [`NfaWrite::create`] resets
/// the object.
pub trait NfaWrite {
    /// Resets `self` to an empty automaton that is open for writing.
    fn create(&mut self);

    /// Sets the maximal state, states `0..=max_state` exist afterwards.
    fn set_max_state(&mut self, max_state: State) -> Result<(), FaError>;

    /// Sets the maximal input weight.
    fn set_max_iw(&mut self, max_iw: Symbol) -> Result<(), FaError>;

    /// Replaces the set of initial states.
    fn set_initials(&mut self, states: &[State]) -> Result<(), FaError>;

    /// Replaces the set of final states.
    fn set_finals(&mut self, states: &[State]) -> Result<(), FaError>;

    /// Replaces the destinations of `from` on `iw`. An empty `to` removes the transition.
    fn set_transition(&mut self, from: State, iw: Symbol, to: &[State]) -> Result<(), FaError>;

    /// Finalizes the internal indices, the automaton is read-only afterwards.
    fn prepare(&mut self) -> Result<(), FaError>;
}

/// Write access to a deterministic automaton, see [`NfaWrite`] for the life cycle.
pub trait DfaWrite {
    /// Resets `self` to an empty automaton that is open for writing.
    fn create(&mut self);

    /// Sets the maximal state, states `0..=max_state` exist afterwards.
    fn set_max_state(&mut self, max_state: State) -> Result<(), FaError>;

    /// Sets the maximal input weight.
    fn set_max_iw(&mut self, max_iw: Symbol) -> Result<(), FaError>;

    /// Sets the initial state.
    fn set_initial(&mut self, state: State) -> Result<(), FaError>;

    /// Replaces the set of final states.
    fn set_finals(&mut self, states: &[State]) -> Result<(), FaError>;

    /// Sets the destination of `from` on `iw`, replacing a previous one.
    fn set_transition(&mut self, from: State, iw: Symbol, to: State) -> Result<(), FaError>;

    /// Finalizes the internal indices, the automaton is read-only afterwards.
    fn prepare(&mut self) -> Result<(), FaError>;
}

/// Fails with [`FaError::InvalidState`] if `state` exceeds `max_state`.
pub(crate) fn check_state(state: State, max_state: Option<State>) -> Result<(), FaError> {
    match max_state {
        Some(max) if state <= max => Ok(()),
        _ => Err(FaError::InvalidState { state, max_state }),
    }
}

/// Fails with [`FaError::InvalidSymbol`] if `symbol` exceeds `max_iw`.
pub(crate) fn check_symbol(symbol: Symbol, max_iw: Symbol) -> Result<(), FaError> {
    if symbol > max_iw {
        Err(FaError::InvalidSymbol { symbol, max_iw })
    } else {
        Ok(())
    }
}

/// Checks that an input automaton may be processed, i.e. it is prepared and not empty.
pub(crate) fn check_nfa_input<N: NfaRead + ?Sized>(nfa: &N) -> Result<State, FaError> {
    if !nfa.is_prepared() {
        return Err(FaError::NotPrepared);
    }
    nfa.max_state().ok_or(FaError::EmptyAutomaton)
}

/// Same as [`check_nfa_input`] for deterministic inputs.
pub(crate) fn check_dfa_input<D: DfaRead + ?Sized>(dfa: &D) -> Result<State, FaError> {
    if !dfa.is_prepared() {
        return Err(FaError::NotPrepared);
    }
    let max_state = dfa.max_state().ok_or(FaError::EmptyAutomaton)?;
    for &q in dfa.initial().iter().chain(dfa.finals()) {
        check_state(q, Some(max_state))?;
    }
    Ok(max_state)
}
