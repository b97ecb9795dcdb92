use itertools::Itertools;

use crate::{automaton::*, error::FaError};

/// Helper for the construction of non-deterministic automata from a list of edges. The maximal
/// state and the maximal input weight are inferred from the edges unless given explicitly.
///
/// # Example
///
/// An automaton accepting all words over `1` that end in `1`:
/// ```
/// use fa_compile::prelude::*;
///
/// let nfa = NfaBuilder::default()
///     .with_initials([0])
///     .with_finals([1])
///     .with_edges([(0, 1, 0), (0, 1, 1)])
///     .into_nfa()
///     .unwrap();
/// assert_eq!(nfa.dest(0, 1), &[0, 1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NfaBuilder {
    initials: Vec<State>,
    finals: Vec<State>,
    edges: Vec<(State, Symbol, State)>,
    max_state: Option<State>,
    max_iw: Option<Symbol>,
}

impl NfaBuilder {
    /// Adds initial states.
    pub fn with_initials<I: IntoIterator<Item = State>>(mut self, states: I) -> Self {
        self.initials.extend(states);
        self
    }

    /// Adds final states.
    pub fn with_finals<I: IntoIterator<Item = State>>(mut self, states: I) -> Self {
        self.finals.extend(states);
        self
    }

    /// Adds edges given as `(from, symbol, to)`.
    pub fn with_edges<I: IntoIterator<Item = (State, Symbol, State)>>(mut self, edges: I) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Fixes the maximal state instead of inferring it.
    pub fn with_max_state(mut self, max_state: State) -> Self {
        self.max_state = Some(max_state);
        self
    }

    /// Fixes the maximal input weight instead of inferring it.
    pub fn with_max_iw(mut self, max_iw: Symbol) -> Self {
        self.max_iw = Some(max_iw);
        self
    }

    /// Builds and prepares the automaton.
    pub fn into_nfa(self) -> Result<Nfa, FaError> {
        let mut nfa = Nfa::new();
        nfa.set_max_iw(
            self.max_iw
                .unwrap_or_else(|| self.edges.iter().map(|e| e.1).max().unwrap_or(0)),
        )?;
        let max_state = self.max_state.or_else(|| {
            self.initials
                .iter()
                .chain(self.finals.iter())
                .copied()
                .chain(self.edges.iter().flat_map(|&(p, _, q)| [p, q]))
                .max()
        });
        if let Some(max_state) = max_state {
            nfa.set_max_state(max_state)?;
        }
        nfa.set_initials(&self.initials)?;
        nfa.set_finals(&self.finals)?;
        for (from, iw, to) in self.edges {
            nfa.add_transition(from, iw, to)?;
        }
        nfa.prepare()?;
        Ok(nfa)
    }
}

/// Helper for the construction of deterministic automata, see [`NfaBuilder`].
#[derive(Debug, Clone, Default)]
pub struct DfaBuilder {
    initial: Option<State>,
    finals: Vec<State>,
    edges: Vec<(State, Symbol, State)>,
    max_state: Option<State>,
    max_iw: Option<Symbol>,
}

impl DfaBuilder {
    /// Sets the initial state.
    pub fn with_initial(mut self, state: State) -> Self {
        self.initial = Some(state);
        self
    }

    /// Adds final states.
    pub fn with_finals<I: IntoIterator<Item = State>>(mut self, states: I) -> Self {
        self.finals.extend(states);
        self
    }

    /// Adds edges given as `(from, symbol, to)`.
    pub fn with_edges<I: IntoIterator<Item = (State, Symbol, State)>>(mut self, edges: I) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Fixes the maximal state instead of inferring it.
    pub fn with_max_state(mut self, max_state: State) -> Self {
        self.max_state = Some(max_state);
        self
    }

    /// Fixes the maximal input weight instead of inferring it.
    pub fn with_max_iw(mut self, max_iw: Symbol) -> Self {
        self.max_iw = Some(max_iw);
        self
    }

    /// Builds and prepares the automaton. Fails if two edges leave the same state on the same
    /// symbol towards different states.
    pub fn into_dfa(self) -> Result<Dfa, FaError> {
        let conflicting = self
            .edges
            .iter()
            .map(|&(p, a, q)| ((p, a), q))
            .into_group_map()
            .into_values()
            .any(|targets| targets.iter().any(|q| *q != targets[0]));
        if conflicting {
            return Err(FaError::PreconditionViolation(
                "two transitions leave the same state on the same symbol",
            ));
        }

        let mut dfa = Dfa::new();
        dfa.set_max_iw(
            self.max_iw
                .unwrap_or_else(|| self.edges.iter().map(|e| e.1).max().unwrap_or(0)),
        )?;
        let max_state = self.max_state.or_else(|| {
            self.initial
                .iter()
                .chain(self.finals.iter())
                .copied()
                .chain(self.edges.iter().flat_map(|&(p, _, q)| [p, q]))
                .max()
        });
        if let Some(max_state) = max_state {
            dfa.set_max_state(max_state)?;
            dfa.set_initial(self.initial.unwrap_or(0))?;
        }
        dfa.set_finals(&self.finals)?;
        for (from, iw, to) in self.edges {
            dfa.set_transition(from, iw, to)?;
        }
        dfa.prepare()?;
        Ok(dfa)
    }
}
