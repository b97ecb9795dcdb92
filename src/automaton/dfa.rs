use std::collections::BTreeMap;

use crate::{
    automaton::{check_state, check_symbol, DfaRead, DfaWrite, State, Symbol},
    error::FaError,
    math,
};

/// A deterministic automaton over integer symbols. Missing transitions lead to the implicit
/// dead state and are not stored.
///
/// The layout mirrors [`crate::automaton::Nfa`]: after preparing, `offsets[q]..offsets[q + 1]`
/// indexes both `iws` and the parallel `dests`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Dfa {
    max_state: Option<State>,
    max_iw: Symbol,
    initial: Option<State>,
    finals: Vec<State>,
    pending: Vec<BTreeMap<Symbol, State>>,
    offsets: Vec<usize>,
    iws: Vec<Symbol>,
    dests: Vec<State>,
    prepared: bool,
}

impl Dfa {
    /// Creates an empty automaton that is open for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored transitions.
    pub fn transition_count(&self) -> usize {
        self.dests.len()
    }

    /// Iterates over all stored transitions as `(from, symbol, to)` triples, ordered by source
    /// state and symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (State, Symbol, State)> + '_ {
        (0..self.offsets.len().saturating_sub(1)).flat_map(move |q| {
            (self.offsets[q]..self.offsets[q + 1]).map(move |k| (q as State, self.iws[k], self.dests[k]))
        })
    }

    fn check_writable(&self) -> Result<(), FaError> {
        if self.prepared {
            Err(FaError::AlreadyPrepared)
        } else {
            Ok(())
        }
    }

    fn arc_range(&self, state: State) -> Option<std::ops::Range<usize>> {
        debug_assert!(self.prepared, "automaton is read before prepare");
        let q = state as usize;
        if !self.prepared || q + 1 >= self.offsets.len() {
            return None;
        }
        Some(self.offsets[q]..self.offsets[q + 1])
    }
}

impl DfaRead for Dfa {
    fn is_prepared(&self) -> bool {
        self.prepared
    }

    fn max_state(&self) -> Option<State> {
        self.max_state
    }

    fn max_iw(&self) -> Symbol {
        self.max_iw
    }

    fn initial(&self) -> Option<State> {
        self.initial
    }

    fn finals(&self) -> &[State] {
        &self.finals
    }

    fn iws(&self, state: State) -> &[Symbol] {
        match self.arc_range(state) {
            Some(range) => &self.iws[range],
            None => &[],
        }
    }

    fn dest(&self, state: State, iw: Symbol) -> Option<State> {
        let range = self.arc_range(state)?;
        self.iws[range.clone()]
            .binary_search(&iw)
            .ok()
            .map(|pos| self.dests[range.start + pos])
    }
}

impl DfaWrite for Dfa {
    fn create(&mut self) {
        *self = Dfa::default();
    }

    fn set_max_state(&mut self, max_state: State) -> Result<(), FaError> {
        self.check_writable()?;
        self.max_state = Some(max_state);
        self.pending.resize_with(max_state as usize + 1, BTreeMap::new);
        Ok(())
    }

    fn set_max_iw(&mut self, max_iw: Symbol) -> Result<(), FaError> {
        self.check_writable()?;
        self.max_iw = max_iw;
        Ok(())
    }

    fn set_initial(&mut self, state: State) -> Result<(), FaError> {
        self.check_writable()?;
        check_state(state, self.max_state)?;
        self.initial = Some(state);
        Ok(())
    }

    fn set_finals(&mut self, states: &[State]) -> Result<(), FaError> {
        self.check_writable()?;
        for &q in states {
            check_state(q, self.max_state)?;
        }
        self.finals = states.to_vec();
        math::sort_dedup(&mut self.finals);
        Ok(())
    }

    fn set_transition(&mut self, from: State, iw: Symbol, to: State) -> Result<(), FaError> {
        self.check_writable()?;
        check_state(from, self.max_state)?;
        check_state(to, self.max_state)?;
        check_symbol(iw, self.max_iw)?;
        self.pending[from as usize].insert(iw, to);
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), FaError> {
        self.check_writable()?;
        if self.max_state.is_some() && self.initial.is_none() {
            return Err(FaError::PreconditionViolation(
                "deterministic automaton without initial state",
            ));
        }
        // set_max_state may have shrunk the automaton after states were referenced
        for &q in self.initial.iter().chain(&self.finals) {
            check_state(q, self.max_state)?;
        }
        for &to in self.pending.iter().flat_map(BTreeMap::values) {
            check_state(to, self.max_state)?;
        }
        let pending = std::mem::take(&mut self.pending);

        self.offsets = Vec::with_capacity(pending.len() + 1);
        self.offsets.push(0);
        for arcs in pending {
            for (iw, to) in arcs {
                self.iws.push(iw);
                self.dests.push(to);
            }
            self.offsets.push(self.iws.len());
        }
        self.prepared = true;
        Ok(())
    }
}

impl std::fmt::Debug for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prepared {
            crate::text::WriteText::write_text(self, f)
        } else {
            write!(f, "Dfa (unprepared, max state {:?})", self.max_state)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn write_then_read() {
        let mut dfa = Dfa::new();
        dfa.set_max_state(2).unwrap();
        dfa.set_max_iw(3).unwrap();
        dfa.set_initial(0).unwrap();
        dfa.set_finals(&[2]).unwrap();
        dfa.set_transition(0, 2, 1).unwrap();
        dfa.set_transition(0, 1, 2).unwrap();
        dfa.set_transition(0, 1, 0).unwrap();
        dfa.set_transition(1, 3, 2).unwrap();
        dfa.prepare().unwrap();

        assert_eq!(dfa.initial(), Some(0));
        assert_eq!(dfa.iws(0), &[1, 2]);
        assert_eq!(dfa.dest(0, 1), Some(0));
        assert_eq!(dfa.dest(0, 2), Some(1));
        assert_eq!(dfa.dest(0, 3), None);
        assert_eq!(dfa.dest(9, 3), None);
        assert_eq!(
            dfa.transitions().collect::<Vec<_>>(),
            vec![(0, 1, 0), (0, 2, 1), (1, 3, 2)]
        );
    }

    #[test]
    fn prepare_requires_initial() {
        let mut dfa = Dfa::new();
        dfa.set_max_state(0).unwrap();
        assert!(matches!(
            dfa.prepare(),
            Err(FaError::PreconditionViolation(_))
        ));

        let mut empty = Dfa::new();
        empty.prepare().unwrap();
        assert_eq!(empty.size(), 0);
    }

    #[test]
    fn shrinking_below_used_states_fails_on_prepare() {
        let mut dfa = Dfa::new();
        dfa.set_max_state(5).unwrap();
        dfa.set_initial(5).unwrap();
        dfa.set_max_state(2).unwrap();
        assert_eq!(
            dfa.prepare(),
            Err(FaError::InvalidState {
                state: 5,
                max_state: Some(2)
            })
        );

        let mut dfa = Dfa::new();
        dfa.set_max_state(5).unwrap();
        dfa.set_initial(0).unwrap();
        dfa.set_finals(&[4]).unwrap();
        dfa.set_max_state(3).unwrap();
        assert!(matches!(
            dfa.prepare(),
            Err(FaError::InvalidState { state: 4, .. })
        ));

        let mut dfa = Dfa::new();
        dfa.set_max_state(5).unwrap();
        dfa.set_initial(0).unwrap();
        dfa.set_transition(0, 0, 5).unwrap();
        dfa.set_max_state(1).unwrap();
        assert!(matches!(
            dfa.prepare(),
            Err(FaError::InvalidState { state: 5, .. })
        ));

        // growing again makes the references valid
        let mut dfa = Dfa::new();
        dfa.set_max_state(5).unwrap();
        dfa.set_initial(5).unwrap();
        dfa.set_max_state(2).unwrap();
        dfa.set_max_state(5).unwrap();
        dfa.prepare().unwrap();
        let mut min = Dfa::new();
        Minimizer::new(MinimizeOptions::default())
            .minimize(&dfa, &mut min)
            .unwrap();
        assert_eq!(min.size(), 1);
    }
}
