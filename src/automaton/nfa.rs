use std::collections::BTreeMap;

use crate::{
    automaton::{check_state, check_symbol, DfaRead, NfaRead, NfaWrite, State, Symbol},
    error::FaError,
    math,
};

/// A non-deterministic automaton over integer symbols.
///
/// While open for writing, transitions are collected per state in an ordered map. Calling
/// [`NfaWrite::prepare`] packs them into flat arrays: `offsets[q]..offsets[q + 1]` is the range of
/// `iws` holding the symbols of state `q`, and for the `k`-th entry of `iws` the destinations are
/// `dests[dest_offsets[k]..dest_offsets[k + 1]]`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Nfa {
    max_state: Option<State>,
    max_iw: Symbol,
    initials: Vec<State>,
    finals: Vec<State>,
    pending: Vec<BTreeMap<Symbol, Vec<State>>>,
    offsets: Vec<usize>,
    iws: Vec<Symbol>,
    dest_offsets: Vec<usize>,
    dests: Vec<State>,
    prepared: bool,
}

impl Nfa {
    /// Creates an empty automaton that is open for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `to` to the destinations of `from` on `iw`, in contrast to
    /// [`NfaWrite::set_transition`] which replaces them.
    pub fn add_transition(&mut self, from: State, iw: Symbol, to: State) -> Result<(), FaError> {
        self.check_writable()?;
        check_state(from, self.max_state)?;
        check_state(to, self.max_state)?;
        check_symbol(iw, self.max_iw)?;
        self.pending[from as usize].entry(iw).or_default().push(to);
        Ok(())
    }

    /// Builds a prepared non-deterministic view of the given deterministic automaton.
    pub fn from_dfa<D: DfaRead + ?Sized>(dfa: &D) -> Result<Self, FaError> {
        if !dfa.is_prepared() {
            return Err(FaError::NotPrepared);
        }
        let mut nfa = Nfa::new();
        nfa.set_max_iw(dfa.max_iw())?;
        if let Some(max_state) = dfa.max_state() {
            nfa.set_max_state(max_state)?;
            if let Some(initial) = dfa.initial() {
                nfa.set_initials(&[initial])?;
            }
            nfa.set_finals(dfa.finals())?;
            for q in 0..=max_state {
                for &iw in dfa.iws(q) {
                    if let Some(p) = dfa.dest(q, iw) {
                        nfa.set_transition(q, iw, &[p])?;
                    }
                }
            }
        }
        nfa.prepare()?;
        Ok(nfa)
    }

    /// The number of transitions, counting each destination separately.
    pub fn transition_count(&self) -> usize {
        self.dests.len()
    }

    /// Returns `true` if some state has a transition on `iw`.
    pub fn uses_symbol(&self, iw: Symbol) -> bool {
        self.iws.contains(&iw)
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

impl NfaRead for Nfa {
    fn is_prepared(&self) -> bool {
        self.prepared
    }

    fn max_state(&self) -> Option<State> {
        self.max_state
    }

    fn max_iw(&self) -> Symbol {
        self.max_iw
    }

    fn initials(&self) -> &[State] {
        &self.initials
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

    fn dest(&self, state: State, iw: Symbol) -> &[State] {
        let Some(range) = self.arc_range(state) else {
            return &[];
        };
        match self.iws[range.clone()].binary_search(&iw) {
            Ok(pos) => {
                let k = range.start + pos;
                &self.dests[self.dest_offsets[k]..self.dest_offsets[k + 1]]
            }
            Err(_) => &[],
        }
    }
}

impl NfaWrite for Nfa {
    fn create(&mut self) {
        *self = Nfa::default();
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

    fn set_initials(&mut self, states: &[State]) -> Result<(), FaError> {
        self.check_writable()?;
        for &q in states {
            check_state(q, self.max_state)?;
        }
        self.initials = states.to_vec();
        math::sort_dedup(&mut self.initials);
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

    fn set_transition(&mut self, from: State, iw: Symbol, to: &[State]) -> Result<(), FaError> {
        self.check_writable()?;
        check_state(from, self.max_state)?;
        check_symbol(iw, self.max_iw)?;
        for &p in to {
            check_state(p, self.max_state)?;
        }
        let arcs = &mut self.pending[from as usize];
        if to.is_empty() {
            arcs.remove(&iw);
        } else {
            arcs.insert(iw, to.to_vec());
        }
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), FaError> {
        self.check_writable()?;
        // set_max_state may have shrunk the automaton after states were referenced
        for &q in self.initials.iter().chain(&self.finals) {
            check_state(q, self.max_state)?;
        }
        for &to in self.pending.iter().flat_map(BTreeMap::values).flatten() {
            check_state(to, self.max_state)?;
        }
        let pending = std::mem::take(&mut self.pending);

        self.offsets = Vec::with_capacity(pending.len() + 1);
        self.offsets.push(0);
        self.dest_offsets = vec![0];
        for arcs in pending {
            for (iw, mut to) in arcs {
                math::sort_dedup(&mut to);
                if to.is_empty() {
                    continue;
                }
                self.iws.push(iw);
                self.dests.extend(to);
                self.dest_offsets.push(self.dests.len());
            }
            self.offsets.push(self.iws.len());
        }
        self.prepared = true;
        Ok(())
    }
}

impl std::fmt::Debug for Nfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prepared {
            crate::text::WriteText::write_text(self, f)
        } else {
            write!(f, "Nfa (unprepared, max state {:?})", self.max_state)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn write_then_read() {
        let mut nfa = Nfa::new();
        nfa.set_max_state(2).unwrap();
        nfa.set_max_iw(5).unwrap();
        nfa.set_initials(&[0, 0]).unwrap();
        nfa.set_finals(&[2, 1]).unwrap();
        nfa.set_transition(0, 3, &[2, 1, 2]).unwrap();
        nfa.add_transition(0, 1, 1).unwrap();
        nfa.add_transition(0, 1, 0).unwrap();
        nfa.set_transition(1, 4, &[2]).unwrap();
        nfa.set_transition(1, 4, &[]).unwrap();
        nfa.prepare().unwrap();

        assert_eq!(nfa.initials(), &[0]);
        assert_eq!(nfa.finals(), &[1, 2]);
        assert_eq!(nfa.iws(0), &[1, 3]);
        assert_eq!(nfa.dest(0, 3), &[1, 2]);
        assert_eq!(nfa.dest(0, 1), &[0, 1]);
        assert!(nfa.iws(1).is_empty());
        assert!(nfa.dest(0, 2).is_empty());
        assert!(nfa.iws(17).is_empty());
        assert_eq!(nfa.transition_count(), 4);
        assert!(nfa.is_final(2));
        assert!(!nfa.is_final(0));
    }

    #[test]
    fn contract_violations_are_errors() {
        let mut nfa = Nfa::new();
        nfa.set_max_state(1).unwrap();
        nfa.set_max_iw(2).unwrap();
        assert_eq!(
            nfa.set_transition(0, 1, &[2]),
            Err(FaError::InvalidState {
                state: 2,
                max_state: Some(1)
            })
        );
        assert_eq!(
            nfa.add_transition(0, 3, 1),
            Err(FaError::InvalidSymbol {
                symbol: 3,
                max_iw: 2
            })
        );
        nfa.prepare().unwrap();
        assert_eq!(nfa.set_finals(&[0]), Err(FaError::AlreadyPrepared));
        assert_eq!(nfa.prepare(), Err(FaError::AlreadyPrepared));

        nfa.create();
        assert!(!nfa.is_prepared());
        assert_eq!(nfa.max_state(), None);
    }

    #[test]
    fn shrinking_below_used_states_fails_on_prepare() {
        let mut nfa = Nfa::new();
        nfa.set_max_state(5).unwrap();
        nfa.set_initials(&[0, 5]).unwrap();
        nfa.set_max_state(2).unwrap();
        assert_eq!(
            nfa.prepare(),
            Err(FaError::InvalidState {
                state: 5,
                max_state: Some(2)
            })
        );

        let mut nfa = Nfa::new();
        nfa.set_max_state(5).unwrap();
        nfa.set_initials(&[0]).unwrap();
        nfa.set_transition(0, 0, &[1, 4]).unwrap();
        nfa.set_max_state(3).unwrap();
        assert!(matches!(
            nfa.prepare(),
            Err(FaError::InvalidState { state: 4, .. })
        ));
    }

    #[test]
    fn view_dfa_as_nfa() {
        let dfa = DfaBuilder::default()
            .with_initial(0)
            .with_finals([1])
            .with_edges([(0, 1, 1), (1, 2, 0)])
            .into_dfa()
            .unwrap();
        let nfa = Nfa::from_dfa(&dfa).unwrap();
        assert_eq!(nfa.initials(), &[0]);
        assert_eq!(nfa.finals(), &[1]);
        assert_eq!(nfa.dest(0, 1), &[1]);
        assert_eq!(nfa.dest(1, 2), &[0]);
    }
}
