use tracing::{debug, trace};

use crate::{
    automaton::{check_nfa_input, Dfa, DfaWrite, Nfa, NfaRead, State, Symbol},
    error::FaError,
    math,
    state_set::StateSetRegistry,
};

/// Configures the [`Determinizer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeterminizeOptions {
    /// The wildcard symbol, a transition on it is taken for every symbol the state has no
    /// explicit transition on.
    pub any: Option<Symbol>,
    /// The maximal number of states of the input that one state of the output may stand for.
    pub max_set_len: Option<usize>,
    /// The maximal number of states of the output.
    pub max_states: Option<usize>,
    /// Keep the mapping from output states to the sets of input states after processing.
    pub keep_state_map: bool,
}

impl DeterminizeOptions {
    /// Designates the wildcard symbol.
    pub fn with_any(mut self, any: Symbol) -> Self {
        self.any = Some(any);
        self
    }

    /// Limits the number of input states a single output state may stand for.
    pub fn with_max_set_len(mut self, max_set_len: usize) -> Self {
        self.max_set_len = Some(max_set_len);
        self
    }

    /// Limits the number of output states.
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    /// Keeps the mapping from output states to sets of input states, see
    /// [`Determinizer::state_set`].
    pub fn with_state_map(mut self) -> Self {
        self.keep_state_map = true;
        self
    }
}

/// Converts a non-deterministic automaton into a deterministic one through the subset
/// construction.
///
/// Every reachable set of input states becomes one output state, the set of initial states
/// becomes state `0`. Sets are expanded depth first from an explicit stack. For a set with more
/// than one member, a member that has a wildcard transition but no explicit transition on some
/// symbol `a` of the set contributes its wildcard destinations to `a`. Explicit transitions that
/// lead to the same state as the wildcard transition are not written, as the wildcard covers
/// them.
#[derive(Debug, Clone, Default)]
pub struct Determinizer {
    options: DeterminizeOptions,
    registry: StateSetRegistry,
    /// Accumulated destinations, indexed by symbol.
    scratch: Vec<Vec<State>>,
    needs_sort: Vec<bool>,
    touched: Vec<Symbol>,
    old: Vec<State>,
}

impl Determinizer {
    /// Creates a determinizer with the given options.
    pub fn new(options: DeterminizeOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// The options this determinizer runs with.
    pub fn options(&self) -> &DeterminizeOptions {
        &self.options
    }

    /// The input states that output state `state` of the last run stands for. Only available if
    /// the state map is kept.
    pub fn state_set(&self, state: State) -> Option<&[State]> {
        if self.options.keep_state_map {
            self.registry.states(state)
        } else {
            None
        }
    }

    /// Releases the registry and all scratch storage.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.scratch = Vec::new();
        self.needs_sort = Vec::new();
        self.touched = Vec::new();
        self.old = Vec::new();
    }

    /// Writes a deterministic automaton accepting the same language as `nfa` into `dfa`, which is
    /// prepared afterwards.
    pub fn process<I, O>(&mut self, nfa: &I, dfa: &mut O) -> Result<(), FaError>
    where
        I: NfaRead + ?Sized,
        O: DfaWrite + ?Sized,
    {
        check_nfa_input(nfa)?;
        if nfa.initials().is_empty() {
            return Err(FaError::PreconditionViolation(
                "automaton to determinize has no initial state",
            ));
        }

        self.registry = match self.options.max_set_len {
            Some(max) => StateSetRegistry::with_max_len(max),
            None => StateSetRegistry::new(),
        };
        let max_iw = nfa.max_iw();
        let slots = max_iw as usize + 1;
        self.scratch.iter_mut().for_each(Vec::clear);
        self.scratch.resize_with(slots, Vec::new);
        self.needs_sort.clear();
        self.needs_sort.resize(slots, false);
        let any = self.options.any.filter(|&a| a <= max_iw);

        let (initial, _) = self.registry.add(nfa.initials())?;
        self.check_state_limit()?;
        let mut stack = vec![initial];
        let mut finals = Vec::new();
        let mut arcs: Vec<(State, Symbol, State)> = Vec::new();

        while let Some(current) = stack.pop() {
            self.old.clear();
            self.old.extend_from_slice(self.registry.states(current).unwrap_or_default());

            if self.old.iter().any(|&q| nfa.is_final(q)) {
                finals.push(current);
            }

            self.touched.clear();
            for &q in &self.old {
                for &iw in nfa.iws(q) {
                    let dest = nfa.dest(q, iw);
                    if dest.is_empty() {
                        continue;
                    }
                    let slot = &mut self.scratch[iw as usize];
                    if slot.is_empty() {
                        self.touched.push(iw);
                    } else {
                        self.needs_sort[iw as usize] = true;
                    }
                    slot.extend_from_slice(dest);
                }
            }

            if let Some(any) = any {
                if self.old.len() > 1 && !self.scratch[any as usize].is_empty() {
                    for &iw in &self.touched {
                        if iw == any {
                            continue;
                        }
                        for &q in &self.old {
                            if nfa.iws(q).binary_search(&iw).is_ok() {
                                continue;
                            }
                            let wildcard = nfa.dest(q, any);
                            if !wildcard.is_empty() {
                                self.scratch[iw as usize].extend_from_slice(wildcard);
                                self.needs_sort[iw as usize] = true;
                            }
                        }
                    }
                }
            }

            let mut touched = std::mem::take(&mut self.touched);
            touched.sort_unstable();

            let any_target = match any {
                Some(any) if !self.scratch[any as usize].is_empty() => {
                    let target = self.resolve(any, &mut stack)?;
                    arcs.push((current, any, target));
                    Some(target)
                }
                _ => None,
            };
            for &iw in &touched {
                if Some(iw) == any {
                    continue;
                }
                let target = self.resolve(iw, &mut stack)?;
                if Some(target) != any_target {
                    arcs.push((current, iw, target));
                }
            }
            self.touched = touched;
        }

        debug!(
            "subset construction produced {} states and {} transitions from {} states",
            self.registry.len(),
            arcs.len(),
            nfa.size()
        );

        dfa.create();
        dfa.set_max_iw(max_iw)?;
        dfa.set_max_state((self.registry.len() - 1) as State)?;
        dfa.set_initial(initial)?;
        math::sort_dedup(&mut finals);
        dfa.set_finals(&finals)?;
        for (from, iw, to) in arcs {
            dfa.set_transition(from, iw, to)?;
        }
        dfa.prepare()?;

        if !self.options.keep_state_map {
            self.registry.clear();
        }
        Ok(())
    }

    /// Turns the accumulated destinations on `iw` into an output state, creating it if the set
    /// is new. Clears the accumulator.
    fn resolve(&mut self, iw: Symbol, stack: &mut Vec<State>) -> Result<State, FaError> {
        let slot = &mut self.scratch[iw as usize];
        if self.needs_sort[iw as usize] {
            math::sort_dedup(slot);
            self.needs_sort[iw as usize] = false;
        }
        let (target, created) = self.registry.add(slot)?;
        slot.clear();
        if created {
            self.check_state_limit()?;
            trace!("new state {target} stands for {:?}", self.registry.states(target));
            stack.push(target);
        }
        Ok(target)
    }

    fn check_state_limit(&self) -> Result<(), FaError> {
        match self.options.max_states {
            Some(max) if self.registry.len() > max => Err(FaError::LimitExceeded {
                what: "deterministic automaton",
                len: self.registry.len(),
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl Nfa {
    /// Returns an equivalent deterministic automaton, see [`Determinizer`].
    pub fn determinize(&self, options: DeterminizeOptions) -> Result<Dfa, FaError> {
        let mut dfa = Dfa::new();
        Determinizer::new(options).process(self, &mut dfa)?;
        Ok(dfa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    const ANY: Symbol = 9;

    #[test_log::test]
    fn determinize_keeps_language() {
        // L = 1*1
        let nfa = NfaBuilder::default()
            .with_initials([0])
            .with_finals([1])
            .with_edges([(0, 1, 0), (0, 1, 1)])
            .into_nfa()
            .unwrap();
        let dfa = nfa.determinize(DeterminizeOptions::default()).unwrap();
        assert_eq!(dfa.size(), 2);
        assert_eq!(dfa.initial(), Some(0));
        for word in [vec![], vec![1], vec![1, 1], vec![1, 1, 1], vec![2]] {
            assert_eq!(
                nfa.accepts(word.clone(), &RunOptions::default()),
                dfa.accepts(word.clone(), None),
                "{word:?}"
            );
        }
    }

    #[test]
    fn wildcard_expands_into_explicit_symbols() {
        // initial set {0, 1}; 0 -any-> 2, 1 -3-> 3
        let nfa = NfaBuilder::default()
            .with_initials([0, 1])
            .with_finals([2, 3])
            .with_edges([(0, ANY, 2), (1, 3, 3)])
            .into_nfa()
            .unwrap();
        let mut det = Determinizer::new(DeterminizeOptions::default().with_any(ANY).with_state_map());
        let mut dfa = Dfa::new();
        det.process(&nfa, &mut dfa).unwrap();

        assert_eq!(det.state_set(0), Some(&[0, 1][..]));
        let on_three = dfa.dest(0, 3).unwrap();
        assert_eq!(det.state_set(on_three), Some(&[2, 3][..]));
        let on_any = dfa.dest(0, ANY).unwrap();
        assert_eq!(det.state_set(on_any), Some(&[2][..]));
        // a symbol nobody mentions falls back to the wildcard
        assert_eq!(dfa.reached([5], Some(ANY)), Some(on_any));
    }

    #[test]
    fn explicit_transitions_covered_by_wildcard_are_dropped() {
        let nfa = NfaBuilder::default()
            .with_initials([0, 1])
            .with_finals([2])
            .with_edges([(0, ANY, 2), (1, 4, 2)])
            .into_nfa()
            .unwrap();
        let dfa = nfa
            .determinize(DeterminizeOptions::default().with_any(ANY))
            .unwrap();
        assert_eq!(dfa.iws(0), &[ANY]);
        assert!(dfa.accepts([4], Some(ANY)));
        assert!(dfa.accepts([7], Some(ANY)));
    }

    #[test]
    fn single_state_keeps_its_own_wildcard_semantics() {
        // a lone state with an explicit arc is not expanded
        let nfa = NfaBuilder::default()
            .with_initials([0])
            .with_finals([1])
            .with_edges([(0, ANY, 1), (0, 3, 2)])
            .into_nfa()
            .unwrap();
        let dfa = nfa
            .determinize(DeterminizeOptions::default().with_any(ANY))
            .unwrap();
        assert!(!dfa.accepts([3], Some(ANY)));
        assert!(dfa.accepts([4], Some(ANY)));
    }

    #[test]
    fn single_final_state_without_transitions() {
        let nfa = NfaBuilder::default()
            .with_initials([0])
            .with_finals([0])
            .into_nfa()
            .unwrap();
        let dfa = nfa.determinize(DeterminizeOptions::default()).unwrap();
        assert_eq!(dfa.size(), 1);
        assert_eq!(dfa.finals(), &[0]);
        assert_eq!(dfa.transition_count(), 0);
        assert!(dfa.accepts([], None));
    }

    #[test]
    fn limits_and_preconditions() {
        // (1|2)* 1 (1|2) (1|2) needs 8 states
        let nfa = NfaBuilder::default()
            .with_initials([0])
            .with_finals([3])
            .with_edges([
                (0, 1, 0),
                (0, 2, 0),
                (0, 1, 1),
                (1, 1, 2),
                (1, 2, 2),
                (2, 1, 3),
                (2, 2, 3),
            ])
            .into_nfa()
            .unwrap();
        assert_eq!(
            nfa.determinize(DeterminizeOptions::default()).unwrap().size(),
            8
        );
        assert!(matches!(
            nfa.determinize(DeterminizeOptions::default().with_max_states(4)),
            Err(FaError::LimitExceeded { max: 4, .. })
        ));
        assert!(matches!(
            nfa.determinize(DeterminizeOptions::default().with_max_states(0)),
            Err(FaError::LimitExceeded { len: 1, max: 0, .. })
        ));
        assert!(matches!(
            nfa.determinize(DeterminizeOptions::default().with_max_set_len(2)),
            Err(FaError::LimitExceeded { max: 2, .. })
        ));

        let no_initial = NfaBuilder::default()
            .with_finals([0])
            .into_nfa()
            .unwrap();
        assert!(matches!(
            no_initial.determinize(DeterminizeOptions::default()),
            Err(FaError::PreconditionViolation(_))
        ));
        assert_eq!(
            Nfa::new().determinize(DeterminizeOptions::default()),
            Err(FaError::NotPrepared)
        );
    }

    #[test]
    fn state_map_is_dropped_by_default() {
        let nfa = NfaBuilder::default()
            .with_initials([0])
            .with_finals([0])
            .into_nfa()
            .unwrap();
        let mut det = Determinizer::new(DeterminizeOptions::default());
        let mut dfa = Dfa::new();
        det.process(&nfa, &mut dfa).unwrap();
        assert_eq!(det.state_set(0), None);
    }
}
