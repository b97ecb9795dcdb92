//! Seeded generators for random automata and words, used by the property tests and the
//! benchmarks.

use fastrand::Rng;
use tracing::debug;

use crate::{
    automaton::{Dfa, DfaWrite, Nfa, NfaWrite, State, Symbol},
    error::FaError,
};

/// Shape of the automata drawn by [`generate_random_nfa`] and [`generate_random_dfa`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomParams {
    /// The number of states, at least one state is always created.
    pub size: usize,
    /// Ordinary symbols are drawn from `0..symbols`.
    pub symbols: Symbol,
    /// The probability that a state has a transition on a given symbol.
    pub density: f64,
    /// The probability that a state is final.
    pub final_probability: f64,
    /// If set, states get epsilon transitions on this symbol, always towards larger states so
    /// that they never form a cycle.
    pub epsilon: Option<Symbol>,
    /// If set, states get wildcard transitions on this symbol.
    pub any: Option<Symbol>,
}

impl RandomParams {
    /// Parameters for automata with `size` states over `symbols` symbols.
    pub fn new(size: usize, symbols: Symbol) -> Self {
        Self {
            size,
            symbols,
            density: 0.5,
            final_probability: 0.3,
            epsilon: None,
            any: None,
        }
    }

    /// Sets the probability of a transition.
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Sets the probability of a state being final.
    pub fn with_final_probability(mut self, final_probability: f64) -> Self {
        self.final_probability = final_probability;
        self
    }

    /// Adds epsilon transitions on `epsilon`.
    pub fn with_epsilon(mut self, epsilon: Symbol) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Adds wildcard transitions on `any`.
    pub fn with_any(mut self, any: Symbol) -> Self {
        self.any = Some(any);
        self
    }

    fn max_state(&self) -> State {
        self.size.max(1) as State - 1
    }

    fn max_iw(&self) -> Symbol {
        [Some(self.symbols.saturating_sub(1)), self.epsilon, self.any]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(0)
    }

    fn draw_finals(&self, rng: &mut Rng) -> Vec<State> {
        (0..=self.max_state())
            .filter(|_| rng.f64() < self.final_probability)
            .collect()
    }
}

/// Draws a random non-deterministic automaton. Every state has a transition on every symbol with
/// probability `density`, leading to one or two uniformly drawn states. State `0` is always
/// initial, one further initial state is added with probability one half.
pub fn generate_random_nfa(rng: &mut Rng, params: &RandomParams) -> Result<Nfa, FaError> {
    let max_state = params.max_state();
    let mut nfa = Nfa::new();
    nfa.set_max_state(max_state)?;
    nfa.set_max_iw(params.max_iw())?;

    let mut initials = vec![0];
    if max_state > 0 && rng.bool() {
        initials.push(rng.u32(1..=max_state));
    }
    nfa.set_initials(&initials)?;
    nfa.set_finals(&params.draw_finals(rng))?;

    let mut transitions = 0;
    for q in 0..=max_state {
        let symbols = (0..params.symbols).chain(params.any);
        for iw in symbols {
            if rng.f64() >= params.density {
                continue;
            }
            for _ in 0..rng.usize(1..=2) {
                nfa.add_transition(q, iw, rng.u32(0..=max_state))?;
                transitions += 1;
            }
        }
        if let Some(epsilon) = params.epsilon {
            if q < max_state && rng.f64() < params.density / 2.0 {
                nfa.add_transition(q, epsilon, rng.u32(q + 1..=max_state))?;
                transitions += 1;
            }
        }
    }
    nfa.prepare()?;
    debug!("drew random nfa with {} states and {transitions} transitions", max_state + 1);
    Ok(nfa)
}

/// Draws a random deterministic automaton with initial state `0`. Epsilon transitions are not
/// drawn even if `params` asks for them.
pub fn generate_random_dfa(rng: &mut Rng, params: &RandomParams) -> Result<Dfa, FaError> {
    let max_state = params.max_state();
    let mut dfa = Dfa::new();
    dfa.set_max_state(max_state)?;
    dfa.set_max_iw(params.max_iw())?;
    dfa.set_initial(0)?;
    dfa.set_finals(&params.draw_finals(rng))?;

    for q in 0..=max_state {
        for iw in (0..params.symbols).chain(params.any) {
            if rng.f64() < params.density {
                dfa.set_transition(q, iw, rng.u32(0..=max_state))?;
            }
        }
    }
    dfa.prepare()?;
    Ok(dfa)
}

/// Draws a word over `symbols` whose length is uniform in `min_len..=max_len`.
pub fn generate_random_word(
    rng: &mut Rng,
    symbols: &[Symbol],
    min_len: usize,
    max_len: usize,
) -> Vec<Symbol> {
    if symbols.is_empty() {
        return Vec::new();
    }
    let length = rng.usize(min_len..=max_len);
    (0..length)
        .map(|_| symbols[rng.usize(..symbols.len())])
        .collect()
}

/// All words over `symbols` of length at most `max_len`, shortest first.
pub fn all_words(symbols: &[Symbol], max_len: usize) -> Vec<Vec<Symbol>> {
    let mut words = vec![Vec::new()];
    let mut start = 0;
    for _ in 0..max_len {
        let end = words.len();
        for i in start..end {
            for &a in symbols {
                let mut word = words[i].clone();
                word.push(a);
                words.push(word);
            }
        }
        start = end;
    }
    words
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use itertools::Itertools;

    use super::*;
    use crate::{math, prelude::*};

    const SEEDS: u64 = 60;

    fn dfa_accepts_from(dfa: &Dfa, state: State, word: &[Symbol]) -> bool {
        dfa_accepts_from_with_any(dfa, state, word, None)
    }

    fn dfa_accepts_from_with_any(
        dfa: &Dfa,
        mut state: State,
        word: &[Symbol],
        any: Option<Symbol>,
    ) -> bool {
        for &a in word {
            let next = dfa
                .dest(state, a)
                .or_else(|| any.and_then(|any| dfa.dest(state, any)));
            match next {
                Some(next) => state = next,
                None => return false,
            }
        }
        dfa.is_final(state)
    }

    #[test_log::test]
    fn determinization_keeps_language() {
        let words = all_words(&[0, 1, 2], 5);
        for seed in 0..SEEDS {
            let mut rng = Rng::with_seed(seed);
            let nfa = generate_random_nfa(&mut rng, &RandomParams::new(6, 3)).unwrap();
            let dfa = nfa.determinize(DeterminizeOptions::default()).unwrap();
            for word in &words {
                assert_eq!(
                    nfa.accepts(word.iter().copied(), &RunOptions::default()),
                    dfa.accepts(word.iter().copied(), None),
                    "seed {seed}, word {word:?}\n{nfa:?}\n{dfa:?}"
                );
            }
        }
    }

    #[test]
    fn wildcard_determinization_keeps_language() {
        const ANY: Symbol = 4;
        // 3 is never used explicitly and always falls back to the wildcard
        let words = all_words(&[0, 1, 3, ANY], 4);
        for seed in 0..SEEDS {
            let mut rng = Rng::with_seed(seed);
            let params = RandomParams::new(5, 2).with_any(ANY);
            let nfa = generate_random_nfa(&mut rng, &params).unwrap();
            let dfa = nfa
                .determinize(DeterminizeOptions::default().with_any(ANY))
                .unwrap();
            let run = RunOptions::default().with_any(ANY);
            for word in &words {
                assert_eq!(
                    nfa.accepts(word.iter().copied(), &run),
                    dfa.accepts(word.iter().copied(), Some(ANY)),
                    "seed {seed}, word {word:?}\n{nfa:?}\n{dfa:?}"
                );
            }
        }
    }

    #[test]
    fn epsilon_removal_keeps_language() {
        const EPS: Symbol = 3;
        let words = all_words(&[0, 1, 2], 4);
        for seed in 0..SEEDS {
            let mut rng = Rng::with_seed(seed);
            let params = RandomParams::new(7, 3).with_epsilon(EPS).with_density(0.4);
            let nfa = generate_random_nfa(&mut rng, &params).unwrap();
            let plain = nfa.remove_epsilon(EpsilonOptions::new(EPS)).unwrap();
            assert!(!plain.uses_symbol(EPS));
            let with_eps = RunOptions::default().with_epsilon(EPS);
            for word in &words {
                assert_eq!(
                    nfa.accepts(word.iter().copied(), &with_eps),
                    plain.accepts(word.iter().copied(), &RunOptions::default()),
                    "seed {seed}, word {word:?}\n{nfa:?}\n{plain:?}"
                );
            }
        }
    }

    #[test_log::test]
    fn minimization_is_correct_minimal_and_idempotent() {
        let words = all_words(&[0, 1], 7);
        for seed in 0..SEEDS {
            let mut rng = Rng::with_seed(seed);
            let dfa = generate_random_dfa(&mut rng, &RandomParams::new(9, 2).with_density(0.8))
                .unwrap();
            let min = dfa.minimize(MinimizeOptions::default()).unwrap();
            assert!(min.size() <= dfa.size());
            for word in &words {
                assert_eq!(
                    dfa.accepts(word.iter().copied(), None),
                    min.accepts(word.iter().copied(), None),
                    "seed {seed}, word {word:?}"
                );
            }

            // every pair of states is told apart by a word no longer than the automaton
            let probes = all_words(&[0, 1], min.size());
            for (p, q) in (0..min.size() as State).tuple_combinations() {
                assert!(
                    probes
                        .iter()
                        .any(|w| dfa_accepts_from(&min, p, w) != dfa_accepts_from(&min, q, w)),
                    "seed {seed}: states {p} and {q} are equivalent\n{min:?}"
                );
            }

            let again = min.minimize(MinimizeOptions::default()).unwrap();
            assert_eq!(again, min, "seed {seed}");
        }
    }

    #[test]
    fn wildcard_minimization_keeps_language() {
        const ANY: Symbol = 3;
        let words = all_words(&[0, 1, 2, ANY, 5], 4);
        for seed in 0..SEEDS {
            let mut rng = Rng::with_seed(seed);
            let params = RandomParams::new(6, 2).with_any(ANY).with_density(0.6);
            let dfa = generate_random_dfa(&mut rng, &params).unwrap();
            let min = dfa
                .minimize(MinimizeOptions::default().with_any(ANY))
                .unwrap();
            for word in &words {
                assert_eq!(
                    dfa.accepts(word.iter().copied(), Some(ANY)),
                    min.accepts(word.iter().copied(), Some(ANY)),
                    "seed {seed}, word {word:?}\n{dfa:?}\n{min:?}"
                );
            }
        }
    }

    #[test_log::test]
    fn wildcard_minimization_is_minimal_and_idempotent() {
        const ANY: Symbol = 3;
        // 2 is never used explicitly and stands for every other symbol
        let alphabet = [0, 1, 2, ANY];
        for seed in 0..SEEDS {
            let mut rng = Rng::with_seed(seed);
            let params = RandomParams::new(6, 2).with_any(ANY).with_density(0.6);
            let dfa = generate_random_dfa(&mut rng, &params).unwrap();
            let options = MinimizeOptions::default().with_any(ANY);
            let min = dfa.minimize(options).unwrap();
            assert!(min.size() <= dfa.size());

            let probes = all_words(&alphabet, min.size());
            for (p, q) in (0..min.size() as State).tuple_combinations() {
                assert!(
                    probes.iter().any(|w| {
                        dfa_accepts_from_with_any(&min, p, w, Some(ANY))
                            != dfa_accepts_from_with_any(&min, q, w, Some(ANY))
                    }),
                    "seed {seed}: states {p} and {q} are equivalent\n{dfa:?}\n{min:?}"
                );
            }

            let again = min.minimize(options).unwrap();
            assert_eq!(again, min, "seed {seed}");
        }
    }

    #[test_log::test]
    fn compile_with_epsilon_and_wildcard_keeps_language() {
        const EPS: Symbol = 3;
        const ANY: Symbol = 4;
        // 2 is never used explicitly and always falls back to the wildcard
        let words = all_words(&[0, 1, 2], 4);
        for seed in 0..SEEDS {
            let mut rng = Rng::with_seed(seed);
            let params = RandomParams::new(6, 2)
                .with_epsilon(EPS)
                .with_any(ANY)
                .with_density(0.4);
            let nfa = generate_random_nfa(&mut rng, &params).unwrap();
            let dfa = compile(&nfa, &CompileOptions::default().with_epsilon(EPS).with_any(ANY))
                .unwrap();
            assert!((0..dfa.size() as State).all(|q| !dfa.iws(q).contains(&EPS)));
            let run = RunOptions::default().with_epsilon(EPS).with_any(ANY);
            for word in &words {
                assert_eq!(
                    nfa.accepts(word.iter().copied(), &run),
                    dfa.accepts(word.iter().copied(), Some(ANY)),
                    "seed {seed}, word {word:?}\n{nfa:?}\n{dfa:?}"
                );
            }
        }
    }

    #[test]
    fn registry_round_trip() {
        let mut rng = Rng::with_seed(7);
        let mut registry = StateSetRegistry::new();
        let mut expected: BTreeMap<Vec<State>, State> = BTreeMap::new();
        for _ in 0..2000 {
            let len = rng.usize(1..6);
            let raw: Vec<State> = (0..len).map(|_| rng.u32(0..300)).collect();
            let mut canonical = raw.clone();
            math::sort_dedup(&mut canonical);

            let (id, created) = registry.add(&raw).unwrap();
            assert_eq!(registry.add(&canonical).unwrap(), (id, false));
            match expected.get(&canonical) {
                Some(&known) => {
                    assert_eq!(known, id);
                    assert!(!created);
                }
                None => {
                    assert!(created);
                    expected.insert(canonical.clone(), id);
                }
            }
            assert_eq!(registry.states(id), Some(&canonical[..]));
        }
        assert_eq!(registry.len(), expected.len());
        assert!(expected.values().all_unique());
    }

    #[test]
    fn generators_respect_parameters() {
        let mut rng = Rng::with_seed(1);
        let params = RandomParams::new(10, 3).with_epsilon(7).with_any(8);
        let nfa = generate_random_nfa(&mut rng, &params).unwrap();
        assert_eq!(nfa.size(), 10);
        assert_eq!(nfa.max_iw(), 8);
        assert_eq!(nfa.initials()[0], 0);
        for q in 0..10 {
            assert!(nfa.dest(q, 7).iter().all(|&p| p > q));
        }

        let word = generate_random_word(&mut rng, &[1, 2], 3, 5);
        assert!((3..=5).contains(&word.len()));
        assert!(word.iter().all(|a| [1, 2].contains(a)));
        assert_eq!(all_words(&[0, 1], 2).len(), 7);
    }
}
