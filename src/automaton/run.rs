use bit_set::BitSet;

use crate::automaton::{Dfa, DfaRead, Nfa, NfaRead, State, Symbol};

/// Determines how symbols are interpreted when running a word through an automaton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Transitions on this symbol are taken without consuming input.
    pub epsilon: Option<Symbol>,
    /// Transitions on this symbol are taken for every input symbol on which the state has no
    /// explicit transition.
    pub any: Option<Symbol>,
}

impl RunOptions {
    /// Designates the epsilon symbol.
    pub fn with_epsilon(mut self, epsilon: Symbol) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Designates the wildcard symbol.
    pub fn with_any(mut self, any: Symbol) -> Self {
        self.any = Some(any);
        self
    }
}

/// Picks the transitions a state takes on `symbol`: the explicit ones if there are any, the
/// wildcard ones otherwise.
fn step_symbol(iws: &[Symbol], symbol: Symbol, any: Option<Symbol>) -> Option<Symbol> {
    if iws.binary_search(&symbol).is_ok() {
        Some(symbol)
    } else {
        any.filter(|a| iws.binary_search(a).is_ok())
    }
}

impl Nfa {
    /// Extends `current` by all states reachable through epsilon transitions.
    fn epsilon_close(&self, current: &mut Vec<State>, seen: &mut BitSet, epsilon: Option<Symbol>) {
        let Some(epsilon) = epsilon else {
            return;
        };
        let mut stack = current.clone();
        while let Some(q) = stack.pop() {
            for &p in self.dest(q, epsilon) {
                if seen.insert(p as usize) {
                    current.push(p);
                    stack.push(p);
                }
            }
        }
    }

    /// Returns `true` if the automaton accepts `word`, following all initial states at once.
    pub fn accepts<I: IntoIterator<Item = Symbol>>(&self, word: I, options: &RunOptions) -> bool {
        let mut seen = BitSet::with_capacity(self.size());
        let mut current: Vec<State> = self.initials().to_vec();
        current.iter().for_each(|&q| {
            seen.insert(q as usize);
        });
        self.epsilon_close(&mut current, &mut seen, options.epsilon);

        for symbol in word {
            seen.clear();
            let mut next = Vec::new();
            for &q in &current {
                let Some(taken) = step_symbol(self.iws(q), symbol, options.any) else {
                    continue;
                };
                for &p in self.dest(q, taken) {
                    if seen.insert(p as usize) {
                        next.push(p);
                    }
                }
            }
            self.epsilon_close(&mut next, &mut seen, options.epsilon);
            if next.is_empty() {
                return false;
            }
            current = next;
        }
        current.iter().any(|&q| self.is_final(q))
    }
}

impl Dfa {
    /// Returns the state reached after reading `word`, `None` if the run falls into the dead
    /// state.
    pub fn reached<I: IntoIterator<Item = Symbol>>(&self, word: I, any: Option<Symbol>) -> Option<State> {
        let mut q = self.initial()?;
        for symbol in word {
            let taken = step_symbol(self.iws(q), symbol, any)?;
            q = self.dest(q, taken)?;
        }
        Some(q)
    }

    /// Returns `true` if the automaton accepts `word`.
    pub fn accepts<I: IntoIterator<Item = Symbol>>(&self, word: I, any: Option<Symbol>) -> bool {
        self.reached(word, any).is_some_and(|q| self.is_final(q))
    }
}
