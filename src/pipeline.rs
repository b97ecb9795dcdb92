use tracing::{debug, info_span};

use crate::{
    automaton::{Dfa, DfaRead, Nfa, NfaRead, Symbol},
    determinization::{DeterminizeOptions, Determinizer},
    epsilon::{EpsilonOptions, EpsilonRemover},
    error::FaError,
    minimization::{MinimizeOptions, Minimizer},
};

/// Configures [`compile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// The epsilon symbol. Epsilon removal only runs if it is set.
    pub epsilon: Option<Symbol>,
    /// The wildcard symbol, passed on to every stage.
    pub any: Option<Symbol>,
    /// Limits the number of states of the deterministic automaton.
    pub max_states: Option<usize>,
    /// Limits the number of input states one deterministic state may stand for.
    pub max_set_len: Option<usize>,
}

impl CompileOptions {
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

    /// Limits the number of states of the deterministic automaton.
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    /// Limits the number of input states one deterministic state may stand for.
    pub fn with_max_set_len(mut self, max_set_len: usize) -> Self {
        self.max_set_len = Some(max_set_len);
        self
    }

    fn determinize_options(&self) -> DeterminizeOptions {
        DeterminizeOptions {
            any: self.any,
            max_set_len: self.max_set_len,
            max_states: self.max_states,
            keep_state_map: false,
        }
    }
}

/// Turns a non-deterministic automaton into the minimal deterministic automaton accepting the
/// same language. Epsilon transitions are removed first if an epsilon symbol is configured, then
/// the automaton is determinized and minimized.
pub fn compile<N: NfaRead>(nfa: &N, options: &CompileOptions) -> Result<Dfa, FaError> {
    let _span = info_span!("compile", states = nfa.size()).entered();

    let without_epsilon;
    let input: &dyn NfaRead = match options.epsilon {
        Some(epsilon) => {
            let mut eps_options = EpsilonOptions::new(epsilon);
            eps_options.any = options.any;
            let mut out = Nfa::new();
            EpsilonRemover::new(eps_options).process(nfa, &mut out)?;
            debug!("epsilon removal left {} states", out.size());
            without_epsilon = out;
            &without_epsilon
        }
        None => nfa,
    };

    let mut dfa = Dfa::new();
    Determinizer::new(options.determinize_options()).process(input, &mut dfa)?;

    let mut min = Dfa::new();
    Minimizer::new(MinimizeOptions { any: options.any }).minimize(&dfa, &mut min)?;
    debug!(
        "compiled automaton has {} states, determinized one had {}",
        min.size(),
        dfa.size()
    );
    Ok(min)
}
