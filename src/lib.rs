//! Construction, determinization and minimization of finite automata over integer symbols, as
//! they are needed to compile regular-expression based tokenizers and classifiers.
//!
//! Automata are stored in [`Nfa`] and [`Dfa`], which are written through [`NfaWrite`]/[`DfaWrite`],
//! finalized by `prepare` and read through [`NfaRead`]/[`DfaRead`] afterwards. The algorithms only
//! depend on these traits, so they can be run on any other representation as well.
//!
//! The compilation of an automaton produced by a front end usually runs through three stages
//! - [`epsilon::EpsilonRemover`] eliminates transitions on a designated epsilon symbol,
//! - [`determinization::Determinizer`] runs the subset construction, optionally expanding a
//!   designated wildcard symbol that stands for every symbol a state does not mention,
//! - [`minimization::Minimizer`] merges equivalent states following Hopcroft and Gries.
//!
//! [`pipeline::compile`] chains them. Sets of states are mapped to states of the produced
//! automaton through the [`state_set::StateSetRegistry`]. For fixtures and debugging, automata can
//! be written and read in a simple line based dump, see [`text`].
//!
//! ```
//! use fa_compile::prelude::*;
//!
//! // words over {1, 2} that end in 1, with a superfluous non-deterministic branch
//! let nfa = NfaBuilder::default()
//!     .with_initials([0])
//!     .with_finals([1, 2])
//!     .with_edges([(0, 1, 0), (0, 2, 0), (0, 1, 1), (0, 1, 2)])
//!     .into_nfa()
//!     .unwrap();
//! let dfa = compile(&nfa, &CompileOptions::default()).unwrap();
//! assert_eq!(dfa.size(), 2);
//! assert!(dfa.accepts([2, 1], None));
//! assert!(!dfa.accepts([1, 2], None));
//! ```
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use fa_compile::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        automaton::{
            Dfa, DfaBuilder, DfaRead, DfaWrite, Nfa, NfaBuilder, NfaRead, NfaWrite, RunOptions,
            State, Symbol,
        },
        determinization::{DeterminizeOptions, Determinizer},
        epsilon::{EpsilonOptions, EpsilonRemover},
        error::FaError,
        math,
        minimization::{MinimizeOptions, Minimizer},
        pipeline::{compile, CompileOptions},
        state_set::StateSetRegistry,
        text::{parse_dfa, parse_nfa, TextAutomatonStream, TextError, WriteText},
    };
}

/// Collection types and small helpers on sorted vectors that are used throughout the crate.
pub mod math;

/// The error type shared by the automaton model and the algorithms.
pub mod error;
pub use error::FaError;

/// The automaton model: state and symbol types, the read and write traits and the provided
/// representations.
pub mod automaton;
pub use automaton::{Dfa, DfaRead, DfaWrite, Nfa, NfaRead, NfaWrite, State, Symbol};

pub mod state_set;

/// Elimination of epsilon transitions.
pub mod epsilon;

/// The subset construction.
pub mod determinization;

/// Minimization of deterministic automata through partition refinement.
pub mod minimization;

pub mod text;

/// Generation of random automata and words, mostly useful for testing and benchmarking.
#[cfg(feature = "random")]
pub mod random;

/// Chains the construction stages into one call.
pub mod pipeline;
pub use pipeline::{compile, CompileOptions};
