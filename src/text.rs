//! A line based text dump of automata, mainly used for fixtures and debugging.
//!
//! Every automaton starts with a header line `<max state> <max iw> initial <states> final
//! <states>`, followed by one `<from> <to> <symbol>` line per transition. A blank line terminates
//! the automaton, so several of them can be read from one stream with [`TextAutomatonStream`].

/// Reading the text dump.
pub mod input;
pub use input::{parse_dfa, parse_nfa, FromText, TextAutomaton, TextAutomatonStream, TextError};

/// Writing the text dump.
pub mod output;
pub use output::{write_dfa_text, write_nfa_text, WriteText};
