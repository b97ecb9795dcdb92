use std::fmt::{Error, Result, Write};

use tracing::trace;

use crate::automaton::{Dfa, DfaRead, Nfa, NfaRead, State, Symbol};

/// Renders an automaton in the line based text dump format. The header line lists the maximal
/// state (`-1` if there is none), the maximal input weight, the initial and the final states. It is
/// followed by one `<from> <to> <symbol>` line per transition, ordered by source state, symbol and
/// destination, and a terminating blank line.
pub trait WriteText {
    /// Writes the dump of `self` into `w`. Fails if the automaton is not prepared.
    fn write_text<W: Write>(&self, w: &mut W) -> Result;

    /// Returns the dump of `self` as a string, which is empty if the automaton is not prepared.
    fn to_text(&self) -> String {
        let mut w = String::new();
        if self.write_text(&mut w).is_err() {
            w.clear();
        }
        trace!("produced text dump\n{}", w);
        w
    }
}

fn write_header<W: Write>(
    w: &mut W,
    max_state: Option<State>,
    max_iw: Symbol,
    initials: &[State],
    finals: &[State],
) -> Result {
    match max_state {
        Some(max) => write!(w, "{max}")?,
        None => w.write_str("-1")?,
    }
    write!(w, " {max_iw} initial")?;
    for s in initials {
        write!(w, " {s}")?;
    }
    w.write_str(" final")?;
    for s in finals {
        write!(w, " {s}")?;
    }
    w.write_char('\n')
}

/// Writes the text dump of any prepared non-deterministic automaton.
pub fn write_nfa_text<N: NfaRead + ?Sized, W: Write>(nfa: &N, w: &mut W) -> Result {
    if !nfa.is_prepared() {
        return Err(Error);
    }
    write_header(w, nfa.max_state(), nfa.max_iw(), nfa.initials(), nfa.finals())?;
    if let Some(max) = nfa.max_state() {
        for q in 0..=max {
            for &iw in nfa.iws(q) {
                for &to in nfa.dest(q, iw) {
                    writeln!(w, "{q} {to} {iw}")?;
                }
            }
        }
    }
    w.write_char('\n')
}

/// Writes the text dump of any prepared deterministic automaton.
pub fn write_dfa_text<D: DfaRead + ?Sized, W: Write>(dfa: &D, w: &mut W) -> Result {
    if !dfa.is_prepared() {
        return Err(Error);
    }
    let initial: Vec<State> = dfa.initial().into_iter().collect();
    write_header(w, dfa.max_state(), dfa.max_iw(), &initial, dfa.finals())?;
    if let Some(max) = dfa.max_state() {
        for q in 0..=max {
            for &iw in dfa.iws(q) {
                if let Some(to) = dfa.dest(q, iw) {
                    writeln!(w, "{q} {to} {iw}")?;
                }
            }
        }
    }
    w.write_char('\n')
}

impl WriteText for Nfa {
    fn write_text<W: Write>(&self, w: &mut W) -> Result {
        write_nfa_text(self, w)
    }
}

impl WriteText for Dfa {
    fn write_text<W: Write>(&self, w: &mut W) -> Result {
        write_dfa_text(self, w)
    }
}
