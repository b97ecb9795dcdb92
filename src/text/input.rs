use std::{collections::BTreeMap, io::BufRead, marker::PhantomData};

use thiserror::Error;
use tracing::{trace, warn};

use crate::{
    automaton::{Dfa, DfaWrite, Nfa, NfaWrite, State, Symbol},
    error::FaError,
};

/// Errors raised while reading the text dump format. Line numbers start at `1`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// The header line does not have the shape `<max state> <max iw> initial ... final ...`.
    #[error("line {line}: malformed header, expected `<max state> <max iw> initial <states> final <states>`")]
    MalformedHeader {
        /// The offending line.
        line: usize,
    },
    /// A transition line does not consist of exactly three numbers.
    #[error("line {line}: malformed transition, expected `<from> <to> <symbol>`")]
    MalformedTransition {
        /// The offending line.
        line: usize,
    },
    /// A token that should be a number is not one.
    #[error("line {line}: `{token}` is not a valid number")]
    NotANumber {
        /// The offending line.
        line: usize,
        /// The token that could not be parsed.
        token: String,
    },
    /// The automaton rejected a state, symbol or transition.
    #[error("line {line}: {source}")]
    Invalid {
        /// The offending line.
        line: usize,
        /// The error raised by the automaton.
        source: FaError,
    },
    /// A deterministic automaton has two transitions on the same symbol leaving the same state.
    #[error("line {line}: state {from} already has a transition on {symbol}")]
    ConflictingTransition {
        /// The offending line.
        line: usize,
        /// The source state of both transitions.
        from: State,
        /// The symbol of both transitions.
        symbol: Symbol,
    },
    /// Something other than blank lines follows the automaton.
    #[error("line {line}: unexpected input after the automaton")]
    TrailingInput {
        /// The first line that is not blank.
        line: usize,
    },
    /// The input does not contain an automaton.
    #[error("no automaton found in input")]
    MissingAutomaton,
    /// Reading from the underlying source failed.
    #[error("failed to read input: {0}")]
    Io(String),
}

/// An automaton as it is written down in the text dump format, before any validation took place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAutomaton {
    /// The line number of the header.
    pub line: usize,
    /// The maximal state, `None` if the header says `-1`.
    pub max_state: Option<State>,
    /// The maximal input weight.
    pub max_iw: Symbol,
    /// The listed initial states.
    pub initials: Vec<State>,
    /// The listed final states.
    pub finals: Vec<State>,
    /// The transitions as `(line, from, to, symbol)`.
    pub transitions: Vec<(usize, State, State, Symbol)>,
}

fn number<T: std::str::FromStr>(token: &str, line: usize) -> Result<T, TextError> {
    token.parse().map_err(|_| TextError::NotANumber {
        line,
        token: token.to_string(),
    })
}

impl TextAutomaton {
    /// Parses one block of lines, the first of which is the header. None of the lines may be
    /// blank.
    pub fn parse<'a, I>(lines: I) -> Result<Self, TextError>
    where
        I: IntoIterator<Item = (usize, &'a str)>,
    {
        let mut lines = lines.into_iter();
        let (line, header) = lines.next().ok_or(TextError::MissingAutomaton)?;
        let mut tokens = header.split_whitespace();
        let malformed = || TextError::MalformedHeader { line };

        let max_state = match tokens.next().ok_or_else(malformed)? {
            "-1" => None,
            token => Some(number(token, line)?),
        };
        let max_iw = number(tokens.next().ok_or_else(malformed)?, line)?;
        if tokens.next() != Some("initial") {
            return Err(malformed());
        }
        let mut initials = Vec::new();
        let mut finals = Vec::new();
        let mut seen_final = false;
        for token in tokens {
            match (token, seen_final) {
                ("final", false) => seen_final = true,
                (_, false) => initials.push(number(token, line)?),
                (_, true) => finals.push(number(token, line)?),
            }
        }
        if !seen_final {
            return Err(malformed());
        }

        let mut transitions = Vec::new();
        for (line, text) in lines {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            let [from, to, symbol] = tokens[..] else {
                return Err(TextError::MalformedTransition { line });
            };
            transitions.push((
                line,
                number(from, line)?,
                number(to, line)?,
                number(symbol, line)?,
            ));
        }

        Ok(Self {
            line,
            max_state,
            max_iw,
            initials,
            finals,
            transitions,
        })
    }

    /// Builds a prepared non-deterministic automaton.
    pub fn into_nfa(self) -> Result<Nfa, TextError> {
        let header = self.line;
        let at = |line: usize| move |source: FaError| TextError::Invalid { line, source };

        let mut nfa = Nfa::new();
        nfa.set_max_iw(self.max_iw).map_err(at(header))?;
        if let Some(max) = self.max_state {
            nfa.set_max_state(max).map_err(at(header))?;
        }
        nfa.set_initials(&self.initials).map_err(at(header))?;
        nfa.set_finals(&self.finals).map_err(at(header))?;
        for (line, from, to, symbol) in self.transitions {
            nfa.add_transition(from, symbol, to).map_err(at(line))?;
        }
        nfa.prepare().map_err(at(header))?;
        Ok(nfa)
    }

    /// Builds a prepared deterministic automaton. At most one initial state may be listed, and
    /// it has to be present if there are states.
    pub fn into_dfa(self) -> Result<Dfa, TextError> {
        let header = self.line;
        let at = |line: usize| move |source: FaError| TextError::Invalid { line, source };

        let initial = match self.initials[..] {
            [] => None,
            [initial] => Some(initial),
            _ => return Err(TextError::MalformedHeader { line: header }),
        };

        let mut dfa = Dfa::new();
        dfa.set_max_iw(self.max_iw).map_err(at(header))?;
        if let Some(max) = self.max_state {
            dfa.set_max_state(max).map_err(at(header))?;
        }
        if let Some(initial) = initial {
            dfa.set_initial(initial).map_err(at(header))?;
        }
        dfa.set_finals(&self.finals).map_err(at(header))?;

        let mut seen = BTreeMap::new();
        for (line, from, to, symbol) in self.transitions {
            if let Some(&known) = seen.get(&(from, symbol)) {
                if known != to {
                    return Err(TextError::ConflictingTransition { line, from, symbol });
                }
                continue;
            }
            dfa.set_transition(from, symbol, to).map_err(at(line))?;
            seen.insert((from, symbol), to);
        }
        dfa.prepare().map_err(at(header))?;
        Ok(dfa)
    }
}

/// Automata that can be built from their text dump.
pub trait FromText: Sized {
    /// Validates and builds the automaton.
    fn from_text_automaton(automaton: TextAutomaton) -> Result<Self, TextError>;
}

impl FromText for Nfa {
    fn from_text_automaton(automaton: TextAutomaton) -> Result<Self, TextError> {
        automaton.into_nfa()
    }
}

impl FromText for Dfa {
    fn from_text_automaton(automaton: TextAutomaton) -> Result<Self, TextError> {
        automaton.into_dfa()
    }
}

/// Splits off the next block of non-blank lines, skipping blank lines in front of it.
fn next_block<'a, I>(lines: &mut std::iter::Peekable<I>) -> Vec<(usize, &'a str)>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    while lines.next_if(|(_, text)| text.trim().is_empty()).is_some() {}
    let mut block = Vec::new();
    while let Some(line) = lines.next_if(|(_, text)| !text.trim().is_empty()) {
        block.push(line);
    }
    block
}

fn parse_single<A: FromText>(text: &str) -> Result<A, TextError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l)).peekable();
    let block = next_block(&mut lines);
    if block.is_empty() {
        return Err(TextError::MissingAutomaton);
    }
    let automaton = TextAutomaton::parse(block)?;
    if let Some((line, _)) = next_block(&mut lines).first() {
        return Err(TextError::TrailingInput { line: *line });
    }
    A::from_text_automaton(automaton)
}

/// Reads a single non-deterministic automaton from its text dump.
pub fn parse_nfa(text: &str) -> Result<Nfa, TextError> {
    parse_single(text)
}

/// Reads a single deterministic automaton from its text dump.
pub fn parse_dfa(text: &str) -> Result<Dfa, TextError> {
    parse_single(text)
}

/// Reads a sequence of automata separated by blank lines from a [`BufRead`] and yields them one
/// by one. Line numbers in errors count from the start of the stream. The stream ends after the
/// first read error.
#[derive(Debug)]
pub struct TextAutomatonStream<R, A = Nfa> {
    read: R,
    line: usize,
    buf: String,
    block: Vec<(usize, String)>,
    failed: bool,
    _automaton: PhantomData<A>,
}

impl<R, A> TextAutomatonStream<R, A> {
    /// Creates a stream reading from `read`.
    pub fn new(read: R) -> Self {
        Self {
            read,
            line: 0,
            buf: String::new(),
            block: Vec::new(),
            failed: false,
            _automaton: PhantomData,
        }
    }

    /// The number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead, A: FromText> TextAutomatonStream<R, A> {
    fn finish_block(&mut self) -> Result<A, TextError> {
        let block = std::mem::take(&mut self.block);
        trace!(
            "parsing automaton from lines {} to {}",
            block.first().map_or(0, |(l, _)| *l),
            block.last().map_or(0, |(l, _)| *l)
        );
        let automaton = TextAutomaton::parse(block.iter().map(|(l, t)| (*l, t.as_str())))?;
        A::from_text_automaton(automaton)
    }
}

impl<R: BufRead, A: FromText> Iterator for TextAutomatonStream<R, A> {
    type Item = Result<A, TextError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.buf.clear();
            match self.read.read_line(&mut self.buf) {
                Ok(0) => {
                    if self.block.is_empty() {
                        return None;
                    }
                    return Some(self.finish_block());
                }
                Ok(_) => {
                    self.line += 1;
                    let text = self.buf.trim_end();
                    if !text.is_empty() {
                        self.block.push((self.line, text.to_string()));
                    } else if !self.block.is_empty() {
                        return Some(self.finish_block());
                    }
                }
                Err(e) => {
                    warn!("reading automaton stream failed after line {}: {e}", self.line);
                    self.failed = true;
                    return Some(Err(TextError::Io(e.to_string())));
                }
            }
        }
    }
}
