use bit_set::BitSet;
use tracing::{debug, trace};

use crate::{
    automaton::{check_dfa_input, Dfa, DfaRead, DfaWrite, State, Symbol},
    error::FaError,
    math,
};

mod partition;
pub use partition::{BlockId, Partition};

mod reverse;
pub use reverse::ReverseDelta;

/// Configures the [`Minimizer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimizeOptions {
    /// The wildcard symbol. If set, a state without a transition on some symbol moves to the
    /// destination of its wildcard transition instead of the dead state.
    pub any: Option<Symbol>,
}

impl MinimizeOptions {
    /// Designates the wildcard symbol.
    pub fn with_any(mut self, any: Symbol) -> Self {
        self.any = Some(any);
        self
    }
}

/// Computes the coarsest partition of the states of a deterministic automaton into classes of
/// states accepting the same language, following Hopcroft and Gries.
///
/// The refinement runs on the fully defined automaton, which has one additional dead state
/// `max_state + 1` that receives every missing transition. The alphabet is the set of symbols
/// used anywhere in the input. Initially, the final states are split from the rest, and
/// `(symbol, final block)` is queued for every symbol. Popping a pair `(a, C)` marks all states
/// with an `a` transition into `C` and splits every block in two that was marked partially. If
/// `(b, B)` was pending for a split block `B`, its twin is queued on `b`, otherwise the smaller of
/// the two halves is.
#[derive(Debug, Clone, Default)]
pub struct Minimizer {
    options: MinimizeOptions,
    partition: Partition,
    symbols: Vec<Symbol>,
    queue: Vec<(usize, BlockId)>,
    pending: BitSet,
}

impl Minimizer {
    /// Creates a minimizer with the given options.
    pub fn new(options: MinimizeOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// The options this minimizer runs with.
    pub fn options(&self) -> &MinimizeOptions {
        &self.options
    }

    /// Releases the partition and all scratch storage.
    pub fn clear(&mut self) {
        self.partition = Partition::default();
        self.symbols = Vec::new();
        self.queue = Vec::new();
        self.pending = BitSet::new();
    }

    /// Refines the partition for `dfa`. Afterwards [`Minimizer::eq_class`] answers for the states
    /// of `dfa` and [`Minimizer::write_output`] may build the quotient.
    pub fn process<D: DfaRead + ?Sized>(&mut self, dfa: &D) -> Result<(), FaError> {
        let max_state = check_dfa_input(dfa)?;
        let n = max_state as usize + 1;
        let dead = n as State;
        let total = n + 1;

        self.symbols.clear();
        for q in 0..=max_state {
            self.symbols.extend_from_slice(dfa.iws(q));
        }
        math::sort_dedup(&mut self.symbols);
        let m = self.symbols.len();

        let any = self.options.any;
        let mut delta = Vec::with_capacity(total * m);
        for q in 0..=max_state {
            for &a in &self.symbols {
                let to = dfa
                    .dest(q, a)
                    .or_else(|| any.filter(|&x| x != a).and_then(|x| dfa.dest(q, x)))
                    .unwrap_or(dead);
                delta.push(to);
            }
        }
        delta.extend(std::iter::repeat(dead).take(m));
        let reverse = ReverseDelta::new(&delta, total, m);
        drop(delta);

        self.partition = Partition::with_two_blocks(total, |q| q != dead && dfa.is_final(q));
        self.queue.clear();
        self.pending.clear();
        if self.partition.block_count() == 2 {
            let finals = self.partition.block_of(dfa.finals()[0]);
            for k in 0..m {
                self.enqueue(k, finals);
            }
        }

        let mut splitter = Vec::new();
        let mut splits = Vec::new();
        while let Some((k, block)) = self.queue.pop() {
            let index = self.pair_index(k, block);
            self.pending.remove(index);
            trace!(
                "refining against block {} on symbol {}",
                block.index(),
                self.symbols[k]
            );

            splitter.clear();
            splitter.extend_from_slice(self.partition.members(block));
            for &target in &splitter {
                for &source in reverse.sources(target, k) {
                    self.partition.mark(source);
                }
            }

            splits.clear();
            self.partition.split_marked(&mut splits);
            for &(parent, twin) in &splits {
                trace!(
                    "split block {} into {} and {} states",
                    parent.index(),
                    self.partition.block_size(parent),
                    self.partition.block_size(twin)
                );
                for j in 0..m {
                    if self.pending.contains(self.pair_index(j, parent))
                        || self.partition.block_size(twin) <= self.partition.block_size(parent)
                    {
                        self.enqueue(j, twin);
                    } else {
                        self.enqueue(j, parent);
                    }
                }
            }
        }

        debug!(
            "refined {} states over {} symbols into {} classes",
            n,
            m,
            self.class_count()
        );
        Ok(())
    }

    /// The representative of the class of `state` in the last processed automaton. The
    /// representative of the class containing the dead state may be the dead state itself.
    pub fn eq_class(&self, state: State) -> Option<State> {
        if state as usize >= self.partition.len() {
            return None;
        }
        Some(self.partition.representative(self.partition.block_of(state)))
    }

    /// The number of classes containing at least one state of the last processed automaton.
    pub fn class_count(&self) -> usize {
        if self.partition.is_empty() {
            return 0;
        }
        let dead = (self.partition.len() - 1) as State;
        let dead_block = self.partition.block_of(dead);
        let count = self.partition.block_count();
        if self.partition.block_size(dead_block) == 1 {
            count - 1
        } else {
            count
        }
    }

    /// Writes the quotient of `dfa` by the computed partition into `out`, which is prepared
    /// afterwards. `dfa` has to be the automaton passed to the last [`Minimizer::process`].
    ///
    /// Classes are numbered in the order of their smallest member. Every transition of `dfa` is
    /// mapped onto the classes, missing transitions stay missing.
    pub fn write_output<D, O>(&self, dfa: &D, out: &mut O) -> Result<(), FaError>
    where
        D: DfaRead + ?Sized,
        O: DfaWrite + ?Sized,
    {
        let max_state = check_dfa_input(dfa)?;
        if self.partition.len() != max_state as usize + 2 {
            return Err(FaError::PreconditionViolation(
                "quotient requested for an automaton that was not processed",
            ));
        }

        let mut ids: Vec<Option<State>> = vec![None; self.partition.block_count()];
        let mut class_of = Vec::with_capacity(max_state as usize + 1);
        let mut next = 0;
        for q in 0..=max_state {
            let slot = &mut ids[self.partition.block_of(q).index()];
            let id = *slot.get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            class_of.push(id);
        }

        out.create();
        out.set_max_iw(dfa.max_iw())?;
        out.set_max_state(next - 1)?;
        if let Some(initial) = dfa.initial() {
            out.set_initial(class_of[initial as usize])?;
        }
        let mut finals: Vec<State> = dfa
            .finals()
            .iter()
            .map(|&q| class_of[q as usize])
            .collect();
        math::sort_dedup(&mut finals);
        out.set_finals(&finals)?;
        for q in 0..=max_state {
            for &a in dfa.iws(q) {
                if let Some(to) = dfa.dest(q, a) {
                    out.set_transition(class_of[q as usize], a, class_of[to as usize])?;
                }
            }
        }
        out.prepare()
    }

    /// Processes `dfa` and writes its minimal equivalent into `out`.
    pub fn minimize<D, O>(&mut self, dfa: &D, out: &mut O) -> Result<(), FaError>
    where
        D: DfaRead + ?Sized,
        O: DfaWrite + ?Sized,
    {
        self.process(dfa)?;
        self.write_output(dfa, out)
    }

    fn pair_index(&self, k: usize, block: BlockId) -> usize {
        block.index() * self.symbols.len() + k
    }

    fn enqueue(&mut self, k: usize, block: BlockId) {
        let index = self.pair_index(k, block);
        if self.pending.insert(index) {
            self.queue.push((k, block));
        }
    }
}

impl Dfa {
    /// Returns the minimal automaton accepting the same language, see [`Minimizer`].
    pub fn minimize(&self, options: MinimizeOptions) -> Result<Dfa, FaError> {
        let mut out = Dfa::new();
        Minimizer::new(options).minimize(self, &mut out)?;
        Ok(out)
    }
}
