use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{
    automaton::{check_nfa_input, reachability::remove_unreachable, Nfa, NfaRead, NfaWrite, State, Symbol},
    error::FaError,
    math,
};

/// Configures the [`EpsilonRemover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpsilonOptions {
    /// The symbol marking epsilon transitions.
    pub epsilon: Symbol,
    /// The wildcard symbol, transitions on it are taken for every symbol a state has no explicit
    /// transition on.
    pub any: Option<Symbol>,
}

impl EpsilonOptions {
    /// Options that remove transitions on `epsilon` and know no wildcard.
    pub fn new(epsilon: Symbol) -> Self {
        Self { epsilon, any: None }
    }

    /// Designates the wildcard symbol.
    pub fn with_any(mut self, any: Symbol) -> Self {
        self.any = Some(any);
        self
    }
}

/// The subgraph of an automaton consisting of its epsilon transitions only. Nodes are the states
/// of the automaton, the destinations of every node are kept sorted and unique.
#[derive(Debug, Clone, Default)]
pub struct EpsilonGraph {
    dst: Vec<Vec<State>>,
}

impl EpsilonGraph {
    /// Creates a graph with `size` nodes and no edges.
    pub fn with_size(size: usize) -> Self {
        Self {
            dst: vec![Vec::new(); size],
        }
    }

    /// The number of nodes.
    pub fn size(&self) -> usize {
        self.dst.len()
    }

    /// The destinations of `node`.
    pub fn dst_nodes(&self, node: State) -> &[State] {
        match self.dst.get(node as usize) {
            Some(dst) => dst,
            None => &[],
        }
    }

    /// Replaces the destinations of `node`.
    pub fn set_dst_nodes(&mut self, node: State, mut dst: Vec<State>) {
        math::sort_dedup(&mut dst);
        self.dst[node as usize] = dst;
    }

    /// Returns `true` if the graph has at least one edge.
    pub fn has_edges(&self) -> bool {
        self.dst.iter().any(|d| !d.is_empty())
    }

    /// Computes an order of the nodes in which every node comes after all of its destinations,
    /// using an explicit stack instead of recursion. Fails if the graph has a cycle.
    pub fn reverse_topological_order(&self) -> Result<Vec<State>, FaError> {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        let mut color = vec![WHITE; self.size()];
        let mut order = Vec::with_capacity(self.size());
        let mut stack: Vec<(State, usize)> = Vec::new();

        for root in 0..self.size() as State {
            if color[root as usize] != WHITE {
                continue;
            }
            color[root as usize] = GRAY;
            stack.push((root, 0));

            while let Some((node, pos)) = stack.last_mut() {
                let node = *node;
                let successors = self.dst_nodes(node);
                if let Some(&next) = successors.get(*pos) {
                    *pos += 1;
                    match color[next as usize] {
                        WHITE => {
                            color[next as usize] = GRAY;
                            stack.push((next, 0));
                        }
                        GRAY => return Err(FaError::EpsilonCycle { state: next }),
                        _ => {}
                    }
                } else {
                    color[node as usize] = BLACK;
                    order.push(node);
                    stack.pop();
                }
            }
        }
        Ok(order)
    }

    /// Replaces the destinations of every node by all nodes reachable from it through at least
    /// one edge. Fails if the graph has a cycle.
    pub fn transitive_closure(&mut self) -> Result<(), FaError> {
        let order = self.reverse_topological_order()?;
        let mut closure = Vec::new();
        for node in order {
            closure.clear();
            for &succ in self.dst_nodes(node) {
                closure.push(succ);
                // successors come earlier in the order, so their closure is final already
                closure.extend_from_slice(self.dst_nodes(succ));
            }
            self.set_dst_nodes(node, closure.clone());
        }
        Ok(())
    }
}

/// Removes epsilon transitions from a non-deterministic automaton while preserving its
/// language.
///
/// Every state receives the transitions and the finality of all states in its epsilon closure.
/// If a wildcard symbol is configured, a state of the closure that has a wildcard transition
/// but no explicit transition on some symbol `a` also contributes its wildcard destinations to
/// `a`, as it would have followed them when reading `a`. Afterwards, states that are not
/// reachable from the initial states are dropped.
#[derive(Debug, Clone)]
pub struct EpsilonRemover {
    options: EpsilonOptions,
    graph: EpsilonGraph,
}

impl EpsilonRemover {
    /// Creates a remover with the given options.
    pub fn new(options: EpsilonOptions) -> Self {
        Self {
            options,
            graph: EpsilonGraph::default(),
        }
    }

    /// The options this remover runs with.
    pub fn options(&self) -> &EpsilonOptions {
        &self.options
    }

    /// The states reachable from `state` of the last processed input through one or more
    /// epsilon transitions.
    pub fn closure(&self, state: State) -> &[State] {
        self.graph.dst_nodes(state)
    }

    /// Releases the closure computed by the last run.
    pub fn clear(&mut self) {
        self.graph = EpsilonGraph::default();
    }

    /// Writes an automaton without epsilon transitions that accepts the same language as `input`
    /// into `output`, which is prepared afterwards.
    pub fn process<I, O>(&mut self, input: &I, output: &mut O) -> Result<(), FaError>
    where
        I: NfaRead + ?Sized,
        O: NfaWrite + ?Sized,
    {
        let max_state = check_nfa_input(input)?;
        let epsilon = self.options.epsilon;
        let any = self.options.any.filter(|&a| a != epsilon);

        let mut copy = Nfa::new();
        copy.set_max_state(max_state)?;
        copy.set_max_iw(input.max_iw())?;
        copy.set_initials(input.initials())?;

        self.graph = EpsilonGraph::with_size(max_state as usize + 1);
        for q in 0..=max_state {
            for &iw in input.iws(q) {
                let dest = input.dest(q, iw);
                if iw == epsilon {
                    let dst: Vec<State> = dest.iter().copied().filter(|&p| p != q).collect();
                    trace!("state {q} has epsilon transitions to {dst:?}");
                    self.graph.set_dst_nodes(q, dst);
                } else {
                    copy.set_transition(q, iw, dest)?;
                }
            }
        }

        if !self.graph.has_edges() {
            debug!("no epsilon transitions found, only removing unreachable states");
            copy.set_finals(input.finals())?;
            copy.prepare()?;
            remove_unreachable(&copy, output)?;
            return Ok(());
        }

        self.graph.transitive_closure()?;

        let mut finals = input.finals().to_vec();
        let mut acc: BTreeMap<Symbol, Vec<State>> = BTreeMap::new();
        let mut members: Vec<State> = Vec::new();
        let mut with_closure = 0usize;
        for q in 0..=max_state {
            let closure = self.graph.dst_nodes(q);
            if closure.is_empty() {
                continue;
            }
            with_closure += 1;
            if closure.iter().any(|&r| input.is_final(r)) {
                finals.push(q);
            }

            acc.clear();
            members.clear();
            members.push(q);
            members.extend_from_slice(closure);
            for &r in &members {
                for &iw in input.iws(r) {
                    if iw != epsilon {
                        acc.entry(iw).or_default().extend_from_slice(input.dest(r, iw));
                    }
                }
            }

            if let Some(any) = any {
                if acc.contains_key(&any) {
                    for (&iw, dest) in acc.iter_mut() {
                        if iw == any {
                            continue;
                        }
                        for &r in &members {
                            let iws = input.iws(r);
                            if iws.binary_search(&iw).is_err() && iws.binary_search(&any).is_ok() {
                                dest.extend_from_slice(input.dest(r, any));
                            }
                        }
                    }
                }
            }

            for (&iw, dest) in acc.iter() {
                copy.set_transition(q, iw, dest)?;
            }
        }
        debug!(
            "rewrote transitions of {with_closure} states with non-trivial epsilon closure, {} states total",
            max_state as usize + 1
        );

        copy.set_finals(&finals)?;
        copy.prepare()?;
        remove_unreachable(&copy, output)?;
        Ok(())
    }
}

impl Nfa {
    /// Returns an equivalent automaton without epsilon transitions, see [`EpsilonRemover`].
    pub fn remove_epsilon(&self, options: EpsilonOptions) -> Result<Nfa, FaError> {
        let mut out = Nfa::new();
        EpsilonRemover::new(options).process(self, &mut out)?;
        Ok(out)
    }
}
