use bit_set::BitSet;
use tracing::trace;

use crate::{
    automaton::{check_nfa_input, NfaRead, NfaWrite, State},
    error::FaError,
};

/// Copies the part of `input` that is reachable from its initial states into `output`, which is
/// prepared afterwards. Surviving states keep their relative order and are renumbered densely.
///
/// Returns the renaming, i.e. for each state of `input` its state in `output` if it survived.
pub fn remove_unreachable<I, O>(input: &I, output: &mut O) -> Result<Vec<Option<State>>, FaError>
where
    I: NfaRead + ?Sized,
    O: NfaWrite + ?Sized,
{
    let max_state = check_nfa_input(input)?;
    let size = max_state as usize + 1;

    let mut reachable = BitSet::with_capacity(size);
    let mut stack: Vec<State> = Vec::new();
    for &q in input.initials() {
        if reachable.insert(q as usize) {
            stack.push(q);
        }
    }
    while let Some(q) = stack.pop() {
        for &iw in input.iws(q) {
            for &p in input.dest(q, iw) {
                if reachable.insert(p as usize) {
                    stack.push(p);
                }
            }
        }
    }

    let mut rename = vec![None; size];
    let mut next: State = 0;
    for q in reachable.iter() {
        rename[q] = Some(next);
        next += 1;
    }
    trace!(
        "reachability sweep keeps {} of {} states",
        reachable.len(),
        size
    );

    output.create();
    output.set_max_iw(input.max_iw())?;
    if next > 0 {
        output.set_max_state(next - 1)?;
    }
    let map = |states: &[State]| -> Vec<State> {
        states.iter().filter_map(|&q| rename[q as usize]).collect()
    };
    output.set_initials(&map(input.initials()))?;
    output.set_finals(&map(input.finals()))?;

    let mut dests = Vec::new();
    for (q, from) in rename
        .iter()
        .enumerate()
        .filter_map(|(q, r)| r.map(|r| (q, r)))
    {
        for &iw in input.iws(q as State) {
            dests.clear();
            dests.extend(input.dest(q as State, iw).iter().filter_map(|&p| rename[p as usize]));
            output.set_transition(from, iw, &dests)?;
        }
    }
    output.prepare()?;
    Ok(rename)
}

#[cfg(test)]
mod tests {
    use super::remove_unreachable;
    use crate::prelude::*;

    #[test]
    fn drops_unreachable_states() {
        let nfa = NfaBuilder::default()
            .with_initials([1])
            .with_finals([0, 3])
            .with_edges([(0, 1, 1), (1, 2, 3), (3, 2, 1), (2, 1, 3)])
            .into_nfa()
            .unwrap();
        let mut out = Nfa::new();
        let rename = remove_unreachable(&nfa, &mut out).unwrap();
        assert_eq!(rename, vec![None, Some(0), None, Some(1)]);
        assert_eq!(out.max_state(), Some(1));
        assert_eq!(out.initials(), &[0]);
        assert_eq!(out.finals(), &[1]);
        assert_eq!(out.dest(0, 2), &[1]);
        assert_eq!(out.dest(1, 2), &[0]);
    }

    #[test]
    fn nothing_reachable_without_initials() {
        let nfa = NfaBuilder::default()
            .with_edges([(0, 1, 1)])
            .into_nfa()
            .unwrap();
        let mut out = Nfa::new();
        remove_unreachable(&nfa, &mut out).unwrap();
        assert_eq!(out.max_state(), None);
    }
}
