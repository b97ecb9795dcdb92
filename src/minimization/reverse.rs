use crate::automaton::State;

/// The inverse of a total transition function. For every target state and symbol index it lists
/// the states that move to the target on that symbol.
#[derive(Debug, Clone, Default)]
pub struct ReverseDelta {
    symbols: usize,
    offsets: Vec<usize>,
    sources: Vec<State>,
}

impl ReverseDelta {
    /// Inverts `delta`, where `delta[s * symbols + k]` is the successor of state `s` on the
    /// symbol with index `k`, for all states `0..size`.
    pub fn new(delta: &[State], size: usize, symbols: usize) -> Self {
        debug_assert_eq!(delta.len(), size * symbols);
        let slot = |target: State, k: usize| target as usize * symbols + k;

        let mut offsets = vec![0usize; size * symbols + 1];
        for (i, &target) in delta.iter().enumerate() {
            offsets[slot(target, i % symbols) + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let mut fill = offsets.clone();
        let mut sources = vec![0; delta.len()];
        for (i, &target) in delta.iter().enumerate() {
            let pos = &mut fill[slot(target, i % symbols)];
            sources[*pos] = (i / symbols) as State;
            *pos += 1;
        }

        Self {
            symbols,
            offsets,
            sources,
        }
    }

    /// The states moving to `target` on the symbol with index `k`.
    pub fn sources(&self, target: State, k: usize) -> &[State] {
        let i = target as usize * self.symbols + k;
        &self.sources[self.offsets[i]..self.offsets[i + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::ReverseDelta;

    #[test]
    fn inverts_delta() {
        // three states, two symbols
        let delta = [1, 2, 1, 0, 2, 2];
        let rev = ReverseDelta::new(&delta, 3, 2);
        assert_eq!(rev.sources(1, 0), &[0, 1]);
        assert_eq!(rev.sources(2, 1), &[0, 2]);
        assert_eq!(rev.sources(0, 1), &[1]);
        assert_eq!(rev.sources(2, 0), &[2]);
        assert!(rev.sources(0, 0).is_empty());
    }
}
