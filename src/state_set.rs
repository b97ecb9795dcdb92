//! Canonicalization of sets of states.
//!
//! Both the subset construction and the epsilon removal need to map a set of states of a source
//! automaton to a single state of the automaton they build. The [`StateSetRegistry`] hands out
//! fresh states for sets it has not seen before and returns the known state otherwise.

use tracing::trace;

use crate::{automaton::State, error::FaError, math};

/// Appends the canonical encoding of `states` to `out`. Every state is written as an unsigned
/// varint with seven payload bits per byte and the high bit marking continuation, which makes the
/// encoding prefix-free, so two sequences are equal iff their encodings are byte-equal.
pub fn encode_state_set(states: &[State], out: &mut Vec<u8>) {
    for &q in states {
        let mut v = q;
        while v >= 0x80 {
            out.push((v as u8 & 0x7f) | 0x80);
            v >>= 7;
        }
        out.push(v as u8);
    }
}

/// Assigns states of a new automaton to sets of states of an old automaton.
///
/// Singleton sets are resolved through a table indexed by the old state, larger sets through a
/// hash map keyed by their canonical encoding (see [`encode_state_set`]). The members of every
/// registered set are kept, sorted and unique, so callers can expand a new state into the old
/// states it stands for.
#[derive(Debug, Clone, Default)]
pub struct StateSetRegistry {
    singletons: Vec<Option<State>>,
    sets: math::Map<Box<[u8]>, State>,
    offsets: Vec<usize>,
    members: Vec<State>,
    max_len: Option<usize>,
    scratch: Vec<State>,
    key: Vec<u8>,
}

impl StateSetRegistry {
    /// Creates an empty registry without a limit on the length of sets.
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            ..Default::default()
        }
    }

    /// Creates an empty registry which refuses sets with more than `max_len` distinct states.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::new()
        }
    }

    /// The number of registered sets, which is also the next state that will be handed out.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns `true` if no set has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets all registered sets, the length limit is kept.
    pub fn clear(&mut self) {
        self.singletons.clear();
        self.sets.clear();
        self.offsets.clear();
        self.offsets.push(0);
        self.members.clear();
    }

    /// The sorted, unique old states that `state` stands for.
    pub fn states(&self, state: State) -> Option<&[State]> {
        let i = state as usize;
        if i >= self.len() {
            return None;
        }
        Some(&self.members[self.offsets[i]..self.offsets[i + 1]])
    }

    /// Registers the set of old states `states`, which may be unsorted and contain duplicates.
    /// Returns the assigned state and whether it was newly created.
    pub fn add(&mut self, states: &[State]) -> Result<(State, bool), FaError> {
        self.canonicalize(states)?;

        if let [q] = self.scratch[..] {
            let slot = q as usize;
            if slot >= self.singletons.len() {
                self.singletons.resize(slot + 1, None);
            }
            if let Some(known) = self.singletons[slot] {
                return Ok((known, false));
            }
            let id = self.push_members();
            self.singletons[slot] = Some(id);
            return Ok((id, true));
        }

        self.key.clear();
        encode_state_set(&self.scratch, &mut self.key);
        if let Some(&known) = self.sets.get(&self.key[..]) {
            return Ok((known, false));
        }
        let id = self.push_members();
        self.sets.insert(self.key.clone().into_boxed_slice(), id);
        trace!("registered state set {:?} as {id}", self.scratch);
        Ok((id, true))
    }

    /// Looks up the state assigned to `states` without registering it.
    pub fn get(&mut self, states: &[State]) -> Option<State> {
        self.canonicalize(states).ok()?;
        if let [q] = self.scratch[..] {
            return self.singletons.get(q as usize).copied().flatten();
        }
        self.key.clear();
        encode_state_set(&self.scratch, &mut self.key);
        self.sets.get(&self.key[..]).copied()
    }

    /// Copies `states` into the scratch buffer in canonical form and enforces the length limit.
    fn canonicalize(&mut self, states: &[State]) -> Result<(), FaError> {
        if states.is_empty() {
            return Err(FaError::PreconditionViolation(
                "the empty state set cannot be registered",
            ));
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(states);
        if !math::is_strictly_sorted(&self.scratch) {
            math::sort_dedup(&mut self.scratch);
        }
        if let Some(max) = self.max_len {
            if self.scratch.len() > max {
                return Err(FaError::LimitExceeded {
                    what: "state set",
                    len: self.scratch.len(),
                    max,
                });
            }
        }
        Ok(())
    }

    fn push_members(&mut self) -> State {
        let id = self.len() as State;
        self.members.extend_from_slice(&self.scratch);
        self.offsets.push(self.members.len());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_prefix_free() {
        let mut a = Vec::new();
        encode_state_set(&[1, 300], &mut a);
        let mut b = Vec::new();
        encode_state_set(&[1, 44, 2], &mut b);
        assert_ne!(a, b);
        assert_eq!(a, vec![1, 0xac, 0x02]);

        let mut c = Vec::new();
        encode_state_set(&[u32::MAX], &mut c);
        assert_eq!(c.len(), 5);
    }

    #[test]
    fn canonical_sets_share_a_state() {
        let mut reg = StateSetRegistry::new();
        assert_eq!(reg.add(&[3, 1, 3]).unwrap(), (0, true));
        assert_eq!(reg.add(&[1, 3]).unwrap(), (0, false));
        assert_eq!(reg.add(&[7]).unwrap(), (1, true));
        assert_eq!(reg.add(&[7, 7]).unwrap(), (1, false));
        assert_eq!(reg.add(&[1, 3, 7]).unwrap(), (2, true));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.states(0), Some(&[1, 3][..]));
        assert_eq!(reg.states(1), Some(&[7][..]));
        assert_eq!(reg.states(3), None);
        assert_eq!(reg.get(&[3, 7, 1]), Some(2));
        assert_eq!(reg.get(&[2]), None);
        assert_eq!(reg.get(&[1, 2]), None);
    }

    #[test]
    fn distinct_sets_do_not_collide() {
        let mut reg = StateSetRegistry::new();
        let sets: Vec<Vec<State>> = vec![
            vec![0],
            vec![128],
            vec![0, 128],
            vec![1, 0],
            vec![0, 1, 128],
            vec![16384],
            vec![127, 1],
        ];
        let ids: Vec<_> = sets.iter().map(|s| reg.add(s).unwrap()).collect();
        assert!(ids.iter().all(|(_, new)| *new));
        let mut plain: Vec<_> = ids.iter().map(|(id, _)| *id).collect();
        plain.dedup();
        assert_eq!(plain.len(), sets.len());
    }

    #[test]
    fn limits_and_empty_sets() {
        let mut reg = StateSetRegistry::with_max_len(2);
        assert!(reg.add(&[1, 2, 2, 1]).is_ok());
        assert_eq!(
            reg.add(&[1, 2, 3]),
            Err(FaError::LimitExceeded {
                what: "state set",
                len: 3,
                max: 2
            })
        );
        assert!(matches!(
            reg.add(&[]),
            Err(FaError::PreconditionViolation(_))
        ));
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.add(&[2, 1]).unwrap(), (0, true));
    }
}
