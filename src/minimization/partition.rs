use crate::automaton::State;

/// Identifies a block of a [`Partition`]. Block ids stay valid for the whole refinement, a split
/// keeps the id for the unmarked part and hands out a fresh id for the marked part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// The position of the block in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Block {
    from: usize,
    size: usize,
    /// Number of marked members, they occupy the last `marked` positions of the block.
    marked: usize,
}

/// A partition of the states `0..size` into blocks.
///
/// All states live in one flat `elements` array in which every block is a contiguous run, `e2i`
/// is the inverse permutation. Marking a state swaps it to the end of the unmarked part of its
/// block, so the marked members form the twin of the block that [`Partition::split_marked`] cuts
/// off. Marking and splitting cost time proportional to the number of marked states.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    elements: Vec<State>,
    e2i: Vec<usize>,
    block_of: Vec<BlockId>,
    blocks: Vec<Block>,
    touched: Vec<BlockId>,
}

impl Partition {
    /// Creates a partition of `0..size` into the states for which `second` does not hold and
    /// those for which it does. Empty blocks are omitted, so the block of the states satisfying
    /// `second` is `BlockId(1)` if both are non-empty.
    pub fn with_two_blocks<F: Fn(State) -> bool>(size: usize, second: F) -> Self {
        let (first_part, second_part): (Vec<State>, Vec<State>) =
            (0..size as State).partition(|&s| !second(s));

        let mut partition = Partition {
            elements: Vec::with_capacity(size),
            e2i: vec![0; size],
            block_of: vec![BlockId(0); size],
            blocks: Vec::with_capacity(2),
            touched: Vec::new(),
        };
        for part in [first_part, second_part] {
            if part.is_empty() {
                continue;
            }
            let id = BlockId(partition.blocks.len());
            partition.blocks.push(Block {
                from: partition.elements.len(),
                size: part.len(),
                marked: 0,
            });
            for s in part {
                partition.e2i[s as usize] = partition.elements.len();
                partition.block_of[s as usize] = id;
                partition.elements.push(s);
            }
        }
        partition
    }

    /// The number of states that are partitioned.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if there are no states.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The block containing `state`.
    pub fn block_of(&self, state: State) -> BlockId {
        self.block_of[state as usize]
    }

    /// The number of members of `block`.
    pub fn block_size(&self, block: BlockId) -> usize {
        self.blocks[block.0].size
    }

    /// The members of `block` in no particular order.
    pub fn members(&self, block: BlockId) -> &[State] {
        let b = &self.blocks[block.0];
        &self.elements[b.from..b.from + b.size]
    }

    /// The canonical representative of `block`, which is the member at its first position.
    pub fn representative(&self, block: BlockId) -> State {
        self.elements[self.blocks[block.0].from]
    }

    /// Marks `state` for the next [`Partition::split_marked`]. Marking a state twice has no
    /// effect.
    pub fn mark(&mut self, state: State) {
        let block = self.block_of[state as usize];
        let Block { from, size, marked } = self.blocks[block.0];
        let pos = self.e2i[state as usize];
        let boundary = from + size - marked;
        if pos >= boundary {
            return;
        }
        if marked == 0 {
            self.touched.push(block);
        }
        let last = boundary - 1;
        let other = self.elements[last];
        self.elements.swap(pos, last);
        self.e2i[other as usize] = pos;
        self.e2i[state as usize] = last;
        self.blocks[block.0].marked += 1;
    }

    /// Splits every block that has marked and unmarked members. The unmarked members keep the
    /// block id, the marked ones move to a new block. Blocks in which every member is marked stay
    /// as they are. Pushes `(block, twin)` for every split onto `splits` and clears all marks.
    pub fn split_marked(&mut self, splits: &mut Vec<(BlockId, BlockId)>) {
        for block in std::mem::take(&mut self.touched) {
            let Block { from, size, marked } = self.blocks[block.0];
            self.blocks[block.0].marked = 0;
            if marked == size {
                continue;
            }
            let twin = BlockId(self.blocks.len());
            let twin_from = from + size - marked;
            self.blocks.push(Block {
                from: twin_from,
                size: marked,
                marked: 0,
            });
            self.blocks[block.0].size = size - marked;
            for &s in &self.elements[twin_from..twin_from + marked] {
                self.block_of[s as usize] = twin;
            }
            splits.push((block, twin));
        }
    }
}
