use alloy_eips::BlockNumHash;
use alloy_primitives::B256;
use std::collections::VecDeque;

/// The hashes of the most recently stored blocks, oldest first and contiguous by number.
#[derive(Debug, Clone)]
pub struct RecentBlocks {
    capacity: usize,
    blocks: VecDeque<BlockNumHash>,
}

impl RecentBlocks {
    /// Creates an empty window holding up to `capacity` blocks.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, blocks: VecDeque::with_capacity(capacity) }
    }

    /// Appends a stored block. A block that does not follow the newest one restarts the window.
    pub fn push(&mut self, block: BlockNumHash) {
        if self.capacity == 0 {
            return;
        }
        if self.blocks.back().is_some_and(|last| last.number + 1 != block.number) {
            self.blocks.clear();
        }
        if self.blocks.len() == self.capacity {
            self.blocks.pop_front();
        }
        self.blocks.push_back(block);
    }

    /// Returns the hash of the block at `number`, if it is in the window.
    pub fn hash_of(&self, number: u64) -> Option<B256> {
        let first = self.blocks.front()?.number;
        let index = usize::try_from(number.checked_sub(first)?).ok()?;
        self.blocks.get(index).map(|block| block.hash)
    }

    /// Drops every block with `number >= from`.
    pub fn truncate_from(&mut self, from: u64) {
        while self.blocks.back().is_some_and(|last| last.number >= from) {
            self.blocks.pop_back();
        }
    }

    /// The newest block in the window.
    pub fn latest(&self) -> Option<BlockNumHash> {
        self.blocks.back().copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }
}
