//! Checkpointable stack
//!
//! The stack is an arena of blocks, each linked to the block beneath it. A
//! [`Checkpoint`] is the pair `(index, limit)`: the top block at save time and
//! the high-water mark below which blocks must not be overwritten. Saving
//! raises the live limit, so a path that pops past a checkpoint and then
//! pushes again writes above the limit and leaves the saved blocks intact.
//! Restoring is O(1) and never releases backing storage.

/// Saved extent of a [`Stack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    index: isize,
    limit: isize,
}

#[derive(Debug, Clone)]
struct Block<T> {
    value: T,
    /// Index of the block beneath this one, -1 for the bottom
    next: isize,
    /// Number of blocks in the chain ending here
    depth: usize,
}

/// Stack with O(1) save and restore
#[derive(Debug, Clone)]
pub struct Stack<T> {
    data: Vec<Block<T>>,
    index: isize,
    limit: isize,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: Clone + Default> Stack<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> Stack<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            index: -1,
            limit: -1,
        }
    }

    /// Push a value above both the current top and the checkpoint limit.
    pub fn push(&mut self, value: T) {
        let block = Block {
            value,
            next: self.index,
            depth: self.len() + 1,
        };
        let i = self.index.max(self.limit) + 1;
        self.index = i;
        let i = i as usize;
        if i < self.data.len() {
            self.data[i] = block;
        } else {
            self.data.push(block);
        }
    }

    /// Top value, if any.
    pub fn top(&self) -> Option<&T> {
        self.current().map(|block| &block.value)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index < 0
    }

    /// Logical depth of the stack.
    pub fn len(&self) -> usize {
        self.current().map_or(0, |block| block.depth)
    }

    /// Allocated blocks, including ones only reachable from checkpoints.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Record the current extent and protect it from later pushes.
    pub fn save(&mut self) -> Checkpoint {
        let checkpoint = Checkpoint {
            index: self.index,
            limit: self.limit,
        };
        if self.index > self.limit {
            self.limit = self.index;
        }
        checkpoint
    }

    /// Roll back to a checkpoint. Idempotent.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.index = checkpoint.index;
        self.limit = checkpoint.limit;
    }

    /// Search from the top down for the first value matching `pred`.
    pub fn lookup(&self, mut pred: impl FnMut(&T) -> bool) -> Option<&T> {
        let mut i = self.index;
        while i >= 0 {
            let block = &self.data[i as usize];
            if pred(&block.value) {
                return Some(&block.value);
            }
            i = block.next;
        }
        None
    }

    /// Values from the top down.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let mut i = self.index;
        std::iter::from_fn(move || {
            if i < 0 {
                return None;
            }
            let block = &self.data[i as usize];
            i = block.next;
            Some(&block.value)
        })
    }

    /// Drop everything, keeping the allocation.
    pub fn reset(&mut self) {
        self.data.clear();
        self.index = -1;
        self.limit = -1;
    }

    fn current(&self) -> Option<&Block<T>> {
        if self.index < 0 {
            None
        } else {
            self.data.get(self.index as usize)
        }
    }
}

impl<T: Clone + Default> Stack<T> {
    /// Pop the top value.
    ///
    /// A block above the limit belongs to the live path alone and is moved
    /// out; at or below the limit a checkpoint still reaches it, so it is cloned.
    pub fn pop(&mut self) -> Option<T> {
        if self.index < 0 {
            return None;
        }
        let owned = self.index > self.limit;
        let block = &mut self.data[self.index as usize];
        let value = if owned {
            std::mem::take(&mut block.value)
        } else {
            block.value.clone()
        };
        self.index = block.next;
        Some(value)
    }
}
