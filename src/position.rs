/// A moment in both coordinate systems: `phys` is the byte offset within the
/// underlying store, `virt` the offset within the logical (decompressed)
/// stream. Positions recorded in temporal order are non-decreasing in both
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub phys: u64,
    pub virt: u64,
}

impl Position {
    /// Start of the stream in both coordinate systems. Also the implicit
    /// checkpoint every stream has even before anything is indexed.
    pub const ORIGIN: Position = Position { phys: 0, virt: 0 };
}

/// Append-only index of chunk-start checkpoints, strictly increasing in
/// physical offset and therefore non-decreasing in virtual offset. Built
/// lazily as chunk starts are observed; never rewritten.
#[derive(Debug, Default)]
pub struct CheckpointIndex {
    entries: Vec<Position>,
}

impl CheckpointIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a chunk-start checkpoint. Ignored unless the physical offset
    /// strictly exceeds the last recorded one, which keeps the index sorted
    /// and free of duplicates when the same chunk is re-read after a seek.
    pub fn record(&mut self, checkpoint: Position) {
        match self.entries.last() {
            Some(last) if checkpoint.phys <= last.phys => {}
            _ => self.entries.push(checkpoint),
        }
    }

    /// Resolve a target virtual offset to the checkpoint with the largest
    /// virtual coordinate not exceeding it, falling back to the implicit
    /// origin when no recorded checkpoint qualifies.
    pub fn resolve(&self, virt: u64) -> Position {
        let i = self.entries.partition_point(|entry| entry.virt <= virt);
        if i == 0 {
            Position::ORIGIN
        } else {
            self.entries[i - 1]
        }
    }
}
