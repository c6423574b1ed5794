//! Incremental Merkle tree over coin commitments
//!
//! The accumulator every ledger observer maintains: commitments are appended
//! left to right into a fixed-depth SHA-256 tree, and a pour proves
//! membership against one of its roots. Unfilled leaves count as all-zero,
//! and two all-zero children hash to the all-zero parent, so the
//! empty-subtree hash is the zero value at every depth.
//!
//! Interior nodes are cached per level in a flat arena; [`prune`] drops
//! everything except the frontier needed to keep appending, which is also
//! exactly the content of the serializable compact form.
//!
//! [`prune`]: IncrementalMerkleTree::prune

use log::trace;

use crate::bits::{bits_to_u64, count_ones, u64_to_bits};
use crate::crypto::hash::{merkle_node_hash, EMPTY_NODE};
use crate::encoding::ByteReader;
use crate::error::{ZerocashError, ZerocashResult};
use crate::{H_SIZE, MAX_TREE_DEPTH};

/// Cached node hashes of one tree level.
///
/// `nodes[i]` holds the node at position `offset + i`; positions below
/// `offset` were discarded by pruning, positions past the end are empty.
#[derive(Clone, Debug, Default)]
struct Level {
    offset: u64,
    nodes: Vec<[u8; H_SIZE]>,
}

/// Append-only commitment accumulator.
#[derive(Clone, Debug)]
pub struct IncrementalMerkleTree {
    depth: usize,
    next_index: u64,
    root: [u8; H_SIZE],
    /// `levels[d]` holds nodes at height `d`; leaves are height 0, the two
    /// children of the root are height `depth - 1`.
    levels: Vec<Level>,
}

impl IncrementalMerkleTree {
    /// Create an empty tree of the given depth (`1..=64`).
    pub fn new(depth: usize) -> ZerocashResult<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(ZerocashError::TreeDepthOutOfRange(depth));
        }
        Ok(Self {
            depth,
            next_index: 0,
            root: EMPTY_NODE,
            levels: vec![Level::default(); depth],
        })
    }

    /// Create a tree and append `leaves` in order.
    pub fn with_leaves(leaves: &[[u8; H_SIZE]], depth: usize) -> ZerocashResult<Self> {
        let mut tree = Self::new(depth)?;
        tree.insert_batch(leaves)?;
        Ok(tree)
    }

    /// Restore a tree from its compact form. Witnesses for leaves inserted
    /// before the snapshot are not available; the root and all future
    /// insertions are.
    pub fn from_compact(compact: &IncrementalMerkleTreeCompact) -> ZerocashResult<Self> {
        let depth = compact.tree_depth();
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(ZerocashError::TreeDepthOutOfRange(depth));
        }
        if depth < MAX_TREE_DEPTH && compact.next_index >= 1u64 << depth {
            return Err(ZerocashError::TreeFull);
        }

        let expected = count_ones(&compact.path_bits());
        if compact.hashes.len() != expected {
            return Err(ZerocashError::InvalidLength {
                what: "compact tree hash list",
                expected: expected * H_SIZE,
                actual: compact.hashes.len() * H_SIZE,
            });
        }

        // The hash list is ordered root side first.
        let mut levels_rev = Vec::with_capacity(depth);
        let mut hashes = compact.hashes.iter();
        for d in (0..depth).rev() {
            let pos = compact.next_index >> d;
            if pos & 1 == 1 {
                levels_rev.push(Level {
                    offset: pos - 1,
                    nodes: vec![*hashes.next().expect("length checked above")],
                });
            } else {
                levels_rev.push(Level {
                    offset: pos,
                    nodes: Vec::new(),
                });
            }
        }
        levels_rev.reverse();

        let mut tree = Self {
            depth,
            next_index: compact.next_index,
            root: EMPTY_NODE,
            levels: levels_rev,
        };
        tree.root = tree.frontier_root();
        Ok(tree)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaves inserted so far.
    pub fn leaf_count(&self) -> u64 {
        self.next_index
    }

    /// The current root, with unfilled leaves counting as all-zero.
    pub fn root(&self) -> [u8; H_SIZE] {
        self.root
    }

    /// The MSB-first (root-side-first) path bits of a leaf index.
    pub fn index_bits(&self, index: u64) -> Vec<bool> {
        u64_to_bits(index, self.depth)
    }

    fn is_full(&self) -> bool {
        if self.depth == MAX_TREE_DEPTH {
            self.next_index == u64::MAX
        } else {
            self.next_index == 1u64 << self.depth
        }
    }

    fn remaining_capacity(&self) -> u64 {
        if self.depth == MAX_TREE_DEPTH {
            u64::MAX - self.next_index
        } else {
            (1u64 << self.depth) - self.next_index
        }
    }

    fn stored(&self, height: usize, pos: u64) -> Option<[u8; H_SIZE]> {
        let level = &self.levels[height];
        if pos < level.offset {
            return None;
        }
        level.nodes.get((pos - level.offset) as usize).copied()
    }

    fn is_pruned(&self, height: usize, pos: u64) -> bool {
        pos < self.levels[height].offset
    }

    fn store(&mut self, height: usize, pos: u64, value: [u8; H_SIZE]) {
        let level = &mut self.levels[height];
        debug_assert!(pos >= level.offset, "write below the pruned frontier");
        let rel = (pos - level.offset) as usize;
        if rel < level.nodes.len() {
            level.nodes[rel] = value;
        } else {
            debug_assert_eq!(rel, level.nodes.len(), "non-contiguous level write");
            level.nodes.push(value);
        }
    }

    /// Append a leaf at the next free slot and return its index.
    pub fn insert(&mut self, leaf: [u8; H_SIZE]) -> ZerocashResult<u64> {
        if self.is_full() {
            return Err(ZerocashError::TreeFull);
        }
        let index = self.next_index;
        self.store(0, index, leaf);

        let mut current = leaf;
        let mut pos = index;
        for height in 0..self.depth {
            let sibling = self.stored(height, pos ^ 1).unwrap_or(EMPTY_NODE);
            current = if pos & 1 == 1 {
                merkle_node_hash(&sibling, &current)
            } else {
                merkle_node_hash(&current, &sibling)
            };
            pos >>= 1;
            if height + 1 < self.depth {
                self.store(height + 1, pos, current);
            }
        }

        self.root = current;
        self.next_index = index + 1;
        Ok(index)
    }

    /// Append a batch of leaves. On overflow nothing is inserted and the
    /// root is unchanged.
    pub fn insert_batch(&mut self, leaves: &[[u8; H_SIZE]]) -> ZerocashResult<()> {
        if leaves.len() as u64 > self.remaining_capacity() {
            return Err(ZerocashError::TreeFull);
        }
        for leaf in leaves {
            self.insert(*leaf)?;
        }
        Ok(())
    }

    /// Root recomputed by walking the insertion frontier; used when no
    /// cached root exists yet (restoring from a compact snapshot).
    fn frontier_root(&self) -> [u8; H_SIZE] {
        let mut current = EMPTY_NODE;
        let mut pos = self.next_index;
        for height in 0..self.depth {
            current = if pos & 1 == 1 {
                let sibling = self.stored(height, pos - 1).unwrap_or(EMPTY_NODE);
                merkle_node_hash(&sibling, &current)
            } else {
                // The right sibling of the insertion path is always empty.
                merkle_node_hash(&current, &EMPTY_NODE)
            };
            pos >>= 1;
        }
        current
    }

    /// The authentication path of an inserted leaf: `depth` sibling hashes,
    /// root-side sibling first. Siblings in empty regions are the
    /// conventional all-zero empty-subtree hashes.
    pub fn witness(&self, index: u64) -> ZerocashResult<Vec<[u8; H_SIZE]>> {
        if index >= self.next_index {
            return Err(ZerocashError::LeafNotPresent(index));
        }

        let mut path = Vec::with_capacity(self.depth);
        let mut pos = index;
        for height in 0..self.depth {
            let sibling_pos = pos ^ 1;
            if self.is_pruned(height, sibling_pos) {
                return Err(ZerocashError::WitnessPruned(index));
            }
            path.push(self.stored(height, sibling_pos).unwrap_or(EMPTY_NODE));
            pos >>= 1;
        }
        path.reverse();
        Ok(path)
    }

    /// Discard every cached node not needed to compute the root, continue
    /// insertions, or witness leaves inserted from now on. Witnesses for
    /// already-inserted leaves generally become unavailable; the root is
    /// unchanged.
    pub fn prune(&mut self) {
        let mut discarded = 0usize;
        for height in 0..self.depth {
            let pos = self.next_index >> height;
            let level = &mut self.levels[height];
            if pos & 1 == 1 {
                let keep_pos = pos - 1;
                let rel = (keep_pos - level.offset) as usize;
                if rel < level.nodes.len() {
                    let kept = level.nodes[rel];
                    discarded += level.nodes.len() - 1;
                    level.offset = keep_pos;
                    level.nodes = vec![kept];
                }
            } else {
                discarded += level.nodes.len();
                level.offset = pos;
                level.nodes.clear();
            }
        }
        trace!("pruned {discarded} interior nodes from commitment tree");
    }

    /// The minimal state needed to keep appending: the next insertion index
    /// and one hash per `1` bit of its path.
    pub fn compact(&self) -> ZerocashResult<IncrementalMerkleTreeCompact> {
        if self.is_full() {
            return Err(ZerocashError::TreeFull);
        }

        let mut hashes = Vec::new();
        for height in (0..self.depth).rev() {
            let pos = self.next_index >> height;
            if pos & 1 == 1 {
                hashes.push(self.stored(height, pos - 1).unwrap_or(EMPTY_NODE));
            }
        }
        Ok(IncrementalMerkleTreeCompact {
            depth: self.depth,
            next_index: self.next_index,
            hashes,
        })
    }
}

/// Check a leaf's authentication path against a root.
///
/// `path` is ordered root-side sibling first, as produced by
/// [`IncrementalMerkleTree::witness`].
pub fn verify_witness(
    leaf: &[u8; H_SIZE],
    index: u64,
    path: &[[u8; H_SIZE]],
    root: &[u8; H_SIZE],
) -> bool {
    let depth = path.len();
    let mut current = *leaf;
    for height in 0..depth {
        let sibling = &path[depth - 1 - height];
        current = if (index >> height) & 1 == 1 {
            merkle_node_hash(sibling, &current)
        } else {
            merkle_node_hash(&current, sibling)
        };
    }
    current == *root
}

/// Serializable snapshot of an [`IncrementalMerkleTree`] insertion frontier.
///
/// Wire form: one depth byte, `ceil(depth / 8)` bytes of the next-insertion
/// path (MSB-first bit packing, root-side bit at the MSB of the first byte),
/// then one 32-byte hash per set path bit in root-to-leaf order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IncrementalMerkleTreeCompact {
    depth: usize,
    next_index: u64,
    hashes: Vec<[u8; H_SIZE]>,
}

impl IncrementalMerkleTreeCompact {
    pub fn tree_depth(&self) -> usize {
        self.depth
    }

    /// Index of the next insertion slot.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Frontier hashes, root-side first.
    pub fn hashes(&self) -> &[[u8; H_SIZE]] {
        &self.hashes
    }

    /// The next-insertion index as a depth-bit path, MSB at the root.
    pub fn path_bits(&self) -> Vec<bool> {
        u64_to_bits(self.next_index, self.depth)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let bits = self.path_bits();
        let mut packed = vec![0u8; (self.depth + 7) / 8];
        for (i, bit) in bits.iter().enumerate() {
            if *bit {
                packed[i / 8] |= 0x80 >> (i % 8);
            }
        }

        let mut out = Vec::with_capacity(1 + packed.len() + self.hashes.len() * H_SIZE);
        out.push(self.depth as u8);
        out.extend_from_slice(&packed);
        for hash in &self.hashes {
            out.extend_from_slice(hash);
        }
        out
    }

    pub fn deserialize(bytes: &[u8]) -> ZerocashResult<Self> {
        let mut reader = ByteReader::new(bytes, "compact tree");
        let depth = reader.take(1)?[0] as usize;
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(ZerocashError::TreeDepthOutOfRange(depth));
        }

        let packed = reader.take((depth + 7) / 8)?;
        let mut bits = Vec::with_capacity(depth);
        for i in 0..depth {
            bits.push(packed[i / 8] & (0x80 >> (i % 8)) != 0);
        }
        let next_index = bits_to_u64(&bits);

        let mut hashes = Vec::with_capacity(count_ones(&bits));
        for _ in 0..count_ones(&bits) {
            hashes.push(reader.take_array::<H_SIZE>()?);
        }
        reader.finish()?;

        Ok(Self {
            depth,
            next_index,
            hashes,
        })
    }
}
