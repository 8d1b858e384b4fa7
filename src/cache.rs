use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use fxhash::FxHasher64;

use crate::board::Board;
use crate::search::Node;

/// Canonical position digest: dimensions, then every snake's index, health
/// and body cells in order, then food and hazards sorted so insertion
/// order cannot split identical positions.
pub fn board_hash(board: &Board) -> u64 {
    let mut hasher = FxHasher64::default();
    board.width.hash(&mut hasher);
    board.height.hash(&mut hasher);

    for (i, snake) in board.snakes.iter().enumerate() {
        i.hash(&mut hasher);
        snake.health.hash(&mut hasher);
        for cell in &snake.body {
            cell.hash(&mut hasher);
        }
    }

    let mut food = board.food.clone();
    food.sort_unstable_by_key(|c| (c.x, c.y));
    for cell in food {
        cell.hash(&mut hasher);
    }

    let mut hazards = board.hazards.clone();
    hazards.sort_unstable_by_key(|c| (c.x, c.y));
    for cell in hazards {
        cell.hash(&mut hasher);
    }

    hasher.finish()
}

/// Sub-trees kept alive between turns of one game, keyed by the canonical
/// hash of their board. Rebuilt after every committed move from the nodes
/// two plies below the root: one ply ahead the opponents' replies are
/// still unknown, two plies ahead is the next position it will be our
/// turn on.
#[derive(Default)]
pub struct TreeCache {
    nodes: DashMap<u64, Arc<Node>>,
}

impl TreeCache {
    pub fn lookup(&self, hash: u64) -> Option<Arc<Node>> {
        self.nodes.get(&hash).map(|node| Arc::clone(node.value()))
    }

    pub fn retain_grandchildren(&self, root: &Node) {
        self.nodes.clear();
        for child in root.children() {
            for grandchild in child.children() {
                self.nodes
                    .insert(board_hash(&grandchild.board), grandchild);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Process-wide per-game buckets, bounded by `/start` and `/end`.
pub type GameCaches = DashMap<String, TreeCache>;
