use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::board::{Board, Cell, Direction};

/// Per-cell result of the ownership sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Reached first by exactly one snake.
    Snake(usize),
    /// Reached by two snakes at the same distance.
    Contested,
    /// No snake can reach the cell.
    Unreached,
}

/// Which snake reaches each cell first, by legal-move distance.
///
/// A multi-source Dijkstra rooted at every living head. Relaxation only
/// enters cells that will be free by the time the path arrives (opponent
/// tails shrink by one segment per step, see `Board::occupied_after`).
/// Equal-distance pops are ordered by insertion so the sweep is
/// deterministic; a cell reached at the same distance by a second snake is
/// demoted to `Contested` and counts for nobody.
#[derive(Debug)]
pub struct OwnershipMap {
    pub owner: Vec<Owner>,
    pub distance: Vec<u32>,
    width: i32,
}

impl OwnershipMap {
    pub fn compute(board: &Board) -> Self {
        let size = (board.width * board.height) as usize;
        let mut owner = vec![Owner::Unreached; size];
        let mut distance = vec![u32::MAX; size];
        let at = |c: Cell| (c.y * board.width + c.x) as usize;

        // (distance, insertion order, snake, cell); Reverse turns the
        // max-heap into the FIFO-stable min-heap the sweep relies on.
        let mut heap = BinaryHeap::new();
        let mut seq = 0u32;
        for (i, snake) in board.snakes.iter().enumerate() {
            if snake.alive() {
                heap.push(Reverse((0u32, seq, i, snake.head().x, snake.head().y)));
                seq += 1;
            }
        }

        while let Some(Reverse((dist, _, snake, x, y))) = heap.pop() {
            let cell = Cell::new(x, y);
            let index = at(cell);

            if dist > distance[index] {
                continue;
            }
            if distance[index] == dist {
                // Second arrival at the claimed distance: a tie unless it
                // is the claimant itself reached along another path.
                if owner[index] != Owner::Snake(snake) {
                    owner[index] = Owner::Contested;
                }
                continue;
            }

            distance[index] = dist;
            owner[index] = Owner::Snake(snake);

            for direction in Direction::ALL {
                let next = cell.step(direction);
                let next_dist = dist + 1;
                if !board.in_bounds(next) || board.occupied_after(next, next_dist) {
                    continue;
                }
                if next_dist <= distance[at(next)] {
                    heap.push(Reverse((next_dist, seq, snake, next.x, next.y)));
                    seq += 1;
                }
            }
        }

        OwnershipMap {
            owner,
            distance,
            width: board.width,
        }
    }

    pub fn owner_of(&self, cell: Cell) -> Owner {
        self.owner[(cell.y * self.width + cell.x) as usize]
    }

    pub fn distance_to(&self, cell: Cell) -> u32 {
        self.distance[(cell.y * self.width + cell.x) as usize]
    }

    /// Cells owned per snake, indexed like `board.snakes`.
    pub fn counts(&self, snake_count: usize) -> Vec<usize> {
        let mut counts = vec![0; snake_count];
        for &owner in &self.owner {
            if let Owner::Snake(i) = owner {
                counts[i] += 1;
            }
        }
        counts
    }
}
