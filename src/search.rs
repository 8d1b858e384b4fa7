use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Instant;

use atomic_float::AtomicF32;
use log::error;

use crate::board::{Board, Direction};
use crate::eval::Evaluator;

pub const EXPLORATION: f32 = std::f32::consts::SQRT_2;

/// One vertex of the search tree: the board after `mover` took `action`.
///
/// Visits and cumulative score are read lock-free during selection; the
/// mutex only covers the expansion window (claiming an untried direction,
/// appending the child) and the first write of the cached static
/// evaluation. Nodes never move once allocated, so the `Arc` references in
/// the children vector and the `Weak` back-pointer stay valid for the whole
/// turn.
pub struct Node {
    pub board: Board,
    /// Snake whose move produced this board; `None` at a fresh root, where
    /// the first snake to act is index 0.
    pub mover: Option<usize>,
    /// The move that created this node, recorded at expansion.
    pub action: Option<Direction>,
    pub parent: Weak<Node>,
    pub visits: AtomicU32,
    pub score: AtomicF32,
    state: Mutex<NodeState>,
}

struct NodeState {
    untried: Vec<Direction>,
    children: Vec<Arc<Node>>,
    static_eval: Option<f32>,
}

impl Node {
    pub fn new_root(board: Board) -> Arc<Node> {
        let untried = move_candidates(&board, None);
        Arc::new(Node {
            board,
            mover: None,
            action: None,
            parent: Weak::new(),
            visits: AtomicU32::new(0),
            score: AtomicF32::new(0.0),
            state: Mutex::new(NodeState {
                untried,
                children: Vec::new(),
                static_eval: None,
            }),
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.board.alive_count() <= 1
    }

    /// Snapshot of the children at this moment.
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.lock_state().children.clone()
    }

    pub fn visit_count(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    pub fn mean_score(&self) -> f32 {
        let visits = self.visits.load(Ordering::Relaxed);
        if visits == 0 {
            0.0
        } else {
            self.score.load(Ordering::Relaxed) / visits as f32
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Legal expansions of a node: the safe moves of the next snake in the
/// round-robin, or all four directions when it has none left so a doomed
/// mover still gets explored instead of pruning the subtree. Terminal
/// positions expand to nothing.
fn move_candidates(board: &Board, mover: Option<usize>) -> Vec<Direction> {
    if board.alive_count() <= 1 {
        return Vec::new();
    }
    let actor = match board.next_mover(mover) {
        Some(actor) => actor,
        None => return Vec::new(),
    };
    let moves = board.safe_moves(actor);
    if moves.is_empty() {
        Direction::ALL.to_vec()
    } else {
        moves
    }
}

pub struct Mcts {
    pub root: Arc<Node>,
    evaluator: Arc<Evaluator>,
    exploration: f32,
}

impl Mcts {
    pub fn new(root: Arc<Node>, evaluator: Arc<Evaluator>) -> Self {
        Mcts {
            root,
            evaluator,
            exploration: EXPLORATION,
        }
    }

    /// Spawns one searcher per worker and joins them once the deadline
    /// passes. Workers poll the deadline at the top of every iteration and
    /// do no I/O in between; a panicked worker is logged and the surviving
    /// statistics stay usable.
    pub fn run(&self, deadline: Instant, workers: usize) {
        let handles: Vec<_> = (0..workers.max(1))
            .map(|_| {
                let root = Arc::clone(&self.root);
                let evaluator = Arc::clone(&self.evaluator);
                let exploration = self.exploration;
                thread::spawn(move || {
                    while Instant::now() < deadline {
                        iterate(&root, &evaluator, exploration);
                    }
                })
            })
            .collect();

        for handle in handles {
            if handle.join().is_err() {
                error!("search worker panicked, continuing with partial tree");
            }
        }
    }

    /// Fixed iteration count on the calling thread. With one caller the
    /// whole search is deterministic, which the tests and benches rely on.
    pub fn run_iterations(&self, iterations: usize) {
        for _ in 0..iterations {
            iterate(&self.root, &self.evaluator, self.exploration);
        }
    }

    /// The most visited root child; ties go to the higher mean score.
    pub fn best_direction(&self) -> Option<Direction> {
        let mut best: Option<(u32, f32, Direction)> = None;

        for child in self.root.children() {
            let action = match child.action {
                Some(action) => action,
                None => continue,
            };
            let visits = child.visit_count();
            let mean = child.mean_score();
            let better = match best {
                None => true,
                Some((best_visits, best_mean, _)) => {
                    visits > best_visits || (visits == best_visits && mean > best_mean)
                }
            };
            if better {
                best = Some((visits, mean, action));
            }
        }

        best.map(|(_, _, action)| action)
    }
}

enum Descend {
    Leaf(Arc<Node>),
    Into(Vec<Arc<Node>>),
}

/// One select -> expand -> evaluate -> backpropagate pass.
fn iterate(root: &Arc<Node>, evaluator: &Evaluator, exploration: f32) {
    let mut current = Arc::clone(root);

    let selected = loop {
        let step = {
            let mut state = current.lock_state();
            if let Some(direction) = state.untried.pop() {
                // Claimed under the lock: no other worker expands this edge.
                match expand(&current, direction) {
                    Some(child) => {
                        state.children.push(Arc::clone(&child));
                        Descend::Leaf(child)
                    }
                    None => Descend::Leaf(Arc::clone(&current)),
                }
            } else if state.children.is_empty() {
                // Terminal, or fully stuck.
                Descend::Leaf(Arc::clone(&current))
            } else {
                Descend::Into(state.children.clone())
            }
        };

        match step {
            Descend::Leaf(node) => break node,
            Descend::Into(children) => {
                // Stale visit/score reads are fine here; no lock is held.
                current = select_uct(&current, children, exploration);
            }
        }
    };

    let value = {
        let mut state = selected.lock_state();
        match state.static_eval {
            Some(value) => value,
            None => {
                let perspective = selected.mover.unwrap_or(0);
                let value = evaluator.evaluate(&selected.board, perspective);
                state.static_eval = Some(value);
                value
            }
        }
    };

    backpropagate(selected, value);
}

fn expand(parent: &Arc<Node>, direction: Direction) -> Option<Arc<Node>> {
    let actor = match parent.board.next_mover(parent.mover) {
        Some(actor) => actor,
        None => {
            error!("expandable node without a living mover\n{}", parent.board);
            return None;
        }
    };

    let mut board = parent.board.clone();
    board.apply_move(actor, direction);
    let untried = move_candidates(&board, Some(actor));

    Some(Arc::new(Node {
        board,
        mover: Some(actor),
        action: Some(direction),
        parent: Arc::downgrade(parent),
        visits: AtomicU32::new(0),
        score: AtomicF32::new(0.0),
        state: Mutex::new(NodeState {
            untried,
            children: Vec::new(),
            static_eval: None,
        }),
    }))
}

/// UCT over a children snapshot: mean score plus
/// `exploration * sqrt(ln(parent visits) / child visits)`. Unvisited
/// children score infinity; ties keep the earliest-inserted child.
fn select_uct(parent: &Node, children: Vec<Arc<Node>>, exploration: f32) -> Arc<Node> {
    let parent_visits = parent.visits.load(Ordering::Relaxed).max(1) as f32;
    let ln_parent = parent_visits.ln();

    let mut best_score = f32::NEG_INFINITY;
    let mut best: Option<Arc<Node>> = None;

    for child in children {
        let visits = child.visits.load(Ordering::Relaxed);
        let uct = if visits == 0 {
            f32::INFINITY
        } else {
            let exploitation = child.score.load(Ordering::Relaxed) / visits as f32;
            exploitation + exploration * (ln_parent / visits as f32).sqrt()
        };
        if uct > best_score {
            best_score = uct;
            best = Some(child);
        }
    }

    // the caller only descends into non-empty children snapshots
    best.expect("children snapshot is non-empty")
}

/// Adds the rollout value and a visit at every ancestor, flipping the sign
/// once per ply. Both counters are atomic, so concurrent backpropagations
/// interleave without locking.
fn backpropagate(leaf: Arc<Node>, value: f32) {
    let mut value = value;
    let mut node = leaf;
    loop {
        node.score.fetch_add(value, Ordering::Relaxed);
        node.visits.fetch_add(1, Ordering::Relaxed);
        value = -value;
        match node.parent.upgrade() {
            Some(parent) => node = parent,
            None => break,
        }
    }
}
