use serde::Deserialize;

use crate::board::Board;
use crate::voronoi::OwnershipMap;

/// Score assigned to decided positions; non-terminal scores stay in [-1, 1].
pub const S_MAX: f32 = 10.0;

/// A per-snake scoring module. `scores` returns one entry per snake in
/// board order; implementations document their output domain so weighted
/// aggregation stays normalisable.
pub trait Heuristic: Send + Sync {
    fn name(&self) -> &'static str;
    fn scores(&self, board: &Board) -> Vec<f32>;
}

/// Board control from the ownership sweep. Output in [-1, 1]:
/// (cells owned by the snake - cells owned by everyone else) / board size.
pub struct Territory;

impl Heuristic for Territory {
    fn name(&self) -> &'static str {
        "territory"
    }

    fn scores(&self, board: &Board) -> Vec<f32> {
        let map = OwnershipMap::compute(board);
        let counts = map.counts(board.snakes.len());
        let total_owned: usize = counts.iter().sum();
        let size = (board.width * board.height) as f32;

        counts
            .iter()
            .map(|&own| (own as f32 - (total_owned - own) as f32) / size)
            .collect()
    }
}

/// Length standing. Output in [-1, 1]: the longest living snakes get +1,
/// shorter ones a penalty proportional to how far they trail.
pub struct LengthAdvantage;

impl Heuristic for LengthAdvantage {
    fn name(&self) -> &'static str {
        "length"
    }

    fn scores(&self, board: &Board) -> Vec<f32> {
        let max_len = board
            .snakes
            .iter()
            .filter(|s| s.alive())
            .map(|s| s.length())
            .max()
            .unwrap_or(0);

        board
            .snakes
            .iter()
            .map(|s| {
                if !s.alive() || max_len == 0 {
                    0.0
                } else if s.length() == max_len {
                    1.0
                } else {
                    (-((max_len - s.length()) as f32 / max_len as f32)).clamp(-1.0, 0.0)
                }
            })
            .collect()
    }
}

/// Penalty for positions only reached by winning a coin flip: -1 for a
/// snake whose last move entered a cell a not-yet-moved opponent of equal
/// or greater length could also have taken, 0 otherwise. The configured
/// weight sets the size of the penalty.
pub struct Luck;

impl Heuristic for Luck {
    fn name(&self) -> &'static str {
        "luck"
    }

    fn scores(&self, board: &Board) -> Vec<f32> {
        board
            .snakes
            .iter()
            .map(|s| if s.contested { -1.0 } else { 0.0 })
            .collect()
    }
}

/// Pressure toward thinning the field. Output in [-3, 1]:
/// -(living opponents - 1 if self alive).
pub struct OpponentCount;

impl Heuristic for OpponentCount {
    fn name(&self) -> &'static str {
        "opponents"
    }

    fn scores(&self, board: &Board) -> Vec<f32> {
        let alive = board.alive_count();
        board
            .snakes
            .iter()
            .map(|s| {
                let others = (alive - s.alive() as usize) as f32;
                let standing = if s.alive() { 1.0 } else { 0.0 };
                -(others - standing)
            })
            .collect()
    }
}

/// Module weights. Every recognized option is a field here; unknown keys
/// are rejected at deserialisation. The sum has to be positive.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Weights {
    pub territory: f32,
    pub length: f32,
    pub luck: f32,
    pub opponents: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            territory: 1.0,
            length: 0.5,
            luck: 0.25,
            opponents: 0.25,
        }
    }
}

/// Weighted composition of scoring modules with terminal overrides.
pub struct Evaluator {
    modules: Vec<(Box<dyn Heuristic>, f32)>,
}

impl Evaluator {
    /// The standard module set under the given weights.
    pub fn new(weights: &Weights) -> Self {
        let mut evaluator = Evaluator {
            modules: Vec::new(),
        };
        evaluator.register(Box::new(Territory), weights.territory);
        evaluator.register(Box::new(LengthAdvantage), weights.length);
        evaluator.register(Box::new(Luck), weights.luck);
        evaluator.register(Box::new(OpponentCount), weights.opponents);
        evaluator
    }

    pub fn register(&mut self, module: Box<dyn Heuristic>, weight: f32) {
        self.modules.push((module, weight));
    }

    /// Unclipped weighted per-snake totals, normalised by the weight sum.
    pub fn raw_scores(&self, board: &Board) -> Vec<f32> {
        let mut totals = vec![0.0f32; board.snakes.len()];
        let mut weight_sum = 0.0f32;

        for (module, weight) in &self.modules {
            weight_sum += weight;
            for (total, score) in totals.iter_mut().zip(module.scores(board)) {
                *total += weight * score;
            }
        }

        let norm = if weight_sum > 0.0 { weight_sum } else { 1.0 };
        for total in &mut totals {
            *total /= norm;
        }
        totals
    }

    /// Score of the board as seen by `perspective`. Decided positions map
    /// to 0 (everyone dead), -S_MAX (perspective dead) or +S_MAX (last one
    /// standing); everything else is the aggregated total clipped into
    /// [-1, 1].
    pub fn evaluate(&self, board: &Board, perspective: usize) -> f32 {
        let alive = board.alive_count();
        if alive == 0 {
            return 0.0;
        }
        let self_alive = board
            .snakes
            .get(perspective)
            .map_or(false, |s| s.alive());
        if !self_alive {
            return -S_MAX;
        }
        if alive == 1 {
            return S_MAX;
        }

        self.raw_scores(board)[perspective].clamp(-1.0, 1.0)
    }
}
