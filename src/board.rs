use std::collections::VecDeque;
use std::fmt;

pub const FULL_HEALTH: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => Cell::new(self.x, self.y + 1),
            Direction::Down => Cell::new(self.x, self.y - 1),
            Direction::Left => Cell::new(self.x - 1, self.y),
            Direction::Right => Cell::new(self.x + 1, self.y),
        }
    }

    pub fn adjacent(self, other: Cell) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Snake {
    pub id: String,
    pub health: u8,
    /// Head first. Empty once the snake is dead.
    pub body: VecDeque<Cell>,
    /// Set when the latest move entered a cell a not-yet-moved opponent of
    /// equal or greater length could also have entered. Read by the luck
    /// heuristic.
    pub contested: bool,
}

impl Snake {
    pub fn alive(&self) -> bool {
        self.health > 0 && !self.body.is_empty()
    }

    pub fn head(&self) -> Cell {
        self.body.front().copied().unwrap_or(Cell::new(-1, -1))
    }

    pub fn length(&self) -> usize {
        self.body.len()
    }
}

/// The full game position. Snake order is stable within a turn and defines
/// the order in which moves are applied.
#[derive(Debug, Clone)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    pub food: Vec<Cell>,
    pub hazards: Vec<Cell>,
    pub snakes: Vec<Snake>,
}

impl Board {
    pub fn new(width: i32, height: i32) -> Self {
        Board {
            width,
            height,
            food: Vec::new(),
            hazards: Vec::new(),
            snakes: Vec::new(),
        }
    }

    pub fn add_snake(&mut self, id: &str, body: Vec<Cell>, health: u8) {
        self.snakes.push(Snake {
            id: id.to_string(),
            health,
            body: body.into(),
            contested: false,
        });
    }

    pub fn add_food(&mut self, cell: Cell) {
        self.food.push(cell);
    }

    pub fn add_hazard(&mut self, cell: Cell) {
        self.hazards.push(cell);
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    pub fn alive_count(&self) -> usize {
        self.snakes.iter().filter(|s| s.alive()).count()
    }

    /// Index of the next living snake after `prev` in cyclic snake order,
    /// starting from 0 when `prev` is `None`.
    pub fn next_mover(&self, prev: Option<usize>) -> Option<usize> {
        let n = self.snakes.len();
        if n == 0 {
            return None;
        }
        let start = prev.map_or(0, |p| (p + 1) % n);
        (0..n)
            .map(|k| (start + k) % n)
            .find(|&i| self.snakes[i].alive())
    }

    /// Applies one snake's move in place. Moves are applied one snake at a
    /// time in snake order, so snakes before `idx` have already moved this
    /// round and snakes after it have not; the collision rules account for
    /// that asymmetry.
    pub fn apply_move(&mut self, idx: usize, direction: Direction) {
        if idx >= self.snakes.len() || !self.snakes[idx].alive() {
            return;
        }

        let new_head = self.snakes[idx].head().step(direction);
        self.snakes[idx].body.push_front(new_head);

        if !self.in_bounds(new_head) {
            self.kill(idx);
            return;
        }

        self.snakes[idx].health = self.snakes[idx].health.saturating_sub(1);

        let ate = match self.food.iter().position(|&f| f == new_head) {
            Some(at) => {
                self.food.swap_remove(at);
                true
            }
            None => false,
        };

        if ate {
            // The tail stays put, so net length grows by one.
            self.snakes[idx].health = FULL_HEALTH;
        } else {
            self.snakes[idx].body.pop_back();
            if self.snakes[idx].health == 0 {
                self.kill(idx);
                return;
            }
        }

        self.snakes[idx].contested = self.contested_entry(idx, new_head);
        self.resolve_collisions(idx, new_head);
    }

    /// Directions that keep the head in bounds, off the own neck, and off
    /// any living body segment (tails of snakes that have not moved this
    /// round, the mover included, vacate before the mover arrives). Falls
    /// back to the in-bounds non-neck set when everything is blocked.
    pub fn safe_moves(&self, idx: usize) -> Vec<Direction> {
        let snake = match self.snakes.get(idx) {
            Some(s) if s.alive() => s,
            _ => return Vec::new(),
        };
        let head = snake.head();
        let neck = snake.body.get(1).copied();

        let mut open = Vec::new();
        let mut safe = Vec::new();
        for direction in Direction::ALL {
            let target = head.step(direction);
            if !self.in_bounds(target) || neck == Some(target) {
                continue;
            }
            open.push(direction);
            if !self.body_blocks(idx, target) {
                safe.push(direction);
            }
        }

        if safe.is_empty() {
            open
        } else {
            safe
        }
    }

    /// Whether any living snake segment still covers `cell` after `steps`
    /// tail pops. Segment k of a length-L body vacates once steps >= L - k;
    /// growth pauses are ignored.
    pub fn occupied_after(&self, cell: Cell, steps: u32) -> bool {
        self.snakes.iter().any(|snake| {
            snake.alive()
                && snake
                    .body
                    .iter()
                    .enumerate()
                    .any(|(k, &seg)| seg == cell && (steps as usize) < snake.body.len() - k)
        })
    }

    fn kill(&mut self, idx: usize) {
        let snake = &mut self.snakes[idx];
        snake.body.clear();
        snake.health = 0;
        snake.contested = false;
    }

    /// Body-segment check for move generation: heads excluded, tails of
    /// snakes with index >= mover excluded (they pop before the mover's
    /// head lands).
    fn body_blocks(&self, mover: usize, target: Cell) -> bool {
        self.snakes.iter().enumerate().any(|(j, other)| {
            if !other.alive() {
                return false;
            }
            let last = other.body.len() - 1;
            other.body.iter().enumerate().any(|(k, &seg)| {
                if k == 0 {
                    return false;
                }
                if j >= mover && k == last {
                    return false;
                }
                seg == target
            })
        })
    }

    /// True when a living opponent that still has its move to make could
    /// have entered `head` this round without losing the exchange.
    fn contested_entry(&self, mover: usize, head: Cell) -> bool {
        let mover_len = self.snakes[mover].length();
        self.snakes.iter().enumerate().any(|(j, other)| {
            j > mover
                && other.alive()
                && other.length() >= mover_len
                && other.head().adjacent(head)
        })
    }

    fn resolve_collisions(&mut self, mover: usize, head: Cell) {
        let mover_len = self.snakes[mover].length();
        let mut mover_dies = false;
        let mut casualties = Vec::new();

        // Head to head: the strictly longer snake survives, equal lengths
        // take each other out. Snakes before the mover already carry their
        // new head position, later ones still their old one.
        for (j, other) in self.snakes.iter().enumerate() {
            if j == mover || !other.alive() {
                continue;
            }
            if other.head() == head {
                match mover_len.cmp(&other.length()) {
                    std::cmp::Ordering::Greater => casualties.push(j),
                    std::cmp::Ordering::Less => mover_dies = true,
                    std::cmp::Ordering::Equal => {
                        casualties.push(j);
                        mover_dies = true;
                    }
                }
            }
        }

        // Head into a body segment. Heads were handled above; tails of
        // snakes that have not moved yet this round vacate in time.
        if !mover_dies {
            'snakes: for (j, other) in self.snakes.iter().enumerate() {
                if !other.alive() {
                    continue;
                }
                let last = other.body.len() - 1;
                for (k, &seg) in other.body.iter().enumerate() {
                    if k == 0 {
                        continue;
                    }
                    if j > mover && k == last {
                        continue;
                    }
                    if seg == head {
                        mover_dies = true;
                        break 'snakes;
                    }
                }
            }
        }

        for j in casualties {
            self.kill(j);
        }
        if mover_dies {
            self.kill(mover);
        }
    }
}

impl fmt::Display for Board {
    /// ASCII rendering, y axis up: food `*`, hazards `!`, snakes `a`/`A`
    /// (head upper-case) onwards by index.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = vec!['.'; (self.width * self.height) as usize];
        let at = |c: Cell| (c.y * self.width + c.x) as usize;

        for &food in &self.food {
            if self.in_bounds(food) {
                grid[at(food)] = '*';
            }
        }
        for &hazard in &self.hazards {
            if self.in_bounds(hazard) {
                grid[at(hazard)] = '!';
            }
        }
        for (i, snake) in self.snakes.iter().enumerate() {
            if !snake.alive() {
                continue;
            }
            let tail_char = (b'a' + (i % 26) as u8) as char;
            for (k, &seg) in snake.body.iter().enumerate() {
                if !self.in_bounds(seg) {
                    continue;
                }
                grid[at(seg)] = if k == 0 {
                    tail_char.to_ascii_uppercase()
                } else {
                    tail_char
                };
            }
        }

        for y in (0..self.height).rev() {
            for x in 0..self.width {
                write!(f, "{}", grid[(y * self.width + x) as usize])?;
            }
            if y > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
