use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Direction};

/// Request body shared by `/start`, `/move` and `/end`.
#[derive(Debug, Deserialize)]
pub struct GameRequest {
    pub game: Game,
    pub turn: u32,
    pub board: WireBoard,
    pub you: WireSnake,
}

#[derive(Debug, Deserialize)]
pub struct Game {
    pub id: String,
    /// Per-move budget in milliseconds.
    pub timeout: u64,
    #[serde(default)]
    pub ruleset: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct WireBoard {
    pub height: i32,
    pub width: i32,
    pub food: Vec<Coord>,
    pub hazards: Vec<Coord>,
    pub snakes: Vec<WireSnake>,
}

#[derive(Debug, Deserialize)]
pub struct WireSnake {
    pub id: String,
    pub health: u8,
    /// Head first; `body[0]` equals `head`.
    pub body: Vec<Coord>,
    pub head: Coord,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl From<Coord> for Cell {
    fn from(coord: Coord) -> Cell {
        Cell::new(coord.x, coord.y)
    }
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub r#move: String,
    pub shout: Option<String>,
}

impl MoveResponse {
    pub fn new(direction: Direction, shout: impl Into<String>) -> Self {
        MoveResponse {
            r#move: direction.as_str().to_string(),
            shout: Some(shout.into()),
        }
    }
}

impl GameRequest {
    /// The wire board as a simulator board. The wire y-axis already points
    /// up, so coordinates carry over unchanged.
    pub fn to_board(&self) -> Board {
        let mut board = Board::new(self.board.width, self.board.height);
        for snake in &self.board.snakes {
            let body: Vec<Cell> = snake.body.iter().map(|&c| c.into()).collect();
            board.add_snake(&snake.id, body, snake.health);
        }
        for &food in &self.board.food {
            board.add_food(food.into());
        }
        for &hazard in &self.board.hazards {
            board.add_hazard(hazard.into());
        }
        board
    }
}
