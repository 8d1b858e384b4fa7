use std::sync::Arc;
use std::time::{Duration, Instant};

use canopy::board::{Board, Cell, Direction};
use canopy::cache::{board_hash, TreeCache};
use canopy::eval::{Evaluator, Weights};
use canopy::search::{Mcts, Node};

fn cells(points: &[(i32, i32)]) -> Vec<Cell> {
    points.iter().map(|&(x, y)| Cell::new(x, y)).collect()
}

fn evaluator() -> Arc<Evaluator> {
    Arc::new(Evaluator::new(&Weights::default()))
}

fn duel_board() -> Board {
    let mut board = Board::new(11, 11);
    board.add_snake("us", cells(&[(3, 0), (2, 0), (1, 0)]), 100);
    board.add_snake("them", cells(&[(5, 10), (6, 10), (7, 10), (8, 10)]), 100);
    board
}

#[test]
fn search_commits_to_a_safe_move() {
    let board = duel_board();
    let mcts = Mcts::new(Node::new_root(board.clone()), evaluator());
    mcts.run_iterations(2_000);

    let direction = mcts.best_direction().expect("expanded root has a best child");
    assert!(
        board.safe_moves(0).contains(&direction),
        "{direction} is not safe for snake 0"
    );
}

#[test]
fn deadline_run_also_commits() {
    let board = duel_board();
    let mcts = Mcts::new(Node::new_root(board.clone()), evaluator());
    mcts.run(Instant::now() + Duration::from_millis(50), 4);

    let direction = mcts.best_direction().expect("some child was expanded");
    assert!(board.safe_moves(0).contains(&direction));
}

#[test]
fn visits_only_grow() {
    let mcts = Mcts::new(Node::new_root(duel_board()), evaluator());
    mcts.run_iterations(200);

    let children = mcts.root.children();
    let before: Vec<u32> = children.iter().map(|c| c.visit_count()).collect();
    let root_before = mcts.root.visit_count();

    mcts.run_iterations(200);

    assert!(mcts.root.visit_count() >= root_before + 200);
    for (child, &earlier) in children.iter().zip(&before) {
        assert!(
            child.visit_count() >= earlier,
            "a child lost visits between runs"
        );
    }
}

#[test]
fn single_worker_search_is_reproducible() {
    let pick = |iterations| {
        let mcts = Mcts::new(Node::new_root(duel_board()), evaluator());
        mcts.run_iterations(iterations);
        mcts.best_direction()
    };

    assert_eq!(pick(500), pick(500));
    assert_eq!(pick(1_500), pick(1_500));
}

#[test]
fn terminal_root_has_no_move() {
    let mut board = Board::new(5, 5);
    board.add_snake("last", cells(&[(2, 2), (2, 1)]), 100);

    let root = Node::new_root(board);
    assert!(root.is_terminal());

    let mcts = Mcts::new(root, evaluator());
    mcts.run_iterations(10);
    assert_eq!(mcts.best_direction(), None);
    // the terminal evaluation still accumulates
    assert_eq!(mcts.root.visit_count(), 10);
}

#[test]
fn canonical_hash_tracks_position_content() {
    let board = duel_board();
    assert_eq!(board_hash(&board), board_hash(&board.clone()));

    let mut moved_food = duel_board();
    moved_food.add_food(Cell::new(5, 5));
    assert_ne!(board_hash(&board), board_hash(&moved_food));

    let mut fed = duel_board();
    fed.snakes[0].health = 55;
    assert_ne!(board_hash(&board), board_hash(&fed));

    // insertion order of food must not matter
    let mut one_way = duel_board();
    one_way.add_food(Cell::new(1, 1));
    one_way.add_food(Cell::new(9, 9));
    let mut other_way = duel_board();
    other_way.add_food(Cell::new(9, 9));
    other_way.add_food(Cell::new(1, 1));
    assert_eq!(board_hash(&one_way), board_hash(&other_way));
}

#[test]
fn retained_grandchildren_warm_start_the_next_turn() {
    let mcts = Mcts::new(Node::new_root(duel_board()), evaluator());
    mcts.run_iterations(3_000);

    let cache = TreeCache::default();
    cache.retain_grandchildren(&mcts.root);
    assert!(!cache.is_empty(), "a deep search leaves grandchildren behind");

    let grandchild = mcts.root.children()[0].children()[0].clone();
    let visits = grandchild.visit_count();

    let rebound = cache
        .lookup(board_hash(&grandchild.board))
        .expect("retained position is findable by hash");
    assert_eq!(rebound.visit_count(), visits, "statistics survive retention");

    // the rebound node keeps searching as a root: its parent is gone but
    // expansion and backpropagation still work
    let warm = Mcts::new(rebound, evaluator());
    warm.run_iterations(100);
    assert!(warm.root.visit_count() >= visits + 100);
}
