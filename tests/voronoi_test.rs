use canopy::board::{Board, Cell};
use canopy::voronoi::{Owner, OwnershipMap};

fn cells(points: &[(i32, i32)]) -> Vec<Cell> {
    points.iter().map(|&(x, y)| Cell::new(x, y)).collect()
}

#[test]
fn corner_duel_splits_along_the_anti_diagonal() {
    let mut board = Board::new(5, 5);
    board.add_snake("a", cells(&[(0, 0)]), 100);
    board.add_snake("b", cells(&[(4, 4)]), 100);

    let map = OwnershipMap::compute(&board);

    for x in 0..5 {
        for y in 0..5 {
            let cell = Cell::new(x, y);
            let expected = match (x + y).cmp(&4) {
                std::cmp::Ordering::Less => Owner::Snake(0),
                std::cmp::Ordering::Equal => Owner::Contested,
                std::cmp::Ordering::Greater => Owner::Snake(1),
            };
            assert_eq!(
                map.owner_of(cell),
                expected,
                "wrong owner at ({x},{y})"
            );
        }
    }
}

#[test]
fn every_cell_is_accounted_for() {
    let mut board = Board::new(7, 7);
    board.add_snake("a", cells(&[(1, 1), (1, 2), (1, 3)]), 100);
    board.add_snake("b", cells(&[(5, 5), (5, 4)]), 100);
    board.add_snake("c", cells(&[(5, 1)]), 100);

    let map = OwnershipMap::compute(&board);
    let counts = map.counts(board.snakes.len());

    let contested = map
        .owner
        .iter()
        .filter(|&&o| o == Owner::Contested)
        .count();
    let unreached = map
        .owner
        .iter()
        .filter(|&&o| o == Owner::Unreached)
        .count();

    assert_eq!(
        counts.iter().sum::<usize>() + contested + unreached,
        7 * 7,
        "ownership must partition the board"
    );
    for (i, &count) in counts.iter().enumerate() {
        assert!(count > 0, "snake {i} should own at least its own head");
    }
}

#[test]
fn sole_neighbour_owns_the_cell() {
    let mut board = Board::new(5, 5);
    board.add_snake("a", cells(&[(0, 0)]), 100);
    board.add_snake("b", cells(&[(4, 4)]), 100);

    let map = OwnershipMap::compute(&board);

    // (1,0) touches only a's head, (4,3) only b's
    assert_eq!(map.owner_of(Cell::new(1, 0)), Owner::Snake(0));
    assert_eq!(map.distance_to(Cell::new(1, 0)), 1);
    assert_eq!(map.owner_of(Cell::new(4, 3)), Owner::Snake(1));
    assert_eq!(map.distance_to(Cell::new(4, 3)), 1);
}

#[test]
fn opponent_tails_age_out_of_the_way() {
    // a |0 1 2 3 4 5|  b occupies 2..=4 head-at-4; the corridor forces a
    // to wait for b's tail to clear cell by cell.
    let mut board = Board::new(6, 1);
    board.add_snake("a", cells(&[(0, 0)]), 100);
    board.add_snake("b", cells(&[(4, 0), (3, 0), (2, 0)]), 100);

    let map = OwnershipMap::compute(&board);

    assert_eq!(map.owner_of(Cell::new(1, 0)), Owner::Snake(0));
    // the tail at (2,0) vacates after one step, just in time for d=2
    assert_eq!(map.owner_of(Cell::new(2, 0)), Owner::Snake(0));
    assert_eq!(map.distance_to(Cell::new(2, 0)), 2);
    assert_eq!(map.owner_of(Cell::new(3, 0)), Owner::Snake(0));
    assert_eq!(map.distance_to(Cell::new(3, 0)), 3);
    // b holds its own head cell and the cell beyond it
    assert_eq!(map.owner_of(Cell::new(4, 0)), Owner::Snake(1));
    assert_eq!(map.owner_of(Cell::new(5, 0)), Owner::Snake(1));

    assert_eq!(map.counts(2), vec![4, 2]);
}

#[test]
fn boxed_in_snake_owns_only_its_cell() {
    // b's body fences a into the corner; both exits free up too late for
    // a to claim anything beyond them first
    let mut board = Board::new(3, 3);
    board.add_snake("a", cells(&[(0, 0)]), 100);
    board.add_snake(
        "b",
        cells(&[(0, 2), (0, 1), (1, 1), (1, 0), (1, 0)]),
        100,
    );

    let map = OwnershipMap::compute(&board);

    assert_eq!(map.owner_of(Cell::new(0, 0)), Owner::Snake(0));
    assert_eq!(
        map.counts(2)[0],
        1,
        "a only owns the cell it stands on"
    );
}
