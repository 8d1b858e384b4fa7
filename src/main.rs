use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use serde_json::json;

use canopy::api::{GameRequest, MoveResponse};
use canopy::board::Direction;
use canopy::cache::{board_hash, GameCaches, TreeCache};
use canopy::eval::{Evaluator, Weights};
use canopy::search::{Mcts, Node};

/// Slice of the request timeout reserved for parsing, tree retention and
/// the response making it back out.
const SAFETY_MARGIN: Duration = Duration::from_millis(100);
/// Search floor for pathologically small timeouts.
const MIN_SEARCH: Duration = Duration::from_millis(50);

struct AppState {
    games: GameCaches,
    evaluator: Arc<Evaluator>,
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "apiversion": "1",
        "author": "canopy",
        "color": "#2f6b4f",
        "head": "default",
        "tail": "default",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn start(state: web::Data<AppState>, req: web::Json<GameRequest>) -> impl Responder {
    info!(
        "game {} started, {} snakes on {}x{}",
        req.game.id,
        req.board.snakes.len(),
        req.board.width,
        req.board.height
    );
    state.games.insert(req.game.id.clone(), TreeCache::default());
    HttpResponse::Ok().json(json!({}))
}

async fn end(state: web::Data<AppState>, req: web::Json<GameRequest>) -> impl Responder {
    info!("game {} ended", req.game.id);
    state.games.remove(&req.game.id);
    HttpResponse::Ok().json(json!({}))
}

async fn make_move(state: web::Data<AppState>, req: web::Json<GameRequest>) -> impl Responder {
    let req = req.into_inner();
    if req.board.width <= 0 || req.board.height <= 0 {
        return HttpResponse::BadRequest().body("board dimensions must be positive");
    }
    let mut board = req.to_board();

    // The engine always searches with itself at index 0.
    match board.snakes.iter().position(|s| s.id == req.you.id) {
        Some(idx) if idx > 0 => board.snakes.swap(0, idx),
        Some(_) => {}
        None => {
            warn!(
                "requesting snake {} missing from the submitted board",
                req.you.id
            );
            return HttpResponse::BadRequest().body("requesting snake is not on the board");
        }
    }

    if !state.games.contains_key(&req.game.id) {
        warn!(
            "move for unknown game {}, allocating the cache late",
            req.game.id
        );
        state.games.insert(req.game.id.clone(), TreeCache::default());
    }

    let hash = board_hash(&board);
    let cached = state
        .games
        .get(&req.game.id)
        .and_then(|cache| cache.lookup(hash));
    let root = match cached {
        Some(node) => {
            debug!(
                "turn {}: warm start with {} prior visits",
                req.turn,
                node.visit_count()
            );
            node
        }
        None => Node::new_root(board),
    };

    let budget = Duration::from_millis(req.game.timeout)
        .saturating_sub(SAFETY_MARGIN)
        .max(MIN_SEARCH);
    let deadline = Instant::now() + budget;

    let mcts = Mcts::new(root, Arc::clone(&state.evaluator));
    mcts.run(deadline, num_cpus::get());

    let visits = mcts.root.visit_count();
    let direction = match mcts.best_direction() {
        Some(direction) => direction,
        None => {
            warn!(
                "turn {}: deadline fired before any expansion, moving at random",
                req.turn
            );
            random_direction()
        }
    };

    if let Some(cache) = state.games.get(&req.game.id) {
        cache.retain_grandchildren(&mcts.root);
    }

    info!(
        "game {} turn {}: {} after {} visits",
        req.game.id, req.turn, direction, visits
    );
    debug!("{}", mcts.root.board);

    HttpResponse::Ok().json(MoveResponse::new(
        direction,
        format!("{direction} after {visits} visits"),
    ))
}

fn random_direction() -> Direction {
    *Direction::ALL
        .choose(&mut rand::thread_rng())
        .expect("four directions")
}

#[derive(Parser)]
#[clap(version, about = "Battlesnake engine: time-bounded parallel MCTS")]
struct Opts {
    /// Listen port. The PORT environment variable overrides the flag.
    #[clap(long, default_value_t = 8080)]
    port: u16,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(opts.port);

    let state = web::Data::new(AppState {
        games: GameCaches::default(),
        evaluator: Arc::new(Evaluator::new(&Weights::default())),
    });

    info!("listening on 0.0.0.0:{port} with {} workers", num_cpus::get());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                let message = format!("malformed request: {err}");
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().body(message),
                )
                .into()
            }))
            .route("/", web::get().to(index))
            .route("/start", web::post().to(start))
            .route("/move", web::post().to(make_move))
            .route("/end", web::post().to(end))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
