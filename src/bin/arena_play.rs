//! Interactive demo CLI, adapted from the teacher's `main_cli.rs` /
//! `commands.rs`. A human at the terminal (or a heuristic bot) plays a full
//! game against the alpha-beta heuristic; there's no `Human` exploit mode in
//! the orchestrator's `AgentConfig`, so this binary talks to
//! `quoridor::{game_logic, bot}` directly rather than going through
//! `Agent`/`Simulator`.

use std::io::{self, Write};

use arena_trainer::quoridor::data_model::{Direction, Game, MovePiece, Player, PlayerMove, WallOrientation, WallPosition};
use arena_trainer::quoridor::game_logic::{execute_move_unchecked, is_move_legal};
use arena_trainer::quoridor::render::render_board;
use arena_trainer::quoridor::bot;
use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PlayerType {
    Human,
    Bot,
}

#[derive(Parser, Debug)]
#[command(about = "Play an interactive game of quoridor against the heuristic bot")]
struct Args {
    #[arg(short, long, default_value_t = 4)]
    depth: usize,

    #[arg(short = 'a', long, value_enum, default_value_t = PlayerType::Human)]
    player_a: PlayerType,

    #[arg(short = 'b', long, value_enum, default_value_t = PlayerType::Bot)]
    player_b: PlayerType,

    #[arg(short, long)]
    end_after_moves: Option<usize>,
}

fn main() {
    let args = Args::parse();
    let mut game = Game::new();

    let player_type = |p: Player| match p {
        Player::A => args.player_a,
        Player::B => args.player_b,
    };

    for move_number in 0.. {
        if let Some(end_after_moves) = args.end_after_moves {
            if move_number >= end_after_moves {
                break;
            }
        }
        let player = game.player;
        println!("{}", render_board(&game.board));
        println!(
            "{} ({:?}) to move. Walls: A: {}, B: {}",
            player.to_string(),
            player_type(player),
            game.walls_left[Player::A.as_index()],
            game.walls_left[Player::B.as_index()]
        );

        let player_move = match player_type(player) {
            PlayerType::Human => get_human_move(&game, player),
            PlayerType::Bot => get_bot_move(&game, player, args.depth),
        };

        execute_move_unchecked(&mut game, player, &player_move);

        if let Some(winner) = winner(&game) {
            println!("{}", render_board(&game.board));
            println!("{winner} wins!");
            break;
        }
    }
}

fn winner(game: &Game) -> Option<&'static str> {
    if game.board.player_position(Player::A).y() == 8 {
        Some("A")
    } else if game.board.player_position(Player::B).y() == 0 {
        Some("B")
    } else {
        None
    }
}

fn get_bot_move(game: &Game, player: Player, depth: usize) -> PlayerMove {
    let start = std::time::Instant::now();
    let (best_move, score) = bot::best_move_alpha_beta(game, player, depth).expect("no legal moves for bot");
    println!("Best move: {best_move:?} with score: {score} (took {:?})", start.elapsed());
    best_move
}

fn get_human_move(game: &Game, player: Player) -> PlayerMove {
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).unwrap_or(0) == 0 {
            std::process::exit(0);
        }
        match parse_player_move(input.trim()) {
            Some(player_move) if is_move_legal(game, player, &player_move) => return player_move,
            Some(_) => println!("Invalid move."),
            None => println!("Invalid input. Use m<dir>[<collision-dir>] / h<x><y> / v<x><y>, dir in udlr."),
        }
    }
}

fn parse_player_move(input: &str) -> Option<PlayerMove> {
    let mut chars = input.chars();
    let direction_from_char = |c: Option<char>| match c {
        Some('u') => Some(Direction::Up),
        Some('d') => Some(Direction::Down),
        Some('l') => Some(Direction::Left),
        Some('r') => Some(Direction::Right),
        _ => None,
    };

    match chars.next() {
        Some('m') => {
            let direction = direction_from_char(chars.next())?;
            let direction_on_collision = direction_from_char(chars.next()).unwrap_or(direction);
            Some(PlayerMove::MovePiece(MovePiece { direction, direction_on_collision }))
        }
        Some('h') => {
            let x = chars.next()?.to_digit(10)? as usize;
            let y = chars.next()?.to_digit(10)? as usize;
            Some(PlayerMove::PlaceWall { orientation: WallOrientation::Horizontal, position: WallPosition { x, y } })
        }
        Some('v') => {
            let x = chars.next()?.to_digit(10)? as usize;
            let y = chars.next()?.to_digit(10)? as usize;
            Some(PlayerMove::PlaceWall { orientation: WallOrientation::Vertical, position: WallPosition { x, y } })
        }
        _ => None,
    }
}
