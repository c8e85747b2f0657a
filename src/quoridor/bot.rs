//! Alpha-beta search heuristic, ported from the teacher's `bot.rs`. Used as
//! the `Heuristic` exploit mode's ranking function rather than the teacher's
//! own direct best-move call.

use crate::quoridor::a_star::a_star;
use crate::quoridor::all_moves::all_moves;
use crate::quoridor::data_model::{Game, Player, PlayerMove};
use crate::quoridor::game_logic::{execute_move_unchecked, is_move_legal};

pub const LOOSING_SCORE: isize = isize::MIN + 1;
pub const WINNING_SCORE: isize = -LOOSING_SCORE;

pub fn heuristic_board_score(game: &Game, player: Player) -> isize {
    let opponent = player.opponent();
    let opponent_distance = match a_star(&game.board, opponent) {
        Some(path) => path.len() as isize,
        None => return LOOSING_SCORE,
    };
    if opponent_distance == 0 {
        return LOOSING_SCORE;
    }
    let player_distance = match a_star(&game.board, player) {
        Some(path) => path.len() as isize,
        None => return WINNING_SCORE,
    };
    if player_distance == 0 {
        return WINNING_SCORE;
    }
    let player_walls_left = game.walls_left[player.as_index()] as isize;
    let opponent_walls_left = game.walls_left[opponent.as_index()] as isize;
    opponent_distance - player_distance + player_walls_left - opponent_walls_left
}

pub fn best_move_alpha_beta(game: &Game, player: Player, depth: usize) -> Option<(PlayerMove, isize)> {
    legal_moves(game, player)
        .into_iter()
        .map(|player_move| {
            let mut game_copy = game.clone();
            execute_move_unchecked(&mut game_copy, player, player_move);
            (player_move.clone(), alpha_beta(&game_copy, depth, LOOSING_SCORE, WINNING_SCORE, player.opponent()))
        })
        .max_by_key(|(_, score)| *score)
}

/// Score each of `choices` (indices into `all_moves()`) by one-ply alpha-beta
/// lookahead and return them best-first. Used directly as an
/// `Agent::Heuristic` exploit mode's ranking function.
pub fn rank_choice_ids_alpha_beta(game: &Game, player: Player, depth: usize, choices: &[u8]) -> Vec<u8> {
    let moves = all_moves();
    let mut scored: Vec<(u8, isize)> = choices
        .iter()
        .map(|&id| {
            let player_move = &moves[id as usize];
            let mut game_copy = game.clone();
            execute_move_unchecked(&mut game_copy, player, player_move);
            (id, alpha_beta(&game_copy, depth, LOOSING_SCORE, WINNING_SCORE, player.opponent()))
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(id, _)| id).collect()
}

pub fn alpha_beta(game: &Game, depth: usize, alpha: isize, beta: isize, player: Player) -> isize {
    if depth == 0 {
        return heuristic_board_score(game, player);
    }
    let mut alpha = alpha;
    let mut beta = beta;

    match player {
        Player::A => {
            let mut value = LOOSING_SCORE;
            for child_game_state in child_game_states(game, player) {
                value = value.max(alpha_beta(&child_game_state, depth - 1, alpha, beta, player.opponent()));
                if value >= beta {
                    break;
                }
                alpha = alpha.max(value);
            }
            value
        }
        Player::B => {
            let mut value = WINNING_SCORE;
            for child_game_state in child_game_states(game, player) {
                value = value.min(alpha_beta(&child_game_state, depth - 1, alpha, beta, player.opponent()));
                if value <= alpha {
                    break;
                }
                beta = beta.min(value);
            }
            value
        }
    }
}

fn child_game_states(game: &Game, player: Player) -> Vec<Game> {
    legal_moves(game, player)
        .into_iter()
        .map(|player_move| {
            let mut game_copy = game.clone();
            execute_move_unchecked(&mut game_copy, player, player_move);
            game_copy
        })
        .collect()
}

fn legal_moves(game: &Game, player: Player) -> Vec<&PlayerMove> {
    all_moves().iter().filter(|player_move| is_move_legal(game, player, player_move)).collect::<Vec<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_move_prefers_forward_progress() {
        let game = Game::new();
        let (_, score) = best_move_alpha_beta(&game, Player::A, 1).unwrap();
        assert!(score > LOOSING_SCORE);
    }

    #[test]
    fn rank_choice_ids_orders_best_first() {
        let game = Game::new();
        let choices: Vec<u8> = (0..all_moves().len() as u8).filter(|&id| is_move_legal(&game, Player::A, &all_moves()[id as usize])).collect();
        let ranked = rank_choice_ids_alpha_beta(&game, Player::A, 1, &choices);
        assert_eq!(ranked.len(), choices.len());
    }
}
