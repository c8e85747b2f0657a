//! State encoding, adapted from the teacher's `nn_bot.rs` `Game::encode`:
//! flattens the board into fixed `[channel, row, col]` planes instead of the
//! teacher's nested `Vec<Vec<Vec<f32>>>`, so it matches `EncodedState`'s
//! flat row-major contract.

use crate::inference::EncodedState;
use crate::quoridor::data_model::{Game, Player, WallOrientation, PIECE_GRID_HEIGHT, PIECE_GRID_WIDTH, WALL_GRID_HEIGHT, WALL_GRID_WIDTH};

pub const CHANNELS: usize = 6;
pub const INPUT_SHAPE: [usize; 3] = [CHANNELS, PIECE_GRID_HEIGHT, PIECE_GRID_WIDTH];

/// Encode `game` from `to_move`'s point of view: channel 0 is always the
/// encoding player's own pawn, channel 1 the opponent's, so a single model
/// can be shared by both seats.
pub fn encode(game: &Game, to_move: Player) -> EncodedState {
    let mut planes = vec![0.0f32; CHANNELS * PIECE_GRID_HEIGHT * PIECE_GRID_WIDTH];
    let idx = |c: usize, y: usize, x: usize| c * PIECE_GRID_HEIGHT * PIECE_GRID_WIDTH + y * PIECE_GRID_WIDTH + x;

    let own_pos = game.board.player_position(to_move);
    planes[idx(0, own_pos.y(), own_pos.x())] = 1.0;
    let opp_pos = game.board.player_position(to_move.opponent());
    planes[idx(1, opp_pos.y(), opp_pos.x())] = 1.0;

    for x in 0..WALL_GRID_WIDTH {
        for y in 0..WALL_GRID_HEIGHT {
            match game.board.walls[x][y] {
                Some(WallOrientation::Horizontal) => planes[idx(2, y, x)] = 1.0,
                Some(WallOrientation::Vertical) => planes[idx(3, y, x)] = 1.0,
                None => {}
            }
        }
    }

    let own_walls = game.walls_left[to_move.as_index()] as f32 / 10.0;
    let opp_walls = game.walls_left[to_move.opponent().as_index()] as f32 / 10.0;
    for y in 0..PIECE_GRID_HEIGHT {
        for x in 0..PIECE_GRID_WIDTH {
            planes[idx(4, y, x)] = own_walls;
            planes[idx(5, y, x)] = opp_walls;
        }
    }

    EncodedState::new(planes, INPUT_SHAPE.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_pawns_at_their_starting_squares() {
        let game = Game::new();
        let encoded = encode(&game, Player::A);
        assert_eq!(encoded.shape, INPUT_SHAPE.to_vec());
        let idx = |c: usize, y: usize, x: usize| c * PIECE_GRID_HEIGHT * PIECE_GRID_WIDTH + y * PIECE_GRID_WIDTH + x;
        assert_eq!(encoded.data[idx(0, 0, 4)], 1.0);
        assert_eq!(encoded.data[idx(1, 8, 4)], 1.0);
    }
}
