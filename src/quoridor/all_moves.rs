//! The fixed action space every agent's choices are indices into.
//!
//! The teacher's own modules (`bot.rs`, `a_star.rs` callers, `nn_bot.rs`)
//! import `crate::all_moves::ALL_MOVES` but the pack never actually includes
//! that file; this is the author-from-call-sites reconstruction: 16 pawn
//! moves (one per direction/collision-direction pair) followed by one
//! `PlaceWall` per (orientation, grid cell).

use std::sync::OnceLock;

use crate::quoridor::data_model::{MovePiece, PlayerMove, WallOrientation, WallPosition, WALL_GRID_HEIGHT, WALL_GRID_WIDTH};

pub const ACTION_COUNT: usize = 16 + WALL_GRID_WIDTH * WALL_GRID_HEIGHT * 2;

pub fn all_moves() -> &'static Vec<PlayerMove> {
    static MOVES: OnceLock<Vec<PlayerMove>> = OnceLock::new();
    MOVES.get_or_init(|| {
        let mut moves: Vec<PlayerMove> = MovePiece::iter().map(PlayerMove::MovePiece).collect();
        for orientation in [WallOrientation::Horizontal, WallOrientation::Vertical] {
            for x in 0..WALL_GRID_WIDTH {
                for y in 0..WALL_GRID_HEIGHT {
                    moves.push(PlayerMove::PlaceWall { orientation, position: WallPosition { x, y } });
                }
            }
        }
        moves
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_count_matches_generated_length() {
        assert_eq!(all_moves().len(), ACTION_COUNT);
    }
}
