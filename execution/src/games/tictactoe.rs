//! Tic-tac-toe against the house.
//!
//! The player is X and moves first with `move-N` (1..=9, row-major). The house plays O with a
//! fixed priority: win now, block now, center, a random free corner, a random free edge.
//! A win pays 2x, a draw refunds the stake.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const WIN_MULTIPLIER: u64 = 20_000;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];
const CENTER: usize = 4;
const CORNERS: [usize; 4] = [0, 2, 6, 8];
const EDGES: [usize; 4] = [1, 3, 5, 7];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Mark {
    #[default]
    #[serde(rename = " ")]
    Empty,
    X,
    O,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TicTacToeState {
    pub board: [Mark; 9],
    pub winner: Option<Mark>,
    pub draw: bool,
    pub last_house_move: Option<usize>,
}

pub fn winner(board: &[Mark; 9]) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| {
        let mark = board[*a];
        (mark != Mark::Empty && mark == board[*b] && mark == board[*c]).then_some(mark)
    })
}

fn is_full(board: &[Mark; 9]) -> bool {
    board.iter().all(|m| *m != Mark::Empty)
}

/// A free cell that completes a line for `mark`.
fn completing_move(board: &[Mark; 9], mark: Mark) -> Option<usize> {
    LINES.iter().find_map(|line| {
        let owned = line.iter().filter(|i| board[**i] == mark).count();
        let free: Vec<usize> = line
            .iter()
            .copied()
            .filter(|i| board[*i] == Mark::Empty)
            .collect();
        (owned == 2 && free.len() == 1).then(|| free[0])
    })
}

fn random_free(board: &[Mark; 9], cells: &[usize], rng: &mut GameRng) -> Option<usize> {
    let free: Vec<usize> = cells
        .iter()
        .copied()
        .filter(|i| board[*i] == Mark::Empty)
        .collect();
    if free.is_empty() {
        return None;
    }
    Some(free[rng.next_below(free.len() as u32) as usize])
}

/// House move for O.
pub fn house_move(board: &[Mark; 9], rng: &mut GameRng) -> Option<usize> {
    completing_move(board, Mark::O)
        .or_else(|| completing_move(board, Mark::X))
        .or_else(|| (board[CENTER] == Mark::Empty).then_some(CENTER))
        .or_else(|| random_free(board, &CORNERS, rng))
        .or_else(|| random_free(board, &EDGES, rng))
}

pub struct TicTacToe;

impl ArcadeGame for TicTacToe {
    fn start(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::TicTacToe(TicTacToeState::default());
        Ok(GameResult::Continue(logging::single(json!({"turn": "x"}))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let cell = action.indexed("move", 9).ok_or(GameError::InvalidAction)? as usize - 1;
        let bet = session.bet;
        let GameState::TicTacToe(state) = &mut session.state else {
            return Err(GameError::InvalidState);
        };
        if state.winner.is_some() || state.draw {
            return Err(GameError::GameAlreadyComplete);
        }
        if state.board[cell] != Mark::Empty {
            return Err(GameError::InvalidMove);
        }

        state.board[cell] = Mark::X;
        if winner(&state.board) == Some(Mark::X) {
            state.winner = Some(Mark::X);
            let payout = apply_multiplier(bet, WIN_MULTIPLIER);
            return Ok(GameResult::Win(
                payout,
                logging::single(json!({"player": cell + 1, "outcome": "win"})),
            ));
        }
        if is_full(&state.board) {
            state.draw = true;
            return Ok(GameResult::Push(
                bet,
                logging::single(json!({"player": cell + 1, "outcome": "draw"})),
            ));
        }

        let reply = house_move(&state.board, rng).ok_or(GameError::InvalidState)?;
        state.board[reply] = Mark::O;
        state.last_house_move = Some(reply);
        let log = |outcome: &str| {
            logging::single(json!({"player": cell + 1, "house": reply + 1, "outcome": outcome}))
        };
        if winner(&state.board) == Some(Mark::O) {
            state.winner = Some(Mark::O);
            return Ok(GameResult::Loss(log("loss")));
        }
        if is_full(&state.board) {
            state.draw = true;
            return Ok(GameResult::Push(bet, log("draw")));
        }
        Ok(GameResult::Continue(log("continue")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::GameType;

    fn board(layout: &str) -> [Mark; 9] {
        let mut board = [Mark::Empty; 9];
        for (i, c) in layout.chars().enumerate() {
            board[i] = match c {
                'X' => Mark::X,
                'O' => Mark::O,
                _ => Mark::Empty,
            };
        }
        board
    }

    #[test]
    fn test_house_takes_immediate_win() {
        // O can complete the top row or block the middle row; winning comes first.
        let b = board("OO.XX....");
        assert_eq!(house_move(&b, &mut GameRng::from_values([])), Some(2));
    }

    #[test]
    fn test_house_blocks() {
        let b = board("XX..O....");
        assert_eq!(house_move(&b, &mut GameRng::from_values([])), Some(2));
    }

    #[test]
    fn test_center_taken_house_picks_corner() {
        let mut session = test_session(GameType::TicTacToe, 100);
        TicTacToe::start(&mut session, &mut GameRng::from_values([])).unwrap();
        for pick in 0..4 {
            let mut session = session.clone();
            let mut rng = GameRng::from_values([pick]);
            TicTacToe::apply_action(&mut session, PlayerId(1), &GameAction::new("move-5"), &mut rng)
                .unwrap();
            let GameState::TicTacToe(state) = &session.state else {
                panic!("wrong state");
            };
            let reply = state.last_house_move.unwrap();
            assert!(CORNERS.contains(&reply), "house played {reply}");
        }
    }

    #[test]
    fn test_house_prefers_center() {
        let b = board("X........");
        assert_eq!(house_move(&b, &mut GameRng::from_values([])), Some(CENTER));
    }

    #[test]
    fn test_player_win_pays_double() {
        let mut session = test_session(GameType::TicTacToe, 100);
        session.state = GameState::TicTacToe(TicTacToeState {
            board: board("XX.OO...."),
            ..Default::default()
        });
        let result = TicTacToe::apply_action(
            &mut session,
            PlayerId(1),
            &GameAction::new("move-3"),
            &mut GameRng::from_values([]),
        )
        .unwrap();
        assert!(matches!(result, GameResult::Win(200, _)));
    }

    #[test]
    fn test_draw_refunds() {
        let mut session = test_session(GameType::TicTacToe, 100);
        // X O X / X O O / O X .  -> X fills the last cell without a line.
        session.state = GameState::TicTacToe(TicTacToeState {
            board: board("XOXXOOOX."),
            ..Default::default()
        });
        let result = TicTacToe::apply_action(
            &mut session,
            PlayerId(1),
            &GameAction::new("move-9"),
            &mut GameRng::from_values([]),
        )
        .unwrap();
        assert!(matches!(result, GameResult::Push(100, _)));
    }

    #[test]
    fn test_occupied_cell_rejected() {
        let mut session = test_session(GameType::TicTacToe, 100);
        session.state = GameState::TicTacToe(TicTacToeState {
            board: board("X...O...."),
            ..Default::default()
        });
        assert_eq!(
            TicTacToe::apply_action(
                &mut session,
                PlayerId(1),
                &GameAction::new("move-5"),
                &mut GameRng::from_values([]),
            ),
            Err(GameError::InvalidMove)
        );
    }
}
