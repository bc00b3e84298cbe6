//! Connect four against the house.
//!
//! 7 columns by 6 rows, `drop-N` with N in 1..=7. The house takes an immediate win, otherwise
//! blocks one, otherwise picks a non-full column weighted toward the center.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const WIN_MULTIPLIER: u64 = 20_000;
const COLUMN_WEIGHTS: [u32; COLS] = [1, 2, 3, 4, 3, 2, 1];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disc {
    #[default]
    Empty,
    Player,
    House,
}

/// `board[row][col]`, row 0 is the bottom.
pub type Board = [[Disc; COLS]; ROWS];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConnectFourState {
    pub board: Board,
    pub winner: Option<Disc>,
    pub draw: bool,
    pub last_house_column: Option<usize>,
}

fn drop_row(board: &Board, col: usize) -> Option<usize> {
    (0..ROWS).find(|row| board[*row][col] == Disc::Empty)
}

fn is_full(board: &Board) -> bool {
    (0..COLS).all(|col| drop_row(board, col).is_none())
}

/// Whether the disc at `(row, col)` is part of four in a row.
fn connects_four(board: &Board, row: usize, col: usize) -> bool {
    let disc = board[row][col];
    if disc == Disc::Empty {
        return false;
    }
    let run = |dr: isize, dc: isize| {
        let mut count = 0;
        let (mut r, mut c) = (row as isize + dr, col as isize + dc);
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && board[r as usize][c as usize] == disc
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    };
    [(0, 1), (1, 0), (1, 1), (1, -1)]
        .iter()
        .any(|(dr, dc)| 1 + run(*dr, *dc) + run(-dr, -dc) >= 4)
}

/// Column where dropping `disc` wins immediately.
fn winning_column(board: &Board, disc: Disc) -> Option<usize> {
    (0..COLS).find(|col| {
        let Some(row) = drop_row(board, *col) else {
            return false;
        };
        let mut trial = *board;
        trial[row][*col] = disc;
        connects_four(&trial, row, *col)
    })
}

/// House column choice.
pub fn house_column(board: &Board, rng: &mut GameRng) -> Option<usize> {
    if let Some(col) = winning_column(board, Disc::House) {
        return Some(col);
    }
    if let Some(col) = winning_column(board, Disc::Player) {
        return Some(col);
    }
    let weights: Vec<u32> = (0..COLS)
        .map(|col| {
            if drop_row(board, col).is_some() {
                COLUMN_WEIGHTS[col]
            } else {
                0
            }
        })
        .collect();
    rng.weighted_index(&weights)
}

pub struct ConnectFour;

impl ArcadeGame for ConnectFour {
    fn start(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::ConnectFour(ConnectFourState::default());
        Ok(GameResult::Continue(logging::single(json!({"turn": "player"}))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let col = action.indexed("drop", COLS as u8).ok_or(GameError::InvalidAction)? as usize - 1;
        let bet = session.bet;
        let GameState::ConnectFour(state) = &mut session.state else {
            return Err(GameError::InvalidState);
        };
        if state.winner.is_some() || state.draw {
            return Err(GameError::GameAlreadyComplete);
        }
        let row = drop_row(&state.board, col).ok_or(GameError::InvalidMove)?;

        state.board[row][col] = Disc::Player;
        if connects_four(&state.board, row, col) {
            state.winner = Some(Disc::Player);
            let payout = apply_multiplier(bet, WIN_MULTIPLIER);
            return Ok(GameResult::Win(
                payout,
                logging::single(json!({"player": col + 1, "outcome": "win"})),
            ));
        }
        if is_full(&state.board) {
            state.draw = true;
            return Ok(GameResult::Push(
                bet,
                logging::single(json!({"player": col + 1, "outcome": "draw"})),
            ));
        }

        let reply = house_column(&state.board, rng).ok_or(GameError::InvalidState)?;
        let reply_row = drop_row(&state.board, reply).ok_or(GameError::InvalidState)?;
        state.board[reply_row][reply] = Disc::House;
        state.last_house_column = Some(reply);
        let log = |outcome: &str| {
            logging::single(json!({"player": col + 1, "house": reply + 1, "outcome": outcome}))
        };
        if connects_four(&state.board, reply_row, reply) {
            state.winner = Some(Disc::House);
            return Ok(GameResult::Loss(log("loss")));
        }
        if is_full(&state.board) {
            state.draw = true;
            return Ok(GameResult::Push(bet, log("draw")));
        }
        Ok(GameResult::Continue(log("continue")))
    }
}
