//! Mystery box: nine boxes, two bombs.
//!
//! `open-N` reveals a box. Each safe box climbs the multiplier ladder; `cashout` is allowed after
//! the first safe box. Opening every safe box cashes out at the top of the ladder. A bomb loses
//! the stake.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const BOXES: usize = 9;
pub const BOMBS: usize = 2;
pub const LADDER: [u64; BOXES - BOMBS] = [12_000, 15_000, 20_000, 27_000, 36_000, 50_000, 75_000];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxView {
    #[default]
    Closed,
    Safe,
    Bomb,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MysteryBoxState {
    pub boxes: [BoxView; BOXES],
    #[serde(skip)]
    pub bombs: [usize; BOMBS],
    pub safe_opened: usize,
    pub finished: bool,
}

impl MysteryBoxState {
    pub fn multiplier_bps(&self) -> u64 {
        match self.safe_opened {
            0 => 0,
            n => LADDER[(n - 1).min(LADDER.len() - 1)],
        }
    }
}

fn state_mut(session: &mut GameSession) -> Result<&mut MysteryBoxState, GameError> {
    match &mut session.state {
        GameState::MysteryBox(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

pub struct MysteryBox;

impl ArcadeGame for MysteryBox {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let mut positions: Vec<usize> = (0..BOXES).collect();
        rng.shuffle(&mut positions);
        session.state = GameState::MysteryBox(MysteryBoxState {
            bombs: [positions[0], positions[1]],
            ..Default::default()
        });
        Ok(GameResult::Continue(logging::single(json!({
            "boxes": BOXES,
            "bombs": BOMBS,
        }))))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        _rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let bet = session.bet;
        let state = state_mut(session)?;
        if state.finished {
            return Err(GameError::GameAlreadyComplete);
        }

        if action.token == "cashout" {
            if state.safe_opened == 0 {
                return Err(GameError::InvalidMove);
            }
            state.finished = true;
            let payout = apply_multiplier(bet, state.multiplier_bps());
            return Ok(GameResult::Win(
                payout,
                logging::single(json!({
                    "action": "cashout",
                    "safe": state.safe_opened,
                    "payout": payout,
                })),
            ));
        }

        let index = action
            .indexed("open", BOXES as u8)
            .ok_or(GameError::InvalidAction)? as usize
            - 1;
        if state.boxes[index] != BoxView::Closed {
            return Err(GameError::InvalidMove);
        }

        if state.bombs.contains(&index) {
            state.boxes[index] = BoxView::Bomb;
            for bomb in state.bombs {
                state.boxes[bomb] = BoxView::Bomb;
            }
            state.finished = true;
            return Ok(GameResult::Loss(logging::single(json!({
                "opened": index + 1,
                "bomb": true,
            }))));
        }

        state.boxes[index] = BoxView::Safe;
        state.safe_opened += 1;
        let multiplier_bps = state.multiplier_bps();
        if state.safe_opened == LADDER.len() {
            state.finished = true;
            let payout = apply_multiplier(bet, multiplier_bps);
            return Ok(GameResult::Win(
                payout,
                logging::single(json!({"opened": index + 1, "cleared": true, "payout": payout})),
            ));
        }
        Ok(GameResult::Continue(logging::single(json!({
            "opened": index + 1,
            "safe": state.safe_opened,
            "multiplier_bps": multiplier_bps,
        }))))
    }
}
