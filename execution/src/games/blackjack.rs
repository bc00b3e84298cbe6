//! Blackjack against a dealer who stands on every 17.
//!
//! Cards are drawn with replacement. A natural at the deal resolves immediately: 2.5x, or a push
//! when the dealer also holds one. A dealer natural against a normal hand loses at the deal.
//! Actions: `hit`, `stand`. A win pays 2x, a tie pushes, a bust loses.

use super::{
    apply_multiplier, cards, ensure_initiator, logging, ArcadeGame, GameAction, GameError,
    GameResult, GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const NATURAL_MULTIPLIER: u64 = 25_000;
pub const WIN_MULTIPLIER: u64 = 20_000;
pub const DEALER_STANDS_ON: u8 = 17;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackPhase {
    #[default]
    PlayerTurn,
    Complete,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BlackjackState {
    pub phase: BlackjackPhase,
    pub player: Vec<u8>,
    /// Dealer cards shown to the table (the hole card joins at reveal).
    pub dealer_visible: Vec<u8>,
    #[serde(skip)]
    pub dealer: Vec<u8>,
}

/// Returns `(total, is_soft)`.
pub fn hand_value(hand: &[u8]) -> (u8, bool) {
    let mut value: u16 = 0;
    let mut aces: u8 = 0;
    for &card in hand {
        let card_value = cards::blackjack_value(card);
        if card_value == 11 {
            aces += 1;
        }
        value += card_value as u16;
    }
    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }
    (value.min(255) as u8, aces > 0 && value <= 21)
}

pub fn is_natural(hand: &[u8]) -> bool {
    hand.len() == 2 && hand_value(hand).0 == 21
}

fn reveal(state: &mut BlackjackState) {
    state.dealer_visible = state.dealer.clone();
    state.phase = BlackjackPhase::Complete;
}

fn hands_log(state: &BlackjackState, outcome: &str, payout: u64) -> Vec<String> {
    logging::single(json!({
        "player": state.player.iter().map(|c| cards::card_label(*c)).collect::<Vec<_>>(),
        "player_total": hand_value(&state.player).0,
        "dealer": state.dealer_visible.iter().map(|c| cards::card_label(*c)).collect::<Vec<_>>(),
        "dealer_total": hand_value(&state.dealer_visible).0,
        "outcome": outcome,
        "payout": payout,
    }))
}

/// Dealer draws to 17 and the hands are compared.
fn settle(state: &mut BlackjackState, bet: u64, rng: &mut GameRng) -> GameResult {
    while hand_value(&state.dealer).0 < DEALER_STANDS_ON {
        state.dealer.push(rng.draw_card());
    }
    reveal(state);
    let player = hand_value(&state.player).0;
    let dealer = hand_value(&state.dealer).0;
    if dealer > 21 || player > dealer {
        let payout = apply_multiplier(bet, WIN_MULTIPLIER);
        GameResult::Win(payout, hands_log(state, "win", payout))
    } else if player == dealer {
        GameResult::Push(bet, hands_log(state, "push", bet))
    } else {
        GameResult::Loss(hands_log(state, "loss", 0))
    }
}

fn state_mut(session: &mut GameSession) -> Result<&mut BlackjackState, GameError> {
    match &mut session.state {
        GameState::Blackjack(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

pub struct Blackjack;

impl ArcadeGame for Blackjack {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let player = vec![rng.draw_card(), rng.draw_card()];
        let dealer = vec![rng.draw_card(), rng.draw_card()];
        let mut state = BlackjackState {
            phase: BlackjackPhase::PlayerTurn,
            dealer_visible: vec![dealer[0]],
            player,
            dealer,
        };
        let bet = session.bet;

        let result = match (is_natural(&state.player), is_natural(&state.dealer)) {
            (true, true) => {
                reveal(&mut state);
                GameResult::Push(bet, hands_log(&state, "push", bet))
            }
            (true, false) => {
                reveal(&mut state);
                let payout = apply_multiplier(bet, NATURAL_MULTIPLIER);
                GameResult::Win(payout, hands_log(&state, "blackjack", payout))
            }
            (false, true) => {
                reveal(&mut state);
                GameResult::Loss(hands_log(&state, "dealer_blackjack", 0))
            }
            (false, false) => GameResult::Continue(hands_log(&state, "deal", 0)),
        };
        session.state = GameState::Blackjack(state);
        Ok(result)
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        ensure_initiator(session, actor)?;
        let bet = session.bet;
        let state = state_mut(session)?;
        if state.phase == BlackjackPhase::Complete {
            return Err(GameError::GameAlreadyComplete);
        }

        match action.token.as_str() {
            "hit" => {
                state.player.push(rng.draw_card());
                let total = hand_value(&state.player).0;
                if total > 21 {
                    reveal(state);
                    return Ok(GameResult::Loss(hands_log(state, "bust", 0)));
                }
                if total == 21 {
                    return Ok(settle(state, bet, rng));
                }
                Ok(GameResult::Continue(hands_log(state, "hit", 0)))
            }
            "stand" => Ok(settle(state, bet, rng)),
            _ => Err(GameError::InvalidAction),
        }
    }
}
