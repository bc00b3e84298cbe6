//! Duel: a head-to-head fight for the pot.
//!
//! After the challenge is accepted both players start at 100 HP and the challenger acts first.
//! `attack` deals 10..=20, `special` deals 25..=35 once per player, `defend` takes a flat 10 off
//! the next hit received. Each turn has a 30 s clock; running it out forfeits. The survivor
//! collects both stakes.

use super::{
    apply_multiplier, lobby, logging, ArcadeGame, GameAction, GameError, GameResult, GameRng,
    GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const STARTING_HP: u32 = 100;
pub const TURN_TIMEOUT_MS: u64 = 30_000;
pub const DEFEND_REDUCTION: u32 = 10;
pub const POT_MULTIPLIER: u64 = 20_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelPhase {
    #[default]
    Waiting,
    Combat,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelMove {
    Attack,
    Special,
    Defend,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuelState {
    pub phase: DuelPhase,
    pub hp: [u32; 2],
    /// Seat whose move it is.
    pub turn: usize,
    pub special_used: [bool; 2],
    pub defending: [bool; 2],
    pub winner: Option<PlayerId>,
    pub last_event: Option<String>,
}

impl Default for DuelState {
    fn default() -> Self {
        Self {
            phase: DuelPhase::Waiting,
            hp: [STARTING_HP; 2],
            turn: 0,
            special_used: [false; 2],
            defending: [false; 2],
            winner: None,
            last_event: None,
        }
    }
}

fn state_mut(session: &mut GameSession) -> Result<&mut DuelState, GameError> {
    match &mut session.state {
        GameState::Duel(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

fn victory(
    session: &GameSession,
    winner_seat: usize,
    reason: &str,
    mut logs: Vec<String>,
) -> GameResult {
    let winner = session.players[winner_seat];
    let payout = apply_multiplier(session.bet, POT_MULTIPLIER);
    logs.push(logging::entry(json!({
        "winner": winner.0,
        "reason": reason,
        "payout": payout,
    })));
    GameResult::Settled {
        payouts: vec![(winner, payout)],
        winner: Some(winner),
        logs,
    }
}

pub struct Duel;

impl ArcadeGame for Duel {
    fn start(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::Duel(DuelState::default());
        Ok(lobby::open(session))
    }

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError> {
        let phase = state_mut(session)?.phase;
        match (phase, action.token.as_str()) {
            (DuelPhase::Waiting, lobby::ACCEPT) => {
                lobby::accept(session, actor)?;
                let state = state_mut(session)?;
                state.phase = DuelPhase::Combat;
                state.turn = 0;
                session.arm_timer(TURN_TIMEOUT_MS);
                Ok(GameResult::Continue(logging::single(json!({
                    "phase": "combat",
                    "opponent": actor.0,
                }))))
            }
            (DuelPhase::Waiting, lobby::CANCEL) => {
                let result = lobby::cancel(session, actor)?;
                state_mut(session)?.phase = DuelPhase::Finished;
                Ok(result)
            }
            (DuelPhase::Combat, token) => {
                let duel_move = match token {
                    "attack" => DuelMove::Attack,
                    "special" => DuelMove::Special,
                    "defend" => DuelMove::Defend,
                    _ => return Err(GameError::InvalidAction),
                };
                let seat = lobby::seat(session, actor)?;
                let state = state_mut(session)?;
                if seat != state.turn {
                    return Err(GameError::NotYourTurn);
                }
                if duel_move == DuelMove::Special && state.special_used[seat] {
                    return Err(GameError::InvalidMove);
                }

                let target = 1 - seat;
                let raw = match duel_move {
                    DuelMove::Attack => rng.range_inclusive(10, 20),
                    DuelMove::Special => {
                        state.special_used[seat] = true;
                        rng.range_inclusive(25, 35)
                    }
                    DuelMove::Defend => {
                        state.defending[seat] = true;
                        0
                    }
                };
                let damage = if duel_move == DuelMove::Defend {
                    0
                } else if state.defending[target] {
                    state.defending[target] = false;
                    raw.saturating_sub(DEFEND_REDUCTION)
                } else {
                    raw
                };
                state.hp[target] = state.hp[target].saturating_sub(damage);
                state.last_event = Some(format!("{duel_move:?}:{damage}").to_lowercase());
                let log = json!({
                    "actor": actor.0,
                    "move": duel_move,
                    "damage": damage,
                    "hp": state.hp,
                });

                if state.hp[target] == 0 {
                    state.phase = DuelPhase::Finished;
                    state.winner = Some(actor);
                    return Ok(victory(session, seat, "knockout", vec![logging::entry(log)]));
                }
                state.turn = target;
                session.arm_timer(TURN_TIMEOUT_MS);
                Ok(GameResult::Continue(vec![logging::entry(log)]))
            }
            (DuelPhase::Finished, _) => Err(GameError::GameAlreadyComplete),
            _ => Err(GameError::WrongPhase),
        }
    }

    fn on_timeout(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        let players = session.players.clone();
        let state = state_mut(session)?;
        match state.phase {
            DuelPhase::Waiting => {
                state.phase = DuelPhase::Finished;
                Ok(lobby::expire())
            }
            DuelPhase::Combat => {
                if players.len() < 2 {
                    return Err(GameError::InvalidState);
                }
                let winner_seat = 1 - state.turn;
                state.phase = DuelPhase::Finished;
                state.winner = Some(players[winner_seat]);
                Ok(victory(session, winner_seat, "forfeit", Vec::new()))
            }
            DuelPhase::Finished => Err(GameError::GameAlreadyComplete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::GameType;

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    fn act(
        session: &mut GameSession,
        actor: PlayerId,
        token: &str,
        rolls: &[u32],
    ) -> Result<GameResult, GameError> {
        Duel::apply_action(
            session,
            actor,
            &GameAction::new(token),
            &mut GameRng::from_values(rolls.iter().copied()),
        )
    }

    fn in_combat() -> GameSession {
        let mut session = test_session(GameType::Duel, 100);
        Duel::start(&mut session, &mut GameRng::from_values([])).unwrap();
        session.players.push(BOB);
        session.escrowed.push(BOB);
        act(&mut session, BOB, "accept", &[]).unwrap();
        session
    }

    fn state(session: &GameSession) -> &DuelState {
        match &session.state {
            GameState::Duel(state) => state,
            _ => panic!("wrong state"),
        }
    }

    #[test]
    fn test_accept_starts_combat_with_challenger_first() {
        let session = in_combat();
        assert_eq!(state(&session).phase, DuelPhase::Combat);
        assert_eq!(state(&session).turn, 0);
        assert_eq!(session.pending_timer, Some(TURN_TIMEOUT_MS));
    }

    #[test]
    fn test_turn_order_enforced() {
        let mut session = in_combat();
        assert_eq!(act(&mut session, BOB, "attack", &[0]), Err(GameError::NotYourTurn));
        assert_eq!(
            act(&mut session, PlayerId(3), "attack", &[0]),
            Err(GameError::NotParticipant)
        );
        // 10 + (5 % 11)
        act(&mut session, ALICE, "attack", &[5]).unwrap();
        assert_eq!(state(&session).hp, [100, 85]);
        assert_eq!(state(&session).turn, 1);
    }

    #[test]
    fn test_special_once_per_player() {
        let mut session = in_combat();
        act(&mut session, ALICE, "special", &[0]).unwrap();
        assert_eq!(state(&session).hp[1], 75);
        act(&mut session, BOB, "defend", &[]).unwrap();
        assert_eq!(act(&mut session, ALICE, "special", &[0]), Err(GameError::InvalidMove));
    }

    #[test]
    fn test_defend_reduces_next_hit_once() {
        let mut session = in_combat();
        act(&mut session, ALICE, "defend", &[]).unwrap();
        // Bob hits for 12, reduced to 2.
        act(&mut session, BOB, "attack", &[2]).unwrap();
        assert_eq!(state(&session).hp[0], 98);
        act(&mut session, ALICE, "attack", &[0]).unwrap();
        act(&mut session, BOB, "attack", &[2]).unwrap();
        assert_eq!(state(&session).hp[0], 86);
    }

    #[test]
    fn test_knockout_settles_once_with_whole_pot() {
        let mut session = in_combat();
        let mut result = None;
        for _ in 0..20 {
            // Alice hits for 20, Bob for 10.
            let outcome = act(&mut session, ALICE, "attack", &[10]).unwrap();
            if outcome.is_terminal() {
                result = Some(outcome);
                break;
            }
            act(&mut session, BOB, "attack", &[0]).unwrap();
        }
        match result {
            Some(GameResult::Settled { payouts, winner, .. }) => {
                assert_eq!(winner, Some(ALICE));
                assert_eq!(payouts, vec![(ALICE, 200)]);
            }
            other => panic!("expected knockout, got {other:?}"),
        }
        assert_eq!(state(&session).hp[1], 0);
        assert_eq!(
            act(&mut session, BOB, "attack", &[0]),
            Err(GameError::GameAlreadyComplete)
        );
    }

    #[test]
    fn test_turn_timeout_forfeits_idle_player() {
        let mut session = in_combat();
        act(&mut session, ALICE, "attack", &[0]).unwrap();
        let result = Duel::on_timeout(&mut session, &mut GameRng::from_values([])).unwrap();
        match result {
            GameResult::Settled { winner, payouts, .. } => {
                assert_eq!(winner, Some(ALICE));
                assert_eq!(payouts, vec![(ALICE, 200)]);
            }
            other => panic!("expected forfeit, got {other:?}"),
        }
    }

    #[test]
    fn test_waiting_timeout_and_cancel() {
        let mut session = test_session(GameType::Duel, 100);
        Duel::start(&mut session, &mut GameRng::from_values([])).unwrap();
        assert_eq!(session.pending_timer, Some(lobby::ACCEPT_TIMEOUT_MS));
        assert!(matches!(
            Duel::on_timeout(&mut session.clone(), &mut GameRng::from_values([])),
            Ok(GameResult::Cancelled(_))
        ));
        assert_eq!(act(&mut session, BOB, "cancel", &[]), Err(GameError::NotParticipant));
        assert_eq!(act(&mut session, ALICE, "attack", &[]), Err(GameError::WrongPhase));
        assert!(matches!(act(&mut session, ALICE, "cancel", &[]), Ok(GameResult::Cancelled(_))));
        assert_eq!(
            act(&mut session, ALICE, "cancel", &[]),
            Err(GameError::GameAlreadyComplete)
        );
    }
}
