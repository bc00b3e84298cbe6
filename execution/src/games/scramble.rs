//! Word scramble.
//!
//! Up to four rounds with words of increasing length and a 30 s countdown each. A correct
//! `answer` moves to `won_round`, where the player picks `continue` or `cashout`. Once a round is
//! cleared, `cashout` is also accepted mid-round and pays the banked multiplier. A wrong answer or
//! a timeout loses the stake. Clearing the last round cashes out automatically.

use super::{
    apply_multiplier, ensure_initiator, logging, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const ROUND_TIMEOUT_MS: u64 = 30_000;

/// Multiplier (bps) after clearing round `i + 1`.
pub const ROUND_MULTIPLIERS: [u64; 4] = [15_000, 20_000, 30_000, 50_000];

const WORDS: [&[&str]; 4] = [
    &["game", "coin", "dice", "luck", "play", "chip", "card", "star"],
    &["poker", "chips", "token", "prize", "level", "bonus", "stake", "jolly"],
    &["wizard", "rocket", "planet", "castle", "dragon", "puzzle", "casino", "shield"],
    &["jackpot", "fortune", "diamond", "victory", "mystery", "channel", "balance", "winning"],
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScramblePhase {
    #[default]
    Guessing,
    WonRound,
    Finished,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScrambleState {
    pub phase: ScramblePhase,
    /// 1-based round number.
    pub round: u8,
    pub scrambled: String,
    #[serde(skip)]
    pub word: String,
    pub multiplier_bps: u64,
}

fn deal_round(state: &mut ScrambleState, round: u8, rng: &mut GameRng) {
    let bank = WORDS[(round as usize - 1).min(WORDS.len() - 1)];
    let word = bank[rng.next_below(bank.len() as u32) as usize];
    let mut letters: Vec<char> = word.chars().collect();
    for _ in 0..4 {
        rng.shuffle(&mut letters);
        if letters.iter().collect::<String>() != word {
            break;
        }
    }
    let mut scrambled: String = letters.iter().collect();
    if scrambled == word {
        scrambled = word.chars().rev().collect();
    }
    state.phase = ScramblePhase::Guessing;
    state.round = round;
    state.word = word.to_string();
    state.scrambled = scrambled;
}

fn state_mut(session: &mut GameSession) -> Result<&mut ScrambleState, GameError> {
    match &mut session.state {
        GameState::WordScramble(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

pub struct WordScramble;

impl ArcadeGame for WordScramble {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
        let mut state = ScrambleState::default();
        deal_round(&mut state, 1, rng);
        let log = logging::single(json!({"round": 1, "scrambled": state.scrambled}));
        session.state = GameState::WordScramble(state);
        session.arm_timer(ROUND_TIMEOUT_MS);
        Ok(GameResult::Continue(log))
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

        match (state.phase, action.token.as_str()) {
            (ScramblePhase::Guessing, "answer") => {
                let answer = action.value()?.to_lowercase();
                if answer != state.word {
                    state.phase = ScramblePhase::Finished;
                    return Ok(GameResult::Loss(logging::single(json!({
                        "round": state.round,
                        "answer": answer,
                        "word": state.word,
                    }))));
                }
                let cleared = state.round as usize;
                state.multiplier_bps = ROUND_MULTIPLIERS[cleared - 1];
                if cleared == ROUND_MULTIPLIERS.len() {
                    state.phase = ScramblePhase::Finished;
                    let payout = apply_multiplier(bet, state.multiplier_bps);
                    return Ok(GameResult::Win(
                        payout,
                        logging::single(json!({"round": cleared, "payout": payout})),
                    ));
                }
                state.phase = ScramblePhase::WonRound;
                Ok(GameResult::Continue(logging::single(json!({
                    "round": cleared,
                    "multiplier_bps": state.multiplier_bps,
                }))))
            }
            (ScramblePhase::WonRound, "continue") => {
                let next = state.round + 1;
                deal_round(state, next, rng);
                let log = logging::single(json!({"round": next, "scrambled": state.scrambled}));
                session.arm_timer(ROUND_TIMEOUT_MS);
                Ok(GameResult::Continue(log))
            }
            (ScramblePhase::WonRound, "cashout") | (ScramblePhase::Guessing, "cashout")
                if state.multiplier_bps > 0 =>
            {
                state.phase = ScramblePhase::Finished;
                let payout = apply_multiplier(bet, state.multiplier_bps);
                Ok(GameResult::Win(
                    payout,
                    logging::single(json!({
                        "action": "cashout",
                        "round": state.round,
                        "payout": payout,
                    })),
                ))
            }
            (_, "answer" | "continue" | "cashout") => Err(GameError::WrongPhase),
            _ => Err(GameError::InvalidAction),
        }
    }

    fn on_timeout(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        let state = state_mut(session)?;
        if state.phase != ScramblePhase::Guessing {
            return Err(GameError::WrongPhase);
        }
        state.phase = ScramblePhase::Finished;
        Ok(GameResult::Loss(logging::single(json!({
            "round": state.round,
            "timeout": true,
            "word": state.word,
        }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::{GameType, SessionId};

    fn started() -> GameSession {
        let mut session = test_session(GameType::WordScramble, 100);
        WordScramble::start(&mut session, &mut GameRng::new(7, SessionId(1), 0)).unwrap();
        session
    }

    fn word(session: &GameSession) -> String {
        match &session.state {
            GameState::WordScramble(state) => state.word.clone(),
            _ => panic!("wrong state"),
        }
    }

    fn answer(session: &mut GameSession, text: &str) -> Result<GameResult, GameError> {
        WordScramble::apply_action(
            session,
            PlayerId(1),
            &GameAction::new("answer").with_value(text),
            &mut GameRng::from_values([]),
        )
    }

    #[test]
    fn test_start_arms_timer_and_hides_word() {
        let session = started();
        assert_eq!(session.pending_timer, Some(ROUND_TIMEOUT_MS));
        let GameState::WordScramble(state) = &session.state else {
            panic!("wrong state");
        };
        assert_eq!(state.word.len(), 4);
        assert_ne!(state.scrambled, state.word);

        let view = serde_json::to_value(&session.state).unwrap();
        assert!(view["state"].get("word").is_none());
    }

    #[test]
    fn test_round_one_then_cashout_pays_one_and_a_half() {
        let mut session = started();
        let target = word(&session).to_uppercase();
        let result = answer(&mut session, &target).unwrap();
        assert!(matches!(result, GameResult::Continue(_)));

        let result = WordScramble::apply_action(
            &mut session,
            PlayerId(1),
            &GameAction::new("cashout"),
            &mut GameRng::from_values([]),
        )
        .unwrap();
        assert!(matches!(result, GameResult::Win(150, _)));
        let GameState::WordScramble(state) = &session.state else {
            panic!("wrong state");
        };
        assert_eq!(state.round, 1);
    }

    #[test]
    fn test_cashout_mid_round_keeps_banked_multiplier() {
        let mut session = started();
        let target = word(&session);
        answer(&mut session, &target).unwrap();
        WordScramble::apply_action(
            &mut session,
            PlayerId(1),
            &GameAction::new("continue"),
            &mut GameRng::new(3, SessionId(1), 2),
        )
        .unwrap();

        let result = WordScramble::apply_action(
            &mut session,
            PlayerId(1),
            &GameAction::new("cashout"),
            &mut GameRng::from_values([]),
        )
        .unwrap();
        assert!(matches!(result, GameResult::Win(150, _)));
        let GameState::WordScramble(state) = &session.state else {
            panic!("wrong state");
        };
        assert_eq!(state.phase, ScramblePhase::Finished);
        assert_eq!(state.round, 2);
    }

    #[test]
    fn test_continue_deals_longer_word() {
        let mut session = started();
        let target = word(&session);
        answer(&mut session, &target).unwrap();
        session.pending_timer = None;
        WordScramble::apply_action(
            &mut session,
            PlayerId(1),
            &GameAction::new("continue"),
            &mut GameRng::new(3, SessionId(1), 2),
        )
        .unwrap();
        assert_eq!(word(&session).len(), 5);
        assert_eq!(session.pending_timer, Some(ROUND_TIMEOUT_MS));
    }

    #[test]
    fn test_wrong_answer_loses() {
        let mut session = started();
        assert!(matches!(answer(&mut session, "zzzz"), Ok(GameResult::Loss(_))));
    }

    #[test]
    fn test_all_rounds_auto_cash_out() {
        let mut session = started();
        for round in 1..=4 {
            let target = word(&session);
            let result = answer(&mut session, &target).unwrap();
            if round < 4 {
                WordScramble::apply_action(
                    &mut session,
                    PlayerId(1),
                    &GameAction::new("continue"),
                    &mut GameRng::new(5, SessionId(1), round),
                )
                .unwrap();
            } else {
                assert!(matches!(result, GameResult::Win(500, _)));
            }
        }
    }

    #[test]
    fn test_timeout_only_while_guessing() {
        let mut session = started();
        let result = WordScramble::on_timeout(&mut session, &mut GameRng::from_values([])).unwrap();
        assert!(matches!(result, GameResult::Loss(_)));

        let mut session = started();
        let target = word(&session);
        answer(&mut session, &target).unwrap();
        assert_eq!(
            WordScramble::on_timeout(&mut session, &mut GameRng::from_values([])),
            Err(GameError::WrongPhase)
        );
    }

    #[test]
    fn test_phase_checks() {
        let mut session = started();
        assert_eq!(
            WordScramble::apply_action(
                &mut session,
                PlayerId(1),
                &GameAction::new("cashout"),
                &mut GameRng::from_values([]),
            ),
            Err(GameError::WrongPhase)
        );
        assert_eq!(
            answer(&mut session, "   "),
            Err(GameError::MissingValue)
        );
    }
}
