//! Quiz battle: five trivia questions head-to-head.
//!
//! Uses the shared challenge protocol. Each question runs for 15 s. The first correct
//! `answer-N` scores and advances; a wrong answer locks that player out of the question. When
//! both players are locked out, or the clock runs out, the question passes without a point.
//! The higher score takes the pot; a tie returns both stakes.

use super::{
    apply_multiplier, lobby, logging, questions, ArcadeGame, GameAction, GameError, GameResult,
    GameRng, GameState,
};
use crate::session::GameSession;
use arcade_types::PlayerId;
use serde::Serialize;
use serde_json::json;

pub const QUESTION_COUNT: usize = 5;
pub const QUESTION_TIMEOUT_MS: u64 = 15_000;
pub const POT_MULTIPLIER: u64 = 20_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    #[default]
    Waiting,
    Question,
    Finished,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QuizBattleState {
    pub phase: QuizPhase,
    pub questions: Vec<questions::Question>,
    /// Index into `questions`.
    pub current: usize,
    pub scores: [u32; 2],
    pub locked_out: [bool; 2],
}

fn state_mut(session: &mut GameSession) -> Result<&mut QuizBattleState, GameError> {
    match &mut session.state {
        GameState::QuizBattle(state) => Ok(state),
        _ => Err(GameError::InvalidState),
    }
}

/// Move to the next question or settle the match.
fn advance(session: &mut GameSession, mut logs: Vec<String>) -> Result<GameResult, GameError> {
    let players = session.players.clone();
    let bet = session.bet;
    let state = state_mut(session)?;
    state.current += 1;
    state.locked_out = [false; 2];

    if state.current < state.questions.len() {
        logs.push(logging::entry(json!({
            "question": state.current + 1,
            "scores": state.scores,
        })));
        session.arm_timer(QUESTION_TIMEOUT_MS);
        return Ok(GameResult::Continue(logs));
    }

    state.phase = QuizPhase::Finished;
    let [left, right] = state.scores;
    logs.push(logging::entry(json!({"final_scores": state.scores})));
    if players.len() < 2 {
        return Err(GameError::InvalidState);
    }
    Ok(match left.cmp(&right) {
        std::cmp::Ordering::Equal => GameResult::Settled {
            payouts: vec![(players[0], bet), (players[1], bet)],
            winner: None,
            logs,
        },
        ordering => {
            let winner = if ordering == std::cmp::Ordering::Greater {
                players[0]
            } else {
                players[1]
            };
            GameResult::Settled {
                payouts: vec![(winner, apply_multiplier(bet, POT_MULTIPLIER))],
                winner: Some(winner),
                logs,
            }
        }
    })
}

pub struct QuizBattle;

impl ArcadeGame for QuizBattle {
    fn start(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        session.state = GameState::QuizBattle(QuizBattleState::default());
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
            (QuizPhase::Waiting, lobby::ACCEPT) => {
                lobby::accept(session, actor)?;
                let state = state_mut(session)?;
                state.questions = questions::trivia_round(rng, QUESTION_COUNT);
                state.phase = QuizPhase::Question;
                state.current = 0;
                session.arm_timer(QUESTION_TIMEOUT_MS);
                Ok(GameResult::Continue(logging::single(json!({
                    "phase": "question",
                    "question": 1,
                }))))
            }
            (QuizPhase::Waiting, lobby::CANCEL) => {
                let result = lobby::cancel(session, actor)?;
                state_mut(session)?.phase = QuizPhase::Finished;
                Ok(result)
            }
            (QuizPhase::Question, _) => {
                let choice = action
                    .indexed("answer", questions::OPTION_COUNT as u8)
                    .ok_or(GameError::InvalidAction)?;
                let seat = lobby::seat(session, actor)?;
                let state = state_mut(session)?;
                if state.locked_out[seat] {
                    return Err(GameError::InvalidMove);
                }
                let question = state
                    .questions
                    .get(state.current)
                    .ok_or(GameError::InvalidState)?;
                let question_no = state.current + 1;

                if question.is_correct(choice) {
                    state.scores[seat] += 1;
                    let log = logging::entry(json!({
                        "question": question_no,
                        "scored": actor.0,
                    }));
                    return advance(session, vec![log]);
                }

                state.locked_out[seat] = true;
                let log = logging::entry(json!({
                    "question": question_no,
                    "locked_out": actor.0,
                }));
                if state.locked_out.iter().all(|locked| *locked) {
                    return advance(session, vec![log]);
                }
                Ok(GameResult::Continue(vec![log]))
            }
            (QuizPhase::Finished, _) => Err(GameError::GameAlreadyComplete),
            _ => Err(GameError::WrongPhase),
        }
    }

    fn on_timeout(session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        let state = state_mut(session)?;
        match state.phase {
            QuizPhase::Waiting => {
                state.phase = QuizPhase::Finished;
                Ok(lobby::expire())
            }
            QuizPhase::Question => {
                let log = logging::entry(json!({
                    "question": state.current + 1,
                    "timeout": true,
                }));
                advance(session, vec![log])
            }
            QuizPhase::Finished => Err(GameError::GameAlreadyComplete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_session;
    use arcade_types::{GameType, SessionId};

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    fn in_question() -> GameSession {
        let mut session = test_session(GameType::QuizBattle, 100);
        QuizBattle::start(&mut session, &mut GameRng::from_values([])).unwrap();
        session.players.push(BOB);
        session.escrowed.push(BOB);
        QuizBattle::apply_action(
            &mut session,
            BOB,
            &GameAction::new("accept"),
            &mut GameRng::new(4, SessionId(1), 1),
        )
        .unwrap();
        session
    }

    fn state(session: &GameSession) -> &QuizBattleState {
        match &session.state {
            GameState::QuizBattle(state) => state,
            _ => panic!("wrong state"),
        }
    }

    fn correct_token(session: &GameSession) -> String {
        let s = state(session);
        format!("answer-{}", s.questions[s.current].answer + 1)
    }

    fn wrong_token(session: &GameSession) -> String {
        let s = state(session);
        format!("answer-{}", (s.questions[s.current].answer + 1) % 4 + 1)
    }

    fn answer(
        session: &mut GameSession,
        actor: PlayerId,
        token: &str,
    ) -> Result<GameResult, GameError> {
        QuizBattle::apply_action(
            session,
            actor,
            &GameAction::new(token),
            &mut GameRng::from_values([]),
        )
    }

    #[test]
    fn test_accept_deals_five_questions() {
        let session = in_question();
        assert_eq!(state(&session).questions.len(), QUESTION_COUNT);
        assert_eq!(state(&session).phase, QuizPhase::Question);
        assert_eq!(session.pending_timer, Some(QUESTION_TIMEOUT_MS));
    }

    #[test]
    fn test_wrong_answer_locks_out_player() {
        let mut session = in_question();
        let wrong = wrong_token(&session);
        answer(&mut session, ALICE, &wrong).unwrap();
        assert_eq!(answer(&mut session, ALICE, &wrong), Err(GameError::InvalidMove));

        let correct = correct_token(&session);
        answer(&mut session, BOB, &correct).unwrap();
        assert_eq!(state(&session).scores, [0, 1]);
        assert_eq!(state(&session).current, 1);
        assert_eq!(state(&session).locked_out, [false, false]);
    }

    #[test]
    fn test_both_locked_out_advances_without_point() {
        let mut session = in_question();
        let wrong = wrong_token(&session);
        answer(&mut session, ALICE, &wrong).unwrap();
        answer(&mut session, BOB, &wrong).unwrap();
        assert_eq!(state(&session).current, 1);
        assert_eq!(state(&session).scores, [0, 0]);
    }

    #[test]
    fn test_higher_score_takes_pot() {
        let mut session = in_question();
        let mut last = None;
        for _ in 0..QUESTION_COUNT {
            let correct = correct_token(&session);
            last = Some(answer(&mut session, ALICE, &correct).unwrap());
        }
        match last {
            Some(GameResult::Settled { payouts, winner, .. }) => {
                assert_eq!(winner, Some(ALICE));
                assert_eq!(payouts, vec![(ALICE, 200)]);
            }
            other => panic!("expected settlement, got {other:?}"),
        }
        assert_eq!(
            answer(&mut session, BOB, "answer-1"),
            Err(GameError::GameAlreadyComplete)
        );
    }

    #[test]
    fn test_timeouts_to_a_tie_refund_both() {
        let mut session = in_question();
        let mut result = None;
        for _ in 0..QUESTION_COUNT {
            let outcome = QuizBattle::on_timeout(&mut session, &mut GameRng::from_values([]));
            result = Some(outcome.unwrap());
        }
        match result {
            Some(GameResult::Settled { payouts, winner, .. }) => {
                assert_eq!(winner, None);
                assert_eq!(payouts, vec![(ALICE, 100), (BOB, 100)]);
            }
            other => panic!("expected tie, got {other:?}"),
        }
    }

    #[test]
    fn test_waiting_phase_rules() {
        let mut session = test_session(GameType::QuizBattle, 100);
        QuizBattle::start(&mut session, &mut GameRng::from_values([])).unwrap();
        assert_eq!(answer(&mut session, ALICE, "answer-1"), Err(GameError::WrongPhase));
        assert_eq!(answer(&mut session, ALICE, "accept"), Err(GameError::SelfJoin));
        assert!(matches!(
            QuizBattle::on_timeout(&mut session, &mut GameRng::from_values([])),
            Ok(GameResult::Cancelled(_))
        ));
    }
}
