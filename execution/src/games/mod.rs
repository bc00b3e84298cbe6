//! Game state machines.
//!
//! Every game implements [`ArcadeGame`]: `start` runs once after escrow, `apply_action` runs for
//! each validated button press, and `on_timeout` runs when a countdown armed by the game fires
//! while still current. The session's `state` is a [`GameState`] tagged union; each game only
//! ever touches its own variant.
//!
//! Games never move money. They return a [`GameResult`] and the orchestrator settles it exactly
//! once.

use crate::session::GameSession;
use arcade_types::{GameType, PlayerId, SessionId};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error as ThisError;

pub mod blackjack;
pub mod cards;
pub mod coinflip;
pub mod connect_four;
pub mod daily_challenge;
pub mod dice;
pub mod duel;
pub mod hilo;
pub mod lobby;
pub mod logging;
pub mod math_challenge;
pub mod memory_match;
pub mod mystery_box;
pub mod number_guess;
pub mod questions;
pub mod quiz_battle;
pub mod registry;
pub mod roulette;
pub mod scramble;
pub mod slots;
pub mod tictactoe;


/// Multipliers are expressed in basis points (1.0x = 10_000).
pub const BASE_MULTIPLIER: u64 = 10_000;

/// `floor(bet × bps / 10_000)` without intermediate overflow.
pub fn apply_multiplier(bet: u64, multiplier_bps: u64) -> u64 {
    let scaled = (bet as u128) * (multiplier_bps as u128) / (BASE_MULTIPLIER as u128);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown action")]
    InvalidAction,
    #[error("move not allowed right now")]
    InvalidMove,
    #[error("missing input value")]
    MissingValue,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("you are not part of this game")]
    NotParticipant,
    #[error("action not allowed in this phase")]
    WrongPhase,
    #[error("game already complete")]
    GameAlreadyComplete,
    #[error("session state does not belong to this game")]
    InvalidState,
    #[error("game has no pending timer")]
    NoTimer,
    #[error("you cannot join your own game")]
    SelfJoin,
}

/// Outcome of a single transition.
///
/// `Win` and `Push` amounts are totals credited to the initiator (stake included). `Settled`
/// carries explicit per-player credits for head-to-head games.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    Continue(Vec<String>),
    Win(u64, Vec<String>),
    Push(u64, Vec<String>),
    Loss(Vec<String>),
    Settled {
        payouts: Vec<(PlayerId, u64)>,
        winner: Option<PlayerId>,
        logs: Vec<String>,
    },
    /// Ended before play began; every escrowed stake is returned.
    Cancelled(Vec<String>),
}

impl GameResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameResult::Continue(_))
    }

    pub fn logs(&self) -> &[String] {
        match self {
            GameResult::Continue(logs)
            | GameResult::Win(_, logs)
            | GameResult::Push(_, logs)
            | GameResult::Loss(logs)
            | GameResult::Cancelled(logs) => logs,
            GameResult::Settled { logs, .. } => logs,
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            GameResult::Continue(_) => "continue",
            GameResult::Win(..) => "win",
            GameResult::Push(..) => "push",
            GameResult::Loss(_) => "loss",
            GameResult::Settled { winner: Some(_), .. } => "settled",
            GameResult::Settled { winner: None, .. } => "draw",
            GameResult::Cancelled(_) => "cancelled",
        }
    }
}

/// A button press (plus optional modal text) after routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameAction {
    pub token: String,
    pub value: Option<String>,
}

impl GameAction {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Parse `prefix-N` tokens (e.g. `move-5`) into `N`, enforcing `1..=max`.
    pub fn indexed(&self, prefix: &str, max: u8) -> Option<u8> {
        let rest = self.token.strip_prefix(prefix)?.strip_prefix('-')?;
        let index: u8 = rest.parse().ok()?;
        (1..=max).contains(&index).then_some(index)
    }

    pub fn value(&self) -> Result<&str, GameError> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(GameError::MissingValue)
    }
}

#[derive(Debug)]
enum RngSource {
    Seeded(StdRng),
    Scripted(Arc<Mutex<VecDeque<u32>>>),
}

/// Per-transition randomness.
///
/// Seeded from `(seed, session, nonce)` in production. The scripted mode replays a queue of raw
/// values (each reduced modulo the requested bound) so outcomes can be forced in tests.
#[derive(Debug)]
pub struct GameRng {
    source: RngSource,
}

impl GameRng {
    pub fn new(seed: u64, session_id: SessionId, nonce: u64) -> Self {
        let mixed = seed
            ^ session_id.0.rotate_left(21)
            ^ nonce.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            source: RngSource::Seeded(StdRng::seed_from_u64(mixed)),
        }
    }

    /// Scripted rng sharing `queue` with its creator. An exhausted queue yields 0.
    pub fn scripted(queue: Arc<Mutex<VecDeque<u32>>>) -> Self {
        Self {
            source: RngSource::Scripted(queue),
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = u32>) -> Self {
        Self::scripted(Arc::new(Mutex::new(values.into_iter().collect())))
    }

    /// Uniform value in `0..bound` (`bound` of 0 is treated as 1).
    pub fn next_below(&mut self, bound: u32) -> u32 {
        let bound = bound.max(1);
        match &mut self.source {
            RngSource::Seeded(rng) => rng.gen_range(0..bound),
            RngSource::Scripted(queue) => {
                let raw = queue
                    .lock()
                    .ok()
                    .and_then(|mut q| q.pop_front())
                    .unwrap_or(0);
                raw % bound
            }
        }
    }

    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        low + self.next_below(high.saturating_sub(low) + 1)
    }

    pub fn roll_die(&mut self) -> u8 {
        self.range_inclusive(1, 6) as u8
    }

    pub fn spin_roulette(&mut self) -> u8 {
        self.next_below(37) as u8
    }

    /// Draw one card (with replacement) from a standard 52-card deck.
    pub fn draw_card(&mut self) -> u8 {
        self.next_below(cards::CARDS_PER_DECK as u32) as u8
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_below(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }

    /// Pick an index proportionally to `weights`. Returns `None` if all weights are zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u32 = weights.iter().sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.next_below(total);
        for (idx, weight) in weights.iter().enumerate() {
            if roll < *weight {
                return Some(idx);
            }
            roll -= weight;
        }
        None
    }
}

/// The generic state-machine contract every game implements.
pub trait ArcadeGame {
    fn start(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError>;

    fn apply_action(
        session: &mut GameSession,
        actor: PlayerId,
        action: &GameAction,
        rng: &mut GameRng,
    ) -> Result<GameResult, GameError>;

    fn on_timeout(_session: &mut GameSession, _rng: &mut GameRng) -> Result<GameResult, GameError> {
        Err(GameError::NoTimer)
    }
}

/// Per-session game state, one variant per game type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "game", content = "state", rename_all = "snake_case")]
pub enum GameState {
    CoinFlip(coinflip::CoinFlipState),
    Dice(dice::DiceState),
    Slots(slots::SlotsState),
    Roulette(roulette::RouletteState),
    HigherLower(hilo::HiLoState),
    WordScramble(scramble::ScrambleState),
    NumberGuess(number_guess::NumberGuessState),
    TicTacToe(tictactoe::TicTacToeState),
    ConnectFour(connect_four::ConnectFourState),
    Duel(duel::DuelState),
    QuizBattle(quiz_battle::QuizBattleState),
    MathChallenge(math_challenge::MathChallengeState),
    DailyChallenge(daily_challenge::DailyChallengeState),
    MysteryBox(mystery_box::MysteryBoxState),
    MemoryMatch(memory_match::MemoryMatchState),
    Blackjack(blackjack::BlackjackState),
}

impl GameState {
    /// Fresh state for a game before `start` runs.
    pub fn initial(game_type: GameType) -> Self {
        match game_type {
            GameType::CoinFlip => Self::CoinFlip(Default::default()),
            GameType::Dice => Self::Dice(Default::default()),
            GameType::Slots => Self::Slots(Default::default()),
            GameType::Roulette => Self::Roulette(Default::default()),
            GameType::HigherLower => Self::HigherLower(Default::default()),
            GameType::WordScramble => Self::WordScramble(Default::default()),
            GameType::NumberGuess => Self::NumberGuess(Default::default()),
            GameType::TicTacToe => Self::TicTacToe(Default::default()),
            GameType::ConnectFour => Self::ConnectFour(Default::default()),
            GameType::Duel => Self::Duel(Default::default()),
            GameType::QuizBattle => Self::QuizBattle(Default::default()),
            GameType::MathChallenge => Self::MathChallenge(Default::default()),
            GameType::DailyChallenge => Self::DailyChallenge(Default::default()),
            GameType::MysteryBox => Self::MysteryBox(Default::default()),
            GameType::MemoryMatch => Self::MemoryMatch(Default::default()),
            GameType::Blackjack => Self::Blackjack(Default::default()),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Self::CoinFlip(_) => GameType::CoinFlip,
            Self::Dice(_) => GameType::Dice,
            Self::Slots(_) => GameType::Slots,
            Self::Roulette(_) => GameType::Roulette,
            Self::HigherLower(_) => GameType::HigherLower,
            Self::WordScramble(_) => GameType::WordScramble,
            Self::NumberGuess(_) => GameType::NumberGuess,
            Self::TicTacToe(_) => GameType::TicTacToe,
            Self::ConnectFour(_) => GameType::ConnectFour,
            Self::Duel(_) => GameType::Duel,
            Self::QuizBattle(_) => GameType::QuizBattle,
            Self::MathChallenge(_) => GameType::MathChallenge,
            Self::DailyChallenge(_) => GameType::DailyChallenge,
            Self::MysteryBox(_) => GameType::MysteryBox,
            Self::MemoryMatch(_) => GameType::MemoryMatch,
            Self::Blackjack(_) => GameType::Blackjack,
        }
    }
}

/// Run `start` for the session's game.
pub fn start_game(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
    match session.game_type {
        GameType::CoinFlip => coinflip::CoinFlip::start(session, rng),
        GameType::Dice => dice::Dice::start(session, rng),
        GameType::Slots => slots::Slots::start(session, rng),
        GameType::Roulette => roulette::Roulette::start(session, rng),
        GameType::HigherLower => hilo::HiLo::start(session, rng),
        GameType::WordScramble => scramble::WordScramble::start(session, rng),
        GameType::NumberGuess => number_guess::NumberGuess::start(session, rng),
        GameType::TicTacToe => tictactoe::TicTacToe::start(session, rng),
        GameType::ConnectFour => connect_four::ConnectFour::start(session, rng),
        GameType::Duel => duel::Duel::start(session, rng),
        GameType::QuizBattle => quiz_battle::QuizBattle::start(session, rng),
        GameType::MathChallenge => math_challenge::MathChallenge::start(session, rng),
        GameType::DailyChallenge => daily_challenge::DailyChallenge::start(session, rng),
        GameType::MysteryBox => mystery_box::MysteryBox::start(session, rng),
        GameType::MemoryMatch => memory_match::MemoryMatch::start(session, rng),
        GameType::Blackjack => blackjack::Blackjack::start(session, rng),
    }
}

/// Run `apply_action` for the session's game.
pub fn apply_game_action(
    session: &mut GameSession,
    actor: PlayerId,
    action: &GameAction,
    rng: &mut GameRng,
) -> Result<GameResult, GameError> {
    if session.finished {
        return Err(GameError::GameAlreadyComplete);
    }
    match session.game_type {
        GameType::CoinFlip => coinflip::CoinFlip::apply_action(session, actor, action, rng),
        GameType::Dice => dice::Dice::apply_action(session, actor, action, rng),
        GameType::Slots => slots::Slots::apply_action(session, actor, action, rng),
        GameType::Roulette => roulette::Roulette::apply_action(session, actor, action, rng),
        GameType::HigherLower => hilo::HiLo::apply_action(session, actor, action, rng),
        GameType::WordScramble => {
            scramble::WordScramble::apply_action(session, actor, action, rng)
        }
        GameType::NumberGuess => {
            number_guess::NumberGuess::apply_action(session, actor, action, rng)
        }
        GameType::TicTacToe => tictactoe::TicTacToe::apply_action(session, actor, action, rng),
        GameType::ConnectFour => {
            connect_four::ConnectFour::apply_action(session, actor, action, rng)
        }
        GameType::Duel => duel::Duel::apply_action(session, actor, action, rng),
        GameType::QuizBattle => quiz_battle::QuizBattle::apply_action(session, actor, action, rng),
        GameType::MathChallenge => {
            math_challenge::MathChallenge::apply_action(session, actor, action, rng)
        }
        GameType::DailyChallenge => {
            daily_challenge::DailyChallenge::apply_action(session, actor, action, rng)
        }
        GameType::MysteryBox => mystery_box::MysteryBox::apply_action(session, actor, action, rng),
        GameType::MemoryMatch => {
            memory_match::MemoryMatch::apply_action(session, actor, action, rng)
        }
        GameType::Blackjack => blackjack::Blackjack::apply_action(session, actor, action, rng),
    }
}

/// Run `on_timeout` for the session's game.
pub fn game_timeout(session: &mut GameSession, rng: &mut GameRng) -> Result<GameResult, GameError> {
    if session.finished {
        return Err(GameError::GameAlreadyComplete);
    }
    match session.game_type {
        GameType::WordScramble => scramble::WordScramble::on_timeout(session, rng),
        GameType::Duel => duel::Duel::on_timeout(session, rng),
        GameType::QuizBattle => quiz_battle::QuizBattle::on_timeout(session, rng),
        GameType::MathChallenge => math_challenge::MathChallenge::on_timeout(session, rng),
        GameType::DailyChallenge => daily_challenge::DailyChallenge::on_timeout(session, rng),
        _ => Err(GameError::NoTimer),
    }
}

/// Every action token `game_type` accepts. The adapter picks which controls to show from the
/// state view.
pub fn action_tokens(game_type: GameType) -> Vec<String> {
    fn fixed(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }
    fn indexed(prefix: &str, count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("{prefix}-{i}")).collect()
    }

    match game_type {
        GameType::CoinFlip => fixed(&["heads", "tails"]),
        GameType::Dice => indexed("pick", 6),
        GameType::Slots => Vec::new(),
        GameType::Roulette => fixed(&["red", "black", "even", "odd", "low", "high", "green"]),
        GameType::HigherLower => fixed(&["higher", "lower", "cashout"]),
        GameType::WordScramble => fixed(&["answer", "continue", "cashout"]),
        GameType::NumberGuess => fixed(&["guess"]),
        GameType::TicTacToe => indexed("move", 9),
        GameType::ConnectFour => indexed("drop", connect_four::COLS),
        GameType::Duel => fixed(&[lobby::ACCEPT, lobby::CANCEL, "attack", "special", "defend"]),
        GameType::QuizBattle => {
            let mut tokens = fixed(&[lobby::ACCEPT, lobby::CANCEL]);
            tokens.extend(indexed("answer", questions::OPTION_COUNT));
            tokens
        }
        GameType::MathChallenge | GameType::DailyChallenge => {
            indexed("answer", questions::OPTION_COUNT)
        }
        GameType::MysteryBox => {
            let mut tokens = indexed("open", mystery_box::BOXES);
            tokens.push("cashout".to_string());
            tokens
        }
        GameType::MemoryMatch => indexed("flip", memory_match::CARDS),
        GameType::Blackjack => fixed(&["hit", "stand"]),
    }
}

/// Reject actors that are not the session's initiator (solo games).
pub(crate) fn ensure_initiator(session: &GameSession, actor: PlayerId) -> Result<(), GameError> {
    if session.players.first() == Some(&actor) {
        Ok(())
    } else {
        Err(GameError::NotParticipant)
    }
}

/// Fresh single-player session for game unit tests.
#[cfg(test)]
pub(crate) fn test_session(game_type: GameType, bet: u64) -> GameSession {
    let mut session = GameSession::new(SessionId(1), game_type, vec![PlayerId(1)], bet, None, 0);
    session.escrowed = session.players.clone();
    session
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_multiplier_floors() {
        assert_eq!(apply_multiplier(100, 19_000), 190);
        assert_eq!(apply_multiplier(101, 15_000), 151);
        assert_eq!(apply_multiplier(3, 15_000), 4);
        assert_eq!(apply_multiplier(0, 50_000), 0);
        assert_eq!(apply_multiplier(u64::MAX, 20_000), u64::MAX);
    }

    #[test]
    fn test_indexed_action_parsing() {
        assert_eq!(GameAction::new("move-5").indexed("move", 9), Some(5));
        assert_eq!(GameAction::new("move-0").indexed("move", 9), None);
        assert_eq!(GameAction::new("move-10").indexed("move", 9), None);
        assert_eq!(GameAction::new("drop-3").indexed("move", 9), None);
        assert_eq!(GameAction::new("move").indexed("move", 9), None);
    }

    #[test]
    fn test_action_value_trims_and_rejects_empty() {
        assert_eq!(
            GameAction::new("answer").with_value("  tiger ").value(),
            Ok("tiger")
        );
        assert_eq!(
            GameAction::new("answer").with_value("   ").value(),
            Err(GameError::MissingValue)
        );
        assert_eq!(GameAction::new("answer").value(), Err(GameError::MissingValue));
    }

    #[test]
    fn test_scripted_rng_reduces_modulo_bound() {
        let mut rng = GameRng::from_values([7, 13, 2]);
        assert_eq!(rng.next_below(6), 1);
        assert_eq!(rng.range_inclusive(1, 6), 2);
        assert_eq!(rng.next_below(2), 0);
        // Exhausted queue yields zero.
        assert_eq!(rng.next_below(10), 0);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut a = GameRng::new(42, SessionId(7), 3);
        let mut b = GameRng::new(42, SessionId(7), 3);
        let mut c = GameRng::new(42, SessionId(7), 4);
        let xs: Vec<u32> = (0..8).map(|_| a.next_below(1_000)).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_below(1_000)).collect();
        let zs: Vec<u32> = (0..8).map(|_| c.next_below(1_000)).collect();
        assert_eq!(xs, ys);
        assert_ne!(xs, zs);
    }

    #[test]
    fn test_weighted_index() {
        let mut rng = GameRng::from_values([0, 1, 3, 5]);
        let weights = [1, 2, 3];
        assert_eq!(rng.weighted_index(&weights), Some(0));
        assert_eq!(rng.weighted_index(&weights), Some(1));
        assert_eq!(rng.weighted_index(&weights), Some(2));
        assert_eq!(rng.weighted_index(&weights), Some(2));
        assert_eq!(rng.weighted_index(&[0, 0]), None);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = GameRng::new(1, SessionId(1), 0);
        let mut items: Vec<u8> = (0..12).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..12).collect::<Vec<u8>>());
    }

    #[test]
    fn test_action_tokens_are_routable() {
        for game_type in GameType::ALL {
            for token in action_tokens(game_type) {
                let id = arcade_types::ActionId::new(game_type, SessionId(u64::MAX), token)
                    .at_generation(u64::MAX);
                assert_eq!(id.encode().parse::<arcade_types::ActionId>(), Ok(id));
            }
        }
        assert_eq!(action_tokens(GameType::TicTacToe).len(), 9);
        assert!(action_tokens(GameType::Slots).is_empty());
    }

    #[test]
    fn test_initial_state_matches_game_type() {
        for game_type in GameType::ALL {
            assert_eq!(GameState::initial(game_type).game_type(), game_type);
        }
    }
}
