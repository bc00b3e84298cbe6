//! Game registry for managing available games and their metadata.
//!
//! The registry provides:
//! - Centralized listing of supported games
//! - Bet bounds and the built-in cooldown for each game
//! - Active/inactive game filtering
//! - Metadata for UI display (names, descriptions, categories)
//!
//! # Example
//! ```rust,ignore
//! use arcade_execution::games::registry::GameRegistry;
//! use arcade_types::GameType;
//!
//! let registry = GameRegistry::default();
//! assert!(registry.is_active(GameType::Blackjack));
//! let info = registry.info(GameType::Blackjack);
//! assert_eq!(info.name, "Blackjack");
//! ```

use arcade_types::GameType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SECOND_MS: u64 = 1_000;
const DAY_MS: u64 = 24 * 60 * 60 * SECOND_MS;

/// Game category for UI organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameCategory {
    /// One-shot chance games (Coinflip, Dice, Slots, Roulette).
    Chance,
    /// Reveal-and-cash-out ladders (Higher-or-lower, Mystery box, Scramble).
    Ladder,
    /// Turn-based games against the house heuristic.
    Board,
    /// Head-to-head games between two players.
    Versus,
    /// Timed question rounds.
    Quiz,
    /// Card games (Blackjack, Memory match).
    Cards,
}

/// Metadata about a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameInfo {
    /// Game type identifier.
    pub game_type: GameType,
    /// Display name.
    pub name: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Category for UI grouping.
    pub category: GameCategory,
    /// Minimum bet (in coins).
    pub min_bet: u64,
    /// Maximum bet (in coins).
    pub max_bet: u64,
    /// Built-in cooldown between starts, before guild overrides.
    pub cooldown_ms: u64,
    /// Seats per session.
    pub max_players: usize,
    /// Whether the game is currently active.
    pub is_active: bool,
}

impl GameInfo {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        game_type: GameType,
        name: &'static str,
        description: &'static str,
        category: GameCategory,
        min_bet: u64,
        max_bet: u64,
        cooldown_ms: u64,
        max_players: usize,
    ) -> Self {
        Self {
            game_type,
            name,
            description,
            category,
            min_bet,
            max_bet,
            cooldown_ms,
            max_players,
            is_active: true,
        }
    }

    /// Whether `bet` is inside this game's bounds.
    pub fn accepts_bet(&self, bet: u64) -> bool {
        (self.min_bet..=self.max_bet).contains(&bet)
    }

    /// Free games take no stake at all.
    pub fn is_free(&self) -> bool {
        self.max_bet == 0
    }
}

/// Bet-bound and cooldown adjustments loaded from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLimits {
    pub min_bet: Option<u64>,
    pub max_bet: Option<u64>,
    pub cooldown_ms: Option<u64>,
    pub active: Option<bool>,
}

/// Registry of available games.
///
/// Static metadata comes from [`GameRegistry::default_info`]; bet bounds, cooldowns and the
/// active flag can be adjusted at runtime.
#[derive(Clone, Debug)]
pub struct GameRegistry {
    games: HashMap<GameType, GameInfo>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRegistry {
    /// Create a new registry with every game active at its default limits.
    pub fn new() -> Self {
        let games = GameType::ALL
            .iter()
            .map(|&game_type| (game_type, Self::default_info(game_type)))
            .collect();
        Self { games }
    }

    /// Static metadata for a game type.
    pub fn default_info(game_type: GameType) -> GameInfo {
        match game_type {
            GameType::CoinFlip => GameInfo::new(
                GameType::CoinFlip,
                "Coinflip",
                "Call heads or tails. A correct call pays 1.9x.",
                GameCategory::Chance,
                10,
                10_000,
                5 * SECOND_MS,
                1,
            ),
            GameType::Dice => GameInfo::new(
                GameType::Dice,
                "Dice",
                "Pick a face and roll a d6. A match pays 5x.",
                GameCategory::Chance,
                10,
                5_000,
                5 * SECOND_MS,
                1,
            ),
            GameType::Slots => GameInfo::new(
                GameType::Slots,
                "Slots",
                "Spin three reels. Three sevens pay 20x.",
                GameCategory::Chance,
                10,
                5_000,
                5 * SECOND_MS,
                1,
            ),
            GameType::Roulette => GameInfo::new(
                GameType::Roulette,
                "Roulette",
                "Bet on a color, parity or half of a single-zero wheel.",
                GameCategory::Chance,
                10,
                10_000,
                5 * SECOND_MS,
                1,
            ),
            GameType::HigherLower => GameInfo::new(
                GameType::HigherLower,
                "Higher or Lower",
                "Predict the next card and build a streak before cashing out.",
                GameCategory::Ladder,
                10,
                2_500,
                10 * SECOND_MS,
                1,
            ),
            GameType::WordScramble => GameInfo::new(
                GameType::WordScramble,
                "Word Scramble",
                "Unscramble four words against the clock for up to 5x.",
                GameCategory::Quiz,
                10,
                2_500,
                15 * SECOND_MS,
                1,
            ),
            GameType::NumberGuess => GameInfo::new(
                GameType::NumberGuess,
                "Number Guess",
                "Find the secret number from 1 to 100 in seven tries.",
                GameCategory::Ladder,
                10,
                2_500,
                10 * SECOND_MS,
                1,
            ),
            GameType::TicTacToe => GameInfo::new(
                GameType::TicTacToe,
                "Tic-Tac-Toe",
                "Beat the house at three in a row.",
                GameCategory::Board,
                10,
                5_000,
                10 * SECOND_MS,
                1,
            ),
            GameType::ConnectFour => GameInfo::new(
                GameType::ConnectFour,
                "Connect Four",
                "Drop discs and connect four before the house does.",
                GameCategory::Board,
                10,
                5_000,
                10 * SECOND_MS,
                1,
            ),
            GameType::Duel => GameInfo::new(
                GameType::Duel,
                "Duel",
                "Challenge another player. Winner takes the pot.",
                GameCategory::Versus,
                10,
                10_000,
                30 * SECOND_MS,
                2,
            ),
            GameType::QuizBattle => GameInfo::new(
                GameType::QuizBattle,
                "Quiz Battle",
                "Five trivia questions head-to-head. Winner takes the pot.",
                GameCategory::Versus,
                10,
                10_000,
                30 * SECOND_MS,
                2,
            ),
            GameType::MathChallenge => GameInfo::new(
                GameType::MathChallenge,
                "Math Challenge",
                "Five quick sums. Each correct answer adds 0.5x.",
                GameCategory::Quiz,
                10,
                2_500,
                15 * SECOND_MS,
                1,
            ),
            GameType::DailyChallenge => GameInfo::new(
                GameType::DailyChallenge,
                "Daily Challenge",
                "One hard question a day for a free reward.",
                GameCategory::Quiz,
                0,
                0,
                DAY_MS,
                1,
            ),
            GameType::MysteryBox => GameInfo::new(
                GameType::MysteryBox,
                "Mystery Box",
                "Open boxes, dodge the two bombs, cash out when you like.",
                GameCategory::Ladder,
                10,
                2_500,
                10 * SECOND_MS,
                1,
            ),
            GameType::MemoryMatch => GameInfo::new(
                GameType::MemoryMatch,
                "Memory Match",
                "Match six pairs in as few moves as possible.",
                GameCategory::Cards,
                10,
                2_500,
                15 * SECOND_MS,
                1,
            ),
            GameType::Blackjack => GameInfo::new(
                GameType::Blackjack,
                "Blackjack",
                "Beat the dealer to 21 without going bust.",
                GameCategory::Cards,
                10,
                5_000,
                10 * SECOND_MS,
                1,
            ),
        }
    }

    /// Current metadata (with runtime adjustments) for a game.
    pub fn info(&self, game_type: GameType) -> GameInfo {
        self.games
            .get(&game_type)
            .cloned()
            .unwrap_or_else(|| Self::default_info(game_type))
    }

    /// Check if a game is active.
    pub fn is_active(&self, game_type: GameType) -> bool {
        self.games
            .get(&game_type)
            .map(|info| info.is_active)
            .unwrap_or(false)
    }

    /// Set a game's active status.
    pub fn set_active(&mut self, game_type: GameType, active: bool) {
        self.games
            .entry(game_type)
            .or_insert_with(|| Self::default_info(game_type))
            .is_active = active;
    }

    /// Apply configured limits. Inverted bounds are ignored.
    pub fn apply_limits(&mut self, game_type: GameType, limits: GameLimits) {
        let info = self
            .games
            .entry(game_type)
            .or_insert_with(|| Self::default_info(game_type));
        let min_bet = limits.min_bet.unwrap_or(info.min_bet);
        let max_bet = limits.max_bet.unwrap_or(info.max_bet);
        if min_bet <= max_bet {
            info.min_bet = min_bet;
            info.max_bet = max_bet;
        }
        if let Some(cooldown_ms) = limits.cooldown_ms {
            info.cooldown_ms = cooldown_ms;
        }
        if let Some(active) = limits.active {
            info.is_active = active;
        }
    }

    /// Get all active games.
    pub fn active_games(&self) -> Vec<GameType> {
        GameType::ALL
            .iter()
            .copied()
            .filter(|gt| self.is_active(*gt))
            .collect()
    }

    /// Get all game info with current limits.
    pub fn all_games_info(&self) -> Vec<GameInfo> {
        GameType::ALL.iter().map(|&gt| self.info(gt)).collect()
    }

    /// Get games by category.
    pub fn games_by_category(&self, category: GameCategory) -> Vec<GameType> {
        GameType::ALL
            .iter()
            .copied()
            .filter(|&gt| self.info(gt).category == category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_default() {
        let registry = GameRegistry::default();

        for game_type in GameType::ALL {
            assert!(registry.is_active(game_type), "{:?} should be active", game_type);
            let info = registry.info(game_type);
            assert_eq!(info.game_type, game_type);
            assert!(info.min_bet <= info.max_bet);
        }
    }

    #[test]
    fn test_set_active() {
        let mut registry = GameRegistry::new();

        assert!(registry.is_active(GameType::Blackjack));
        registry.set_active(GameType::Blackjack, false);
        assert!(!registry.is_active(GameType::Blackjack));
        registry.set_active(GameType::Blackjack, true);
        assert!(registry.is_active(GameType::Blackjack));
    }

    #[test]
    fn test_active_games() {
        let mut registry = GameRegistry::new();
        assert_eq!(registry.active_games().len(), GameType::ALL.len());

        registry.set_active(GameType::Blackjack, false);
        registry.set_active(GameType::Roulette, false);

        let active = registry.active_games();
        assert_eq!(active.len(), GameType::ALL.len() - 2);
        assert!(!active.contains(&GameType::Blackjack));
        assert!(!active.contains(&GameType::Roulette));
    }

    #[test]
    fn test_pvp_games_have_two_seats() {
        for game_type in GameType::ALL {
            let info = GameRegistry::default_info(game_type);
            let expected = if game_type.is_pvp() { 2 } else { 1 };
            assert_eq!(info.max_players, expected, "{:?}", game_type);
        }
    }

    #[test]
    fn test_daily_challenge_is_free() {
        let info = GameRegistry::default_info(GameType::DailyChallenge);
        assert!(info.is_free());
        assert!(info.accepts_bet(0));
        assert!(!info.accepts_bet(1));
        assert_eq!(info.cooldown_ms, DAY_MS);
    }

    #[test]
    fn test_apply_limits() {
        let mut registry = GameRegistry::new();
        registry.apply_limits(
            GameType::Dice,
            GameLimits {
                min_bet: Some(50),
                max_bet: Some(500),
                cooldown_ms: Some(1_000),
                active: None,
            },
        );
        let info = registry.info(GameType::Dice);
        assert_eq!((info.min_bet, info.max_bet, info.cooldown_ms), (50, 500, 1_000));
        assert!(info.accepts_bet(50));
        assert!(!info.accepts_bet(501));

        // Inverted bounds leave the previous bounds in place.
        registry.apply_limits(
            GameType::Dice,
            GameLimits {
                min_bet: Some(900),
                ..Default::default()
            },
        );
        assert_eq!(registry.info(GameType::Dice).min_bet, 50);
    }

    #[test]
    fn test_games_by_category() {
        let registry = GameRegistry::new();

        let versus = registry.games_by_category(GameCategory::Versus);
        assert_eq!(versus, vec![GameType::Duel, GameType::QuizBattle]);

        let chance = registry.games_by_category(GameCategory::Chance);
        assert!(chance.contains(&GameType::CoinFlip));
        assert!(chance.contains(&GameType::Slots));
    }

    #[test]
    fn test_all_games_info() {
        let mut registry = GameRegistry::new();
        registry.set_active(GameType::Slots, false);

        let infos = registry.all_games_info();
        assert_eq!(infos.len(), GameType::ALL.len());

        let slots = infos.iter().find(|i| i.game_type == GameType::Slots).unwrap();
        assert!(!slots.is_active);
    }
}
