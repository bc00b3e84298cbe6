use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Arcade game types.
///
/// The string key (`as_str`) is what appears in action ids and in cooldown override maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    CoinFlip,
    Dice,
    Slots,
    Roulette,
    HigherLower,
    WordScramble,
    NumberGuess,
    TicTacToe,
    ConnectFour,
    Duel,
    QuizBattle,
    MathChallenge,
    DailyChallenge,
    MysteryBox,
    MemoryMatch,
    Blackjack,
}

impl GameType {
    pub const ALL: [GameType; 16] = [
        GameType::CoinFlip,
        GameType::Dice,
        GameType::Slots,
        GameType::Roulette,
        GameType::HigherLower,
        GameType::WordScramble,
        GameType::NumberGuess,
        GameType::TicTacToe,
        GameType::ConnectFour,
        GameType::Duel,
        GameType::QuizBattle,
        GameType::MathChallenge,
        GameType::DailyChallenge,
        GameType::MysteryBox,
        GameType::MemoryMatch,
        GameType::Blackjack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::CoinFlip => "coinflip",
            GameType::Dice => "dice",
            GameType::Slots => "slots",
            GameType::Roulette => "roulette",
            GameType::HigherLower => "hilo",
            GameType::WordScramble => "scramble",
            GameType::NumberGuess => "numguess",
            GameType::TicTacToe => "tictactoe",
            GameType::ConnectFour => "connect4",
            GameType::Duel => "duel",
            GameType::QuizBattle => "quiz",
            GameType::MathChallenge => "math",
            GameType::DailyChallenge => "daily",
            GameType::MysteryBox => "mysterybox",
            GameType::MemoryMatch => "memory",
            GameType::Blackjack => "blackjack",
        }
    }

    /// Games played between two users rather than against the house.
    pub fn is_pvp(&self) -> bool {
        matches!(self, GameType::Duel | GameType::QuizBattle)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("unknown game type: {0}")]
pub struct ParseGameTypeError(pub String);

impl FromStr for GameType {
    type Err = ParseGameTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .iter()
            .copied()
            .find(|game_type| game_type.as_str() == s)
            .ok_or_else(|| ParseGameTypeError(s.to_string()))
    }
}
