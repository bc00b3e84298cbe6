//! Shared playing-card helpers.
//!
//! Cards are encoded as `0..=51`, where:
//! - suit = card / 13 (0..=3)
//! - rank = card % 13 (0..=12)
//!
//! Higher-or-lower compares Ace low (rank 1); blackjack counts Ace as 1 or 11.

/// Total cards in a standard deck.
pub const CARDS_PER_DECK: u8 = 52;

/// Ranks per suit.
pub const RANKS_PER_SUIT: u8 = 13;

const RANK_LABELS: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];
const SUIT_LABELS: [&str; 4] = ["♠", "♥", "♦", "♣"];

/// Returns the 0-based rank (0..=12), where 0 is Ace.
pub fn card_rank(card: u8) -> u8 {
    card % RANKS_PER_SUIT
}

/// Returns the 1-based rank (1..=13), where 1 is Ace and 13 is King.
pub fn card_rank_one_based(card: u8) -> u8 {
    card_rank(card) + 1
}

/// Returns the suit (0..=3).
pub fn card_suit(card: u8) -> u8 {
    (card / RANKS_PER_SUIT) % 4
}

/// Human label such as `"10♥"`.
pub fn card_label(card: u8) -> String {
    format!(
        "{}{}",
        RANK_LABELS[card_rank(card) as usize],
        SUIT_LABELS[card_suit(card) as usize]
    )
}

/// Blackjack value of a single card before soft-ace adjustment.
pub fn blackjack_value(card: u8) -> u8 {
    match card_rank_one_based(card) {
        1 => 11,
        r if r >= 10 => 10,
        r => r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_rank() {
        // Ace = 1
        assert_eq!(card_rank_one_based(0), 1);
        assert_eq!(card_rank_one_based(13), 1);
        assert_eq!(card_rank_one_based(26), 1);
        // King = 13
        assert_eq!(card_rank_one_based(12), 13);
        assert_eq!(card_rank_one_based(51), 13);
    }

    #[test]
    fn test_card_label() {
        assert_eq!(card_label(0), "A♠");
        assert_eq!(card_label(22), "10♥");
        assert_eq!(card_label(51), "K♣");
    }

    #[test]
    fn test_blackjack_value() {
        assert_eq!(blackjack_value(0), 11);
        assert_eq!(blackjack_value(8), 9);
        assert_eq!(blackjack_value(9), 10);
        assert_eq!(blackjack_value(12), 10);
    }
}
