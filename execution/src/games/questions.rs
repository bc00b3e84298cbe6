//! Question sources for the quiz-style games.
//!
//! Every question has exactly four options; the index of the correct one is kept out of the
//! serialized view.

use super::GameRng;
use serde::Serialize;

pub const OPTION_COUNT: usize = 4;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(skip)]
    pub answer: usize,
}

impl Question {
    /// Whether the 1-based button `choice` is correct.
    pub fn is_correct(&self, choice: u8) -> bool {
        choice as usize == self.answer + 1
    }

    fn with_shuffled_options(
        prompt: String,
        correct: String,
        wrong: Vec<String>,
        rng: &mut GameRng,
    ) -> Self {
        let mut options = Vec::with_capacity(OPTION_COUNT);
        options.push(correct.clone());
        options.extend(wrong);
        rng.shuffle(&mut options);
        let answer = options.iter().position(|o| *o == correct).unwrap_or(0);
        Self {
            prompt,
            options,
            answer,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Normal,
    Hard,
}

/// Arithmetic question with three distinct distractors near the answer.
pub fn arithmetic(rng: &mut GameRng, difficulty: Difficulty) -> Question {
    let (prompt, answer) = match (difficulty, rng.next_below(3)) {
        (Difficulty::Normal, 0) => {
            let (a, b) = (rng.range_inclusive(2, 50), rng.range_inclusive(2, 50));
            (format!("{a} + {b}"), (a + b) as i64)
        }
        (Difficulty::Normal, 1) => {
            let (a, b) = (rng.range_inclusive(20, 99), rng.range_inclusive(1, 19));
            (format!("{a} - {b}"), a as i64 - b as i64)
        }
        (Difficulty::Normal, _) => {
            let (a, b) = (rng.range_inclusive(2, 12), rng.range_inclusive(2, 12));
            (format!("{a} × {b}"), (a * b) as i64)
        }
        (Difficulty::Hard, 0) => {
            let (a, b, c) = (
                rng.range_inclusive(11, 25),
                rng.range_inclusive(3, 12),
                rng.range_inclusive(10, 99),
            );
            (format!("{a} × {b} + {c}"), (a * b + c) as i64)
        }
        (Difficulty::Hard, 1) => {
            let (a, b) = (rng.range_inclusive(12, 29), rng.range_inclusive(12, 29));
            (format!("{a} × {b}"), (a * b) as i64)
        }
        (Difficulty::Hard, _) => {
            let (b, q) = (rng.range_inclusive(3, 15), rng.range_inclusive(6, 30));
            let c = rng.range_inclusive(5, 60);
            (format!("{} ÷ {b} - {c}", b * q), q as i64 - c as i64)
        }
    };

    let spread = match difficulty {
        Difficulty::Normal => 10,
        Difficulty::Hard => 25,
    };
    let mut wrong: Vec<String> = Vec::with_capacity(OPTION_COUNT - 1);
    let mut attempt = 0;
    while wrong.len() < OPTION_COUNT - 1 {
        attempt += 1;
        let offset = rng.range_inclusive(1, spread) as i64;
        let candidate = if rng.next_below(2) == 0 {
            answer + offset
        } else {
            answer - offset
        };
        // A scripted rng can repeat itself forever; fall back to fixed offsets.
        let candidate = if attempt > 32 {
            answer + attempt as i64
        } else {
            candidate
        };
        let text = candidate.to_string();
        if candidate != answer && !wrong.contains(&text) {
            wrong.push(text);
        }
    }
    Question::with_shuffled_options(format!("What is {prompt}?"), answer.to_string(), wrong, rng)
}

/// `(prompt, correct, [wrong; 3])`
const TRIVIA: [(&str, &str, [&str; 3]); 16] = [
    ("Which planet is known as the Red Planet?", "Mars", ["Venus", "Jupiter", "Mercury"]),
    ("How many sides does a hexagon have?", "6", ["5", "7", "8"]),
    ("What is the largest ocean on Earth?", "Pacific", ["Atlantic", "Indian", "Arctic"]),
    ("Which gas do plants absorb from the air?", "Carbon dioxide", ["Oxygen", "Nitrogen", "Helium"]),
    ("What is the chemical symbol for gold?", "Au", ["Ag", "Go", "Gd"]),
    ("How many players are on a soccer team on the field?", "11", ["9", "10", "12"]),
    ("What is the capital of Japan?", "Tokyo", ["Osaka", "Kyoto", "Sapporo"]),
    ("Which instrument has 88 keys?", "Piano", ["Organ", "Harp", "Accordion"]),
    ("What is the freezing point of water in Celsius?", "0", ["32", "-10", "100"]),
    ("Which animal is the largest mammal?", "Blue whale", ["Elephant", "Giraffe", "Orca"]),
    ("How many continents are there?", "7", ["5", "6", "8"]),
    ("Who painted the Mona Lisa?", "Leonardo da Vinci", ["Michelangelo", "Raphael", "Van Gogh"]),
    ("What is the hardest natural substance?", "Diamond", ["Quartz", "Iron", "Granite"]),
    ("Which language has the most native speakers?", "Mandarin", ["English", "Spanish", "Hindi"]),
    ("How many minutes are in a day?", "1440", ["1200", "1360", "1600"]),
    ("What is the smallest prime number?", "2", ["1", "3", "0"]),
];

/// `count` distinct trivia questions in random order (capped at the bank size).
pub fn trivia_round(rng: &mut GameRng, count: usize) -> Vec<Question> {
    let mut order: Vec<usize> = (0..TRIVIA.len()).collect();
    rng.shuffle(&mut order);
    order
        .into_iter()
        .take(count)
        .map(|idx| {
            let (prompt, correct, wrong) = TRIVIA[idx];
            Question::with_shuffled_options(
                prompt.to_string(),
                correct.to_string(),
                wrong.iter().map(|w| w.to_string()).collect(),
                rng,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::SessionId;

    fn assert_well_formed(question: &Question) {
        assert_eq!(question.options.len(), OPTION_COUNT);
        assert!(question.answer < OPTION_COUNT);
        let mut unique = question.options.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), OPTION_COUNT, "{question:?}");
    }

    #[test]
    fn test_arithmetic_questions_are_well_formed() {
        for nonce in 0..200 {
            let mut rng = GameRng::new(11, SessionId(3), nonce);
            for difficulty in [Difficulty::Normal, Difficulty::Hard] {
                let question = arithmetic(&mut rng, difficulty);
                assert_well_formed(&question);
                assert!(question.is_correct(question.answer as u8 + 1));
            }
        }
    }

    #[test]
    fn test_arithmetic_answer_is_correct() {
        // op 0 (addition), a = 2 + 5, b = 2 + 3
        let mut rng = GameRng::from_values([0, 5, 3]);
        let question = arithmetic(&mut rng, Difficulty::Normal);
        assert_eq!(question.prompt, "What is 7 + 5?");
        assert_eq!(question.options[question.answer], "12");
    }

    #[test]
    fn test_scripted_rng_cannot_stall_distractors() {
        let mut rng = GameRng::from_values([]);
        assert_well_formed(&arithmetic(&mut rng, Difficulty::Hard));
    }

    #[test]
    fn test_trivia_round_is_distinct() {
        let mut rng = GameRng::new(5, SessionId(9), 0);
        let round = trivia_round(&mut rng, 5);
        assert_eq!(round.len(), 5);
        let mut prompts: Vec<&str> = round.iter().map(|q| q.prompt.as_str()).collect();
        prompts.sort_unstable();
        prompts.dedup();
        assert_eq!(prompts.len(), 5);
        round.iter().for_each(assert_well_formed);
    }

    #[test]
    fn test_answer_hidden_from_view() {
        let mut rng = GameRng::new(1, SessionId(1), 0);
        let question = arithmetic(&mut rng, Difficulty::Normal);
        let view = serde_json::to_value(&question).unwrap();
        assert!(view.get("answer").is_none());
    }
}
