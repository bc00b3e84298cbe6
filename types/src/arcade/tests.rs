use super::*;
use proptest::prelude::*;

#[test]
fn test_game_type_key_roundtrip() {
    for game_type in GameType::ALL {
        let parsed: GameType = game_type.as_str().parse().unwrap();
        assert_eq!(parsed, game_type);
    }
}

#[test]
fn test_game_type_keys_are_unique() {
    let mut keys: Vec<&str> = GameType::ALL.iter().map(|g| g.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), GameType::ALL.len());
}

#[test]
fn test_game_type_rejects_unknown_key() {
    assert_eq!(
        "poker".parse::<GameType>(),
        Err(ParseGameTypeError("poker".to_string()))
    );
}

#[test]
fn test_action_id_without_generation() {
    let id = ActionId::new(GameType::CoinFlip, SessionId(0x2a), "heads");
    assert_eq!(id.encode(), "coinflip:2a:heads");
    assert_eq!("coinflip:2a:heads".parse::<ActionId>().unwrap(), id);
}

#[test]
fn test_action_id_with_generation() {
    let id = ActionId::new(GameType::MathChallenge, SessionId(255), "answer-3").at_generation(4);
    assert_eq!(id.encode(), "math:ff:answer-3:4");
    let parsed: ActionId = "math:ff:answer-3:4".parse().unwrap();
    assert_eq!(parsed.generation, Some(4));
}

#[test]
fn test_action_id_rejects_malformed_input() {
    assert_eq!(
        "coinflip:2a".parse::<ActionId>(),
        Err(ActionIdError::SegmentCount(2))
    );
    assert!(matches!(
        "chess:2a:move".parse::<ActionId>(),
        Err(ActionIdError::UnknownGame(_))
    ));
    assert!(matches!(
        "dice:zz:pick-1".parse::<ActionId>(),
        Err(ActionIdError::InvalidSession(_))
    ));
    assert!(matches!(
        "dice:1:Pick 1".parse::<ActionId>(),
        Err(ActionIdError::InvalidAction(_))
    ));
    assert!(matches!(
        "dice:1:pick-1:x".parse::<ActionId>(),
        Err(ActionIdError::InvalidGeneration(_))
    ));
    let long = format!("dice:1:{}", "a".repeat(MAX_ACTION_ID_LENGTH));
    assert!(matches!(
        long.parse::<ActionId>(),
        Err(ActionIdError::TooLong { .. })
    ));
}

#[test]
fn test_cooldown_overrides_lookup() {
    let mut overrides = CooldownOverrides::new();
    overrides.set(GuildId(1), "dice", 10_000);
    overrides.set(GuildId(1), GLOBAL_COOLDOWN_KEY, 20_000);

    assert_eq!(overrides.for_game(GuildId(1), GameType::Dice), Some(10_000));
    assert_eq!(overrides.for_game(GuildId(1), GameType::Slots), None);
    assert_eq!(overrides.for_all(GuildId(1)), Some(20_000));
    assert_eq!(overrides.for_all(GuildId(2)), None);

    assert_eq!(overrides.clear(GuildId(1), "dice"), Some(10_000));
    assert_eq!(overrides.for_game(GuildId(1), GameType::Dice), None);
}

#[test]
fn test_cooldown_overrides_from_yaml() {
    let yaml = "123:\n  all: 20000\n  coinflip: 10000\n";
    let overrides: CooldownOverrides = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(overrides.for_all(GuildId(123)), Some(20_000));
    assert_eq!(
        overrides.for_game(GuildId(123), GameType::CoinFlip),
        Some(10_000)
    );
}

fn game_type_strategy() -> impl Strategy<Value = GameType> {
    (0..GameType::ALL.len()).prop_map(|idx| GameType::ALL[idx])
}

proptest! {
    #[test]
    fn prop_action_id_roundtrip(
        game_type in game_type_strategy(),
        session in any::<u64>(),
        action in "[a-z][a-z0-9-]{0,20}",
        generation in proptest::option::of(any::<u64>()),
    ) {
        let mut id = ActionId::new(game_type, SessionId(session), action);
        id.generation = generation;
        let parsed: ActionId = id.encode().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn prop_action_id_parse_never_panics(raw in ".{0,120}") {
        let _ = raw.parse::<ActionId>();
    }
}
