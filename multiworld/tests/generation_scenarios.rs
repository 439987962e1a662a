mod common;

use anyhow::Result;
use common::{checks_player, count_items, generate, generation_error, placement_map, COIN, KEY};
use multiworld::player_options::PlayerSettings;
use multiworld::GenerationError;
use serde_json::json;

fn infinity_gauntlet(name: &str) -> PlayerSettings {
    PlayerSettings::new(name, "Infinity Gauntlet")
}

#[test]
fn test_gauntlet_with_checks() -> Result<()> {
    let players = vec![infinity_gauntlet("Thanos"), checks_player("Alice", 10, 2)];
    for seed in 0..10 {
        let output = generate(&players, seed)?;
        assert_eq!(output.placements.len(), 16);
        for stone in ["Space Stone", "Reality Stone", "Power Stone", "Soul Stone", "Mind Stone", "Time Stone"] {
            assert_eq!(count_items(&output, 1, stone), 1);
        }
        // No stone may sit behind itself.
        let placements = placement_map(&output);
        for ((owner, location), (item_owner, item)) in &placements {
            if *owner == 1 && *item_owner == 1 {
                assert_ne!(location, &format!("Taped to the {item}"));
            }
        }
        let ids: Vec<i64> = output
            .placements
            .iter()
            .filter(|p| p.location_player == 1)
            .map(|p| p.location_code)
            .collect();
        assert!(ids.iter().all(|id| (69_888_000..69_888_006).contains(id)));
    }
    Ok(())
}

#[test]
fn test_gauntlet_alone_cannot_be_filled() {
    let err = generation_error(&[infinity_gauntlet("Thanos")], 1);
    assert!(
        matches!(err, GenerationError::FillInfeasible { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_count_mismatch_is_reported() {
    let players = vec![checks_player("Alice", 3, 2).with_option("filler", 0)];
    let err = generation_error(&players, 1);
    match err {
        GenerationError::CountMismatch {
            items,
            locations,
            breakdown,
        } => {
            assert_eq!(items, 2);
            assert_eq!(locations, 3);
            assert!(breakdown.contains("Alice: 2 items, 3 locations"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_game_and_duplicate_names() {
    let err = generation_error(&[PlayerSettings::new("Alice", "Tetris")], 1);
    match err {
        GenerationError::Configuration { player, message, .. } => {
            assert_eq!(player, 1);
            assert!(message.contains("Tetris"));
            assert!(message.contains("Rogue Legacy"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let players = vec![checks_player("Alice", 6, 3), checks_player("alice", 6, 3)];
    let err = generation_error(&players, 1);
    assert!(matches!(err, GenerationError::Configuration { player: 2, .. }));
}

#[test]
fn test_invalid_options_are_all_reported() {
    let players = vec![PlayerSettings::new("Ransom", "Pharcryption")
        .with_option("encrypted_items", 5)
        .with_option("payment_amount", 11)
        .with_option("preset", "Turbo")];
    match generation_error(&players, 1) {
        GenerationError::InvalidOptions { player, errors, .. } => {
            assert_eq!(player, 1);
            let fields: Vec<&str> = errors.iter().map(|e| e.option.as_str()).collect();
            assert_eq!(fields, vec!["preset", "encrypted_items", "payment_amount"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_every_broken_participant_is_reported() {
    let players = vec![
        PlayerSettings::new("Ransom", "Pharcryption").with_option("encrypted_items", 5),
        checks_player("Alice", 6, 3),
        PlayerSettings::new("Other", "The Password Game").with_option("death_link", "maybe"),
        PlayerSettings::new("Stranger", "Tetris"),
    ];
    match generation_error(&players, 1) {
        GenerationError::InvalidPlayers { failures } => {
            assert_eq!(failures.len(), 3);
            assert!(matches!(
                &failures[0],
                GenerationError::InvalidOptions { player: 1, errors, .. }
                    if errors[0].option == "encrypted_items"
            ));
            assert!(matches!(
                &failures[1],
                GenerationError::InvalidOptions { player: 3, name, errors }
                    if name == "Other" && errors[0].option == "death_link"
            ));
            assert!(matches!(
                &failures[2],
                GenerationError::Configuration { player: 4, .. }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_pharcryption_needs_exactly_one_world_and_others() {
    let alone = vec![PlayerSettings::new("Ransom", "Pharcryption")];
    assert!(matches!(
        generation_error(&alone, 1),
        GenerationError::Invariant { .. }
    ));

    let twice = vec![
        PlayerSettings::new("Ransom", "Pharcryption"),
        PlayerSettings::new("Ransom2", "Pharcryption"),
        checks_player("Alice", 40, 2),
    ];
    match generation_error(&twice, 1) {
        GenerationError::Invariant { game, message } => {
            assert_eq!(game, "Pharcryption");
            assert!(message.contains("only 1"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_pharcryption_short_timelimit() {
    let players = vec![
        PlayerSettings::new("Ransom", "Pharcryption")
            .with_option("timelimit_hours", 0)
            .with_option("timelimit_minutes", 29),
        checks_player("Alice", 40, 2),
    ];
    match generation_error(&players, 1) {
        GenerationError::Configuration { player, message, .. } => {
            assert_eq!(player, 1);
            assert!(message.contains("at least 30 minutes"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_pharcryption_coins_go_to_other_worlds() -> Result<()> {
    let players = vec![
        PlayerSettings::new("Ransom", "Pharcryption")
            .with_option("extra_pharcoins", 10)
            .with_option("enable_timelimit", false),
        // Keyless, so every check is open from the start.
        checks_player("Alice", 30, 0),
    ];
    for seed in 0..5 {
        let output = generate(&players, seed)?;
        // 15 encrypted items for the one other world.
        let encrypted: Vec<_> = output
            .placements
            .iter()
            .filter(|p| p.location_player == 1)
            .collect();
        assert_eq!(encrypted.len(), 15);
        assert!(encrypted.iter().all(|p| p.item_player == 2));

        let coins: Vec<_> = output
            .placements
            .iter()
            .filter(|p| p.item_player == 1)
            .collect();
        assert_eq!(coins.len(), 15);
        assert!(coins.iter().all(|p| p.location_player == 2));
        let value: usize = coins
            .iter()
            .map(|p| match p.item.as_str() {
                "1 Pharcoin" => 1,
                "2 Pharcoins" => 2,
                "3 Pharcoins" => 3,
                other => panic!("unexpected item {other}"),
            })
            .sum();
        assert_eq!(value, 25);

        let slot_data = &output.slot_data[&1];
        assert_eq!(slot_data["world_count"], json!(1));
        assert_eq!(slot_data["encrypted_items"], json!(15));
        assert_eq!(slot_data["enable_timelimit"], json!(false));
        assert_eq!(slot_data["timelimit"], json!(4 * 3600));
    }
    Ok(())
}

#[test]
fn test_password_needs_a_filler_source() {
    let players = vec![
        PlayerSettings::new("Hunter2", "The Password Game"),
        infinity_gauntlet("Thanos"),
    ];
    match generation_error(&players, 1) {
        GenerationError::NoFillerSource { player, name } => {
            assert_eq!(player, 1);
            assert_eq!(name, "Hunter2");
        }
        other => panic!("unexpected error: {other}"),
    }

    let alone = vec![PlayerSettings::new("Hunter2", "The Password Game")];
    assert!(matches!(
        generation_error(&alone, 1),
        GenerationError::Invariant { .. }
    ));
}

#[test]
fn test_password_draws_filler_from_others() -> Result<()> {
    let players = vec![
        PlayerSettings::new("Hunter2", "The Password Game").with_option("death_link", true),
        checks_player("Alice", 6, 3),
    ];
    let output = generate(&players, 11)?;
    let rules: Vec<_> = output
        .placements
        .iter()
        .filter(|p| p.location_player == 1)
        .collect();
    assert_eq!(rules.len(), 36);
    assert_eq!(count_items(&output, 2, COIN), 36 + 3);
    assert_eq!(count_items(&output, 2, KEY), 3);
    // The victory event is not an output placement.
    assert!(!output.placements.iter().any(|p| p.item == "My Password"));
    assert_eq!(output.slot_data[&1]["death_link"], json!(true));
    Ok(())
}

#[test]
fn test_santa_delivers_gifts() -> Result<()> {
    let players = vec![
        PlayerSettings::new("Nick", "Pharcryption 2"),
        checks_player("Alice", 12, 2),
        checks_player("Bob", 6, 2),
    ];
    for seed in 0..5 {
        let output = generate(&players, seed)?;
        let gifts = |owner: usize, name: &str| {
            output
                .placements
                .iter()
                .filter(|p| p.location_player == owner && p.item_player == 1 && p.item == name)
                .count()
        };
        // Alice has room for all seven gifts.
        assert_eq!(gifts(2, "Milk & Cookies"), 5);
        assert_eq!(gifts(2, "The Christmas Slay"), 2);
        assert_eq!(count_items(&output, 2, COIN), 10 - 7);
        // Bob only has four coins to give up.
        assert_eq!(gifts(3, "Milk & Cookies"), 4);
        assert_eq!(gifts(3, "The Christmas Slay"), 0);
        assert_eq!(count_items(&output, 3, COIN), 0);
        assert_eq!(output.placements.len(), 18);
    }
    Ok(())
}

#[test]
fn test_rogue_legacy_defaults() -> Result<()> {
    let players = vec![PlayerSettings::new("Sir Lee", "Rogue Legacy")];
    let output = generate(&players, 42)?;
    // 31 manor, 6 challenges, 25 diaries, 100 brown, 25 silver, 10 gold, 4 boss chests.
    assert_eq!(output.placements.len(), 201);
    assert_eq!(count_items(&output, 1, "1 Gold Piece"), 1);
    assert_eq!(count_items(&output, 1, "Health Up"), 15);
    assert_eq!(count_items(&output, 1, "Progressive Knights"), 2);
    assert_eq!(count_items(&output, 1, "Khidr's Obol"), 0);
    assert!(output
        .placements
        .iter()
        .all(|p| (91_000..91_570).contains(&p.location_code)));

    let slot_data = &output.slot_data[&1];
    assert_eq!(
        slot_data["boss_order"],
        json!(["khidr", "alex", "leon", "herodotus"])
    );
    assert_eq!(slot_data["children"], json!(3));
    assert_eq!(slot_data["death_link"], json!(1));
    assert!(slot_data.get("local_items").is_none());

    let last_sphere = output.spoiler.summary.last().map(|s| s.items.len());
    assert!(last_sphere.is_some());
    Ok(())
}

#[test]
fn test_priority_location_left_out_by_options_is_ignored() -> Result<()> {
    // Fairy chests are in the location table but none are created by default.
    let players = vec![PlayerSettings::new("Sir Lee", "Rogue Legacy").with_option(
        "priority_locations",
        vec!["Fairy Chest I", "Manor - Observatory Telescope"],
    )];
    let output = generate(&players, 42)?;
    assert_eq!(output.placements.len(), 201);
    assert!(!output
        .placements
        .iter()
        .any(|p| p.location == "Fairy Chest I"));
    Ok(())
}

#[test]
fn test_rogue_legacy_grows_brown_chests() -> Result<()> {
    let players = vec![PlayerSettings::new("Sir Lee", "Rogue Legacy")
        .with_option("additional_challenges", false)
        .with_option("diary_entries", 2)
        .with_option("neo_bosses", "required")
        .with_option("boss_shuffle", true)
        .with_option("shuffle_blacksmith", true)
        .with_option("shuffle_enchantress", true)
        .with_option("level_limit", true)
        .with_option("fountain_hunt", true)
        .with_option("fountain_pieces_available", 80)
        .with_option("fountain_pieces_required", 100)];
    let output = generate(&players, 7)?;
    let slot_data = &output.slot_data[&1];
    assert_eq!(slot_data["chests_brown"], json!(163));
    assert_eq!(output.placements.len(), 239);
    assert_eq!(count_items(&output, 1, "Fountain Piece"), 80);
    assert_eq!(count_items(&output, 1, "Traitor's Obol"), 1);

    let boss_order = slot_data["boss_order"]
        .as_array()
        .map(|a| a.len())
        .unwrap_or_default();
    assert_eq!(boss_order, 9);
    Ok(())
}

#[test]
fn test_rogue_legacy_traps() -> Result<()> {
    let players = vec![PlayerSettings::new("Sir Lee", "Rogue Legacy")
        .with_option("trap_percentage", 100)];
    let output = generate(&players, 5)?;
    let traps = ["Teleportation", "Vertigo", "Genetic Lottery"]
        .iter()
        .map(|t| count_items(&output, 1, t))
        .sum::<usize>();
    // Every filler slot but the lone gold piece became a trap.
    assert_eq!(count_items(&output, 1, "1 Gold Piece"), 1);
    assert_eq!(count_items(&output, 1, "Stat Pack"), 0);
    assert!(traps > 0);
    Ok(())
}
