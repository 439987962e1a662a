use anyhow::Result;
use multiworld::generate::Generator;
use multiworld::player_options::{export_player_yaml, load_players, parse_player_settings};
use multiworld::worlds::default_registry;
use multiworld::GenerationError;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::Command;

fn fixture_players() -> Result<Vec<multiworld::player_options::PlayerSettings>> {
    load_players(&[PathBuf::from("tests/players")])
}

#[test]
fn test_load_fixture_directory() -> Result<()> {
    let players = fixture_players()?;
    let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    // Files load in name order, documents in file order.
    assert_eq!(names, vec!["Hunter2", "Nick", "Ransom", "Lady Phar"]);
    assert_eq!(players[3].description.as_deref(), Some("Castle run with neo bosses"));
    Ok(())
}

#[test]
fn test_fixture_multiworld_generates() -> Result<()> {
    let registry = default_registry()?;
    let players = fixture_players()?;
    let output = Generator::new(&registry, &players).generate(1, 2024)?;

    // Quick preset: 10 encrypted items for each of the three other worlds.
    let ransom = &output.slot_data[&3];
    assert_eq!(ransom["encrypted_items"], json!(10));
    assert_eq!(ransom["world_count"], json!(3));
    assert_eq!(ransom["payment_amount"], json!(2));
    // Explicit keys win over the preset.
    assert_eq!(ransom["free_decryptions"], json!(2));
    assert_eq!(ransom["timelimit"], json!(3600));

    let lady = &output.slot_data[&4];
    assert_eq!(lady["children"], json!(-1));
    assert_eq!(lady["death_link"], json!(2));
    assert_eq!(lady["boss_order"].as_array().map(|a| a.len()), Some(9));
    assert_eq!(lady["character_names_sir"], json!(["Sir Galahad", "__default"]));

    // The Password world may also draw Santa's filler, so only count the cookies.
    let cookies = output
        .placements
        .iter()
        .filter(|p| p.item_player == 2 && p.location_player == 4 && p.item == "Milk & Cookies")
        .count();
    assert_eq!(cookies, 5);
    assert_eq!(output.slot_data[&1]["death_link"], json!(false));
    Ok(())
}

#[test]
fn test_invalid_fixture_lists_every_problem() -> Result<()> {
    let registry = default_registry()?;
    let players = load_players(&[PathBuf::from("tests/invalid_players")])?;
    let err = match Generator::new(&registry, &players).generate(1, 1) {
        Ok(_) => panic!("invalid options were accepted"),
        Err(e) => e,
    };
    match err.downcast_ref::<GenerationError>() {
        Some(GenerationError::InvalidOptions { name, errors, .. }) => {
            assert_eq!(name, "Broken");
            let fields: Vec<&str> = errors.iter().map(|e| e.option.as_str()).collect();
            assert_eq!(
                fields,
                vec![
                    "not_an_option",
                    "chests_brown",
                    "neo_bosses",
                    "character_names_lady"
                ]
            );
            assert!(errors[3].message.contains("Zoë"));
        }
        _ => panic!("unexpected error: {err:#}"),
    }
    Ok(())
}

#[test]
fn test_export_round_trip() -> Result<()> {
    let registry = default_registry()?;
    let players = fixture_players()?;
    let resolved = Generator::new(&registry, &players).resolve_players()?;
    for (settings, (_, world_type, options)) in players.iter().zip(&resolved) {
        let defs = world_type.all_option_definitions();
        let text = export_player_yaml(settings, &defs, options)?;
        let reread = parse_player_settings(&text)?;
        assert_eq!(reread.len(), 1);
        assert_eq!(reread[0].name, settings.name);
        assert_eq!(reread[0].description, settings.description);

        let again = Generator::new(&registry, &reread).resolve_players()?;
        assert_eq!(&again[0].2, options, "{}", settings.name);
    }
    Ok(())
}

fn run_cli(args: &[&str]) -> Result<std::process::ExitStatus> {
    let cli_path = env!("CARGO_BIN_EXE_multiworld-cli");
    Ok(Command::new(cli_path).args(args).status()?)
}

/// The same players and seed must produce the same output file.
#[test]
fn test_cli_is_consistent() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("multiworld-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let outputs: Vec<PathBuf> = (0..2).map(|i| dir.join(format!("output{i}.json"))).collect();
    for output in &outputs {
        let status = run_cli(&[
            "--players",
            "tests/players",
            "--seed",
            "12345",
            "--output",
            path_str(output)?,
            "--spoiler",
            path_str(&dir.join("spoiler.json"))?,
        ])?;
        assert!(status.success());
    }
    let first = std::fs::read_to_string(&outputs[0])?;
    let second = std::fs::read_to_string(&outputs[1])?;
    assert_eq!(first, second);

    let parsed: serde_json::Value = serde_json::from_str(&first)?;
    assert_eq!(parsed["seed"], json!(12345));
    assert_eq!(parsed["players"].as_array().map(|a| a.len()), Some(4));

    let status = run_cli(&["--players", "tests/invalid_players", "--seed", "1"])?;
    assert!(!status.success());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_cli_rejects_zero_attempts() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("multiworld-cli-zero-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let output = dir.join("output.json");
    let status = run_cli(&[
        "--players",
        "tests/players",
        "--seed",
        "12345",
        "--max-attempts",
        "0",
        "--output",
        path_str(&output)?,
    ])?;
    assert!(!status.success());
    assert!(!output.exists());

    let status = run_cli(&[
        "--players",
        "tests/players",
        "--seed",
        "12345",
        "--max-attempts",
        "2",
        "--output",
        path_str(&output)?,
    ])?;
    assert!(status.success());
    assert!(output.exists());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("non-UTF-8 path {}", path.display()))
}
