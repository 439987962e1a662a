use std::collections::BTreeSet;

use super::locations::{
    MAX_BROWN_CHESTS, MAX_DIARIES, MAX_FAIRY_CHESTS, MAX_GOLD_CHESTS, MAX_SILVER_CHESTS,
    MIN_BROWN_CHESTS, MIN_DIARIES, MIN_FAIRY_CHESTS, MIN_GOLD_CHESTS, MIN_SILVER_CHESTS,
};
use crate::options::{KeyUniverse, OptionDef};

pub const NEO_BOSSES_EXCLUDED: i64 = 0;
pub const NEO_BOSSES_REQUIRED: i64 = 2;

// Stands in for the names shipped with the game:
const DEFAULT_NAMES_KEY: &str = "__default";

const SKILL_LEVELS: [(&str, i64); 11] = [
    ("25", 25),
    ("30", 30),
    ("35", 35),
    ("40", 40),
    ("45", 45),
    ("50", 50),
    ("55", 55),
    ("60", 60),
    ("65", 65),
    ("70", 70),
    ("75", 75),
];

fn skill_level_maximum(name: &str) -> OptionDef {
    OptionDef::choice(name, &SKILL_LEVELS, 75)
}

fn character_names(name: &str) -> OptionDef {
    OptionDef::option_set(name, &[DEFAULT_NAMES_KEY], KeyUniverse::Any)
        .with_verifier(verify_character_names)
}

/// Names the game can render: printable ASCII only.
fn verify_character_names(names: &BTreeSet<String>) -> Vec<String> {
    names
        .iter()
        .filter(|name| name.as_str() != DEFAULT_NAMES_KEY)
        .filter_map(|name| {
            let mut invalid: Vec<char> = name.chars().filter(|c| !(' '..='~').contains(c)).collect();
            invalid.dedup();
            if invalid.is_empty() {
                None
            } else {
                let chars: String = invalid.into_iter().collect();
                Some(format!("invalid characters in name '{name}': {chars}"))
            }
        })
        .collect()
}

pub fn option_definitions() -> Vec<OptionDef> {
    vec![
        OptionDef::named_range(
            "children",
            1,
            5,
            3,
            &[("vanilla", 3), ("variable", -1), ("shuffle_children", -2)],
        ),
        OptionDef::toggle("level_limit"),
        OptionDef::toggle("shuffle_blacksmith"),
        OptionDef::toggle("shuffle_enchantress"),
        OptionDef::range("chests_brown", MIN_BROWN_CHESTS, MAX_BROWN_CHESTS, MIN_BROWN_CHESTS),
        OptionDef::range("chests_silver", MIN_SILVER_CHESTS, MAX_SILVER_CHESTS, MIN_SILVER_CHESTS),
        OptionDef::range("chests_gold", MIN_GOLD_CHESTS, MAX_GOLD_CHESTS, MIN_GOLD_CHESTS),
        OptionDef::range("chests_fairy", MIN_FAIRY_CHESTS, MAX_FAIRY_CHESTS, 0),
        OptionDef::range("diary_entries", MIN_DIARIES, MAX_DIARIES, 25),
        OptionDef::choice(
            "neo_bosses",
            &[("excluded", 0), ("included", 1), ("required", 2)],
            NEO_BOSSES_EXCLUDED,
        ),
        OptionDef::default_on_toggle("additional_challenges"),
        OptionDef::choice(
            "enemy_scaling",
            &[
                ("relaxed", 75),
                ("normal", 100),
                ("hard", 150),
                ("harder", 200),
                ("absurd", 300),
            ],
            100,
        ),
        OptionDef::choice(
            "castle_scaling",
            &[
                ("normal", 100),
                ("large", 133),
                ("very_large", 166),
                ("labyrinth", 200),
            ],
            100,
        ),
        OptionDef::range("ngplus_requirement", 0, 2, 0),
        OptionDef::toggle("boss_shuffle"),
        OptionDef::choice(
            "gold_gain",
            &[
                ("halved", 50),
                ("reduced", 75),
                ("normal", 100),
                ("increased", 150),
                ("doubled", 200),
                ("tripled", 300),
                ("quadrupled", 400),
            ],
            100,
        ),
        OptionDef::default_on_toggle("charon"),
        OptionDef::toggle("fountain_hunt"),
        OptionDef::range("fountain_pieces_available", 1, 80, 5),
        OptionDef::range("fountain_pieces_required", 1, 100, 75),
        character_names("character_names_sir"),
        character_names("character_names_lady"),
        skill_level_maximum("max_health"),
        skill_level_maximum("max_mana"),
        skill_level_maximum("max_attack"),
        skill_level_maximum("max_magic_damage"),
        OptionDef::range("trap_percentage", 0, 100, 0),
        OptionDef::choice(
            "death_link",
            &[
                ("forbidden", 0),
                ("disabled", 1),
                ("enabled", 2),
                ("enforced", 3),
            ],
            1,
        )
        .with_aliases(&[("true", 2), ("false", 1)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{NameTables, OptionValue};
    use serde_yaml::Value;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_character_names_must_be_printable() {
        assert!(verify_character_names(&names(&["__default", "Sir Lancelot", "O'Brien"])).is_empty());
        let errors = verify_character_names(&names(&["Zoë", "Tab\tName", "Fine"]));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("'Zoë'") && e.ends_with('ë')));
        assert!(errors.iter().any(|e| e.contains("Tab\tName")));
    }

    #[test]
    fn test_definitions_are_valid() {
        for def in option_definitions() {
            def.validate_definition().unwrap();
        }
    }

    #[test]
    fn test_character_name_option_reports_each_name() {
        let def = character_names("character_names_sir");
        let raw: Value = serde_yaml::from_str("[__default, Ser Dünkan, Sir Ok]").unwrap();
        let errs = def.decode(&raw, &NameTables::default()).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].option, "character_names_sir");
        assert!(errs[0].message.contains("Ser Dünkan"));

        let raw: Value = serde_yaml::from_str("[Sir Ok]").unwrap();
        assert_eq!(
            def.decode(&raw, &NameTables::default()),
            Ok(OptionValue::Set(names(&["Sir Ok"])))
        );
    }

    #[test]
    fn test_skill_levels_read_as_numbers() {
        let def = skill_level_maximum("max_health");
        assert_eq!(
            def.decode(&Value::from(40), &NameTables::default()),
            Ok(OptionValue::Int(40))
        );
        assert_eq!(
            def.decode(&Value::from("55"), &NameTables::default()),
            Ok(OptionValue::Int(55))
        );
        assert!(def.decode(&Value::from(42), &NameTables::default()).is_err());
    }
}
