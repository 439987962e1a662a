use anyhow::{Context, Result};
use multiworld_game::{IdAllocator, ItemClassification, ItemCode};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use ItemClassification::{
    Filler, Progression, ProgressionSkipBalancing as ProgressionSkip, Trap, Useful,
};

const ITEM_ID_BASE: i64 = 90_000;

// Ids are assigned in this order, so entries must only ever be appended.
pub const ITEMS: [(&str, ItemClassification); 77] = [
    // Classes
    ("Progressive Knights", Useful),
    ("Progressive Mages", Useful),
    ("Progressive Barbarians", Useful),
    ("Progressive Knaves", Useful),
    ("Progressive Shinobi", Useful),
    ("Progressive Miners", Useful),
    ("Progressive Liches", Useful),
    ("Progressive Spellthieves", Useful),
    ("Dragons", Progression),
    ("Traitors", Useful),
    // Skills
    ("Health Up", ProgressionSkip),
    ("Mana Up", ProgressionSkip),
    ("Attack Up", ProgressionSkip),
    ("Magic Damage Up", ProgressionSkip),
    ("Armor Up", Useful),
    ("Equip Up", ProgressionSkip),
    ("Crit Chance Up", Useful),
    ("Crit Damage Up", Useful),
    ("Down Strike Up", Filler),
    ("Gold Gain Up", Filler),
    ("Potion Efficiency Up", Filler),
    ("Invuln Time Up", Filler),
    ("Mana Cost Down", Filler),
    ("Death Defy", Useful),
    ("Haggling", Filler),
    ("Randomize Children", Useful),
    // Blueprints
    ("Squire Blueprints", Filler),
    ("Silver Blueprints", Filler),
    ("Guardian Blueprints", Filler),
    ("Imperial Blueprints", Filler),
    ("Royal Blueprints", Progression),
    ("Knight Blueprints", Filler),
    ("Ranger Blueprints", Filler),
    ("Sky Blueprints", Progression),
    ("Dragon Blueprints", Filler),
    ("Slayer Blueprints", Useful),
    ("Blood Blueprints", Useful),
    ("Sage Blueprints", Filler),
    ("Retribution Blueprints", Useful),
    ("Holy Blueprints", Useful),
    ("Dark Blueprints", Progression),
    // Vendor slots
    ("Blacksmith Sword Slot", Progression),
    ("Blacksmith Helm Slot", Progression),
    ("Blacksmith Chest Slot", Progression),
    ("Blacksmith Limbs Slot", Progression),
    ("Blacksmith Cape Slot", Progression),
    ("Enchantress Sword Slot", Progression),
    ("Enchantress Helm Slot", Progression),
    ("Enchantress Chest Slot", Progression),
    ("Enchantress Limbs Slot", Progression),
    ("Enchantress Cape Slot", Progression),
    // Runes
    ("Vault Runes", Progression),
    ("Sprint Runes", Progression),
    ("Vampire Runes", Useful),
    ("Sky Runes", Progression),
    ("Siphon Runes", Useful),
    ("Retaliation Runes", Filler),
    ("Bounty Runes", Filler),
    ("Haste Runes", Filler),
    ("Curse Runes", Filler),
    ("Grace Runes", Filler),
    ("Balance Runes", Useful),
    // Key items
    ("Fountain Piece", ProgressionSkip),
    ("Level Cap Increase", Progression),
    ("Khidr's Obol", Progression),
    ("Alexander's Obol", Progression),
    ("Ponce de Leon's Obol", Progression),
    ("Herodotus' Obol", Progression),
    ("Traitor's Obol", Progression),
    // Junk
    ("1000 Gold Pieces", Filler),
    ("3000 Gold Pieces", Filler),
    ("5000 Gold Pieces", Filler),
    ("1 Gold Piece", Filler),
    ("Stat Pack", Filler),
    // Traps
    ("Teleportation", Trap),
    ("Vertigo", Trap),
    ("Genetic Lottery", Trap),
];

/// Boss keys and the event item their defeat produces.
pub const BOSS_EVENTS: [(&str, &str); 9] = [
    ("khidr", "Defeat Khidr"),
    ("alex", "Defeat Alexander"),
    ("leon", "Defeat Ponce de Leon"),
    ("herodotus", "Defeat Herodotus"),
    ("khidr_neo", "Defeat Neo Khidr"),
    ("alex_neo", "Defeat Alexander IV"),
    ("leon_neo", "Defeat Ponce de Freon"),
    ("herodotus_neo", "Defeat Astrodotus"),
    ("traitor_neo", "Defeat the Brohannes"),
];

pub const STANDARD_BOSSES: [&str; 4] = ["khidr", "alex", "leon", "herodotus"];
pub const NEO_BOSSES: [&str; 5] = [
    "khidr_neo",
    "alex_neo",
    "leon_neo",
    "herodotus_neo",
    "traitor_neo",
];

pub const VICTORY_ITEM: &str = "Defeat the Fountain";
pub const FOUNTAIN_PIECE: &str = "Fountain Piece";
pub const GOLD_PIECE: &str = "1 Gold Piece";

// Any one of these lets the hero reach fairy chests:
pub const FLIGHT_SOURCES: [&str; 3] = ["Vault Runes", "Sky Runes", "Dragons"];

pub const PROGRESSIVE_CLASSES: [&str; 8] = [
    "Progressive Knights",
    "Progressive Mages",
    "Progressive Barbarians",
    "Progressive Knaves",
    "Progressive Shinobi",
    "Progressive Miners",
    "Progressive Liches",
    "Progressive Spellthieves",
];

// Skills whose copy count follows a max-level option, one copy per 5 levels:
pub const LEVELED_SKILLS: [(&str, &str); 4] = [
    ("Health Up", "max_health"),
    ("Mana Up", "max_mana"),
    ("Attack Up", "max_attack"),
    ("Magic Damage Up", "max_magic_damage"),
];

pub const FIXED_SKILLS: [(&str, usize); 12] = [
    ("Armor Up", 5),
    ("Equip Up", 5),
    ("Crit Chance Up", 5),
    ("Crit Damage Up", 5),
    ("Down Strike Up", 2),
    ("Gold Gain Up", 2),
    ("Potion Efficiency Up", 2),
    ("Invuln Time Up", 2),
    ("Mana Cost Down", 2),
    ("Death Defy", 2),
    ("Haggling", 2),
    ("Randomize Children", 1),
];

pub const BLACKSMITH_SLOTS: [&str; 5] = [
    "Blacksmith Sword Slot",
    "Blacksmith Helm Slot",
    "Blacksmith Chest Slot",
    "Blacksmith Limbs Slot",
    "Blacksmith Cape Slot",
];

pub const ENCHANTRESS_SLOTS: [&str; 5] = [
    "Enchantress Sword Slot",
    "Enchantress Helm Slot",
    "Enchantress Chest Slot",
    "Enchantress Limbs Slot",
    "Enchantress Cape Slot",
];

pub const OBOLS: [&str; 5] = [
    "Khidr's Obol",
    "Alexander's Obol",
    "Ponce de Leon's Obol",
    "Herodotus' Obol",
    "Traitor's Obol",
];

// Relative weights of the generic filler packs:
const FILLER: [(&str, u32); 4] = [
    ("5000 Gold Pieces", 2),
    ("3000 Gold Pieces", 3),
    ("1000 Gold Pieces", 4),
    ("Stat Pack", 3),
];

pub const TRAPS: [&str; 3] = ["Teleportation", "Genetic Lottery", "Vertigo"];

pub fn item_name_to_id() -> BTreeMap<String, ItemCode> {
    let mut ids = IdAllocator::new(ITEM_ID_BASE);
    ITEMS
        .iter()
        .map(|(name, _)| (name.to_string(), ids.allocate()))
        .collect()
}

pub fn classification(name: &str) -> Option<ItemClassification> {
    ITEMS.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
}

pub fn is_boss_event(name: &str) -> bool {
    name == VICTORY_ITEM || BOSS_EVENTS.iter().any(|(_, event)| *event == name)
}

pub fn defeat_event(boss: &str) -> Result<&'static str> {
    BOSS_EVENTS
        .iter()
        .find(|(key, _)| *key == boss)
        .map(|(_, event)| *event)
        .with_context(|| format!("unknown boss '{boss}'"))
}

pub fn random_filler(rng: &mut StdRng) -> &'static str {
    FILLER
        .choose_weighted(rng, |&(_, weight)| weight)
        .map_or(GOLD_PIECE, |&(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiworld::seeded_rng;

    #[test]
    fn test_item_ids_follow_table_order() {
        let ids = item_name_to_id();
        assert_eq!(ids.len(), ITEMS.len());
        assert_eq!(ids["Progressive Knights"], 90_000);
        assert_eq!(ids["Dragons"], 90_008);
        assert_eq!(ids["Genetic Lottery"], 90_076);
        assert!(!ids.contains_key(VICTORY_ITEM));
    }

    #[test]
    fn test_boss_events() {
        assert_eq!(defeat_event("leon_neo").unwrap(), "Defeat Ponce de Freon");
        assert!(defeat_event("johannes").is_err());
        assert!(is_boss_event("Defeat the Fountain"));
        assert!(!is_boss_event("Dragons"));
        for boss in STANDARD_BOSSES.iter().chain(NEO_BOSSES.iter()) {
            assert!(defeat_event(boss).is_ok());
        }
    }

    #[test]
    fn test_random_filler_is_junk() {
        let mut rng = seeded_rng(7);
        for _ in 0..200 {
            let name = random_filler(&mut rng);
            assert_eq!(classification(name), Some(Filler));
            assert_ne!(name, GOLD_PIECE);
        }
    }
}
