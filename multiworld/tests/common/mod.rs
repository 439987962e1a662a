#![allow(dead_code)]

use anyhow::Result;
use multiworld::generate::{GenerationOutput, Generator};
use multiworld::options::OptionDef;
use multiworld::player_options::PlayerSettings;
use multiworld::world::{World, WorldRegistry, WorldType};
use multiworld::worlds::default_registry;
use multiworld::{GenerationError, MultiWorld};
use multiworld_game::{Item, ItemClassification, ItemCode, LocationCode, PlayerId, Requirement, MENU_REGION};
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const CHECKS: &str = "Checks";
pub const KEY: &str = "Key";
pub const COIN: &str = "Coin";
const MAX_CHECKS: usize = 100;

pub fn check_name(n: usize) -> String {
    format!("Check {n}")
}

/// Keys needed for the `n`th check: one more per check, up to the number of keys.
pub fn keys_needed(n: usize, keys: usize) -> usize {
    (n - 1).min(keys)
}

/// A small game for exercising the pipeline: `checks` locations in a chain gated on a
/// counted "Key" item, with coins as filler. The goal is holding every key.
pub struct ChecksGame {
    item_name_to_id: BTreeMap<String, ItemCode>,
    location_name_to_id: BTreeMap<String, LocationCode>,
}

impl ChecksGame {
    pub fn new() -> Self {
        ChecksGame {
            item_name_to_id: [(KEY.to_string(), 1), (COIN.to_string(), 2)].into(),
            location_name_to_id: (1..=MAX_CHECKS)
                .map(|n| (check_name(n), 100 + n as i64))
                .collect(),
        }
    }
}

impl WorldType for ChecksGame {
    fn game(&self) -> &'static str {
        CHECKS
    }

    fn item_name_to_id(&self) -> &BTreeMap<String, ItemCode> {
        &self.item_name_to_id
    }

    fn location_name_to_id(&self) -> &BTreeMap<String, LocationCode> {
        &self.location_name_to_id
    }

    fn option_definitions(&self) -> Vec<OptionDef> {
        vec![
            OptionDef::range("checks", 0, MAX_CHECKS as i64, 6),
            OptionDef::range("keys", 0, MAX_CHECKS as i64, 3),
            OptionDef::named_range("filler", 0, MAX_CHECKS as i64, -1, &[("auto", -1)]),
        ]
    }

    fn create_item(&self, name: &str, player: PlayerId) -> Result<Item> {
        let classification = if name == KEY {
            ItemClassification::Progression
        } else {
            ItemClassification::Filler
        };
        Ok(Item::new(name, classification, Some(self.item_code(name)?), player))
    }

    fn filler_item_name(&self, _rng: &mut StdRng) -> Option<String> {
        Some(COIN.to_string())
    }

    fn create_world(&self, player: PlayerId) -> Box<dyn World> {
        Box::new(ChecksWorld {
            player,
            checks: 0,
            keys: 0,
        })
    }
}

struct ChecksWorld {
    player: PlayerId,
    checks: usize,
    keys: usize,
}

impl World for ChecksWorld {
    fn player(&self) -> PlayerId {
        self.player
    }

    fn generate_early(&mut self, mw: &mut MultiWorld) -> Result<()> {
        self.checks = mw.options(self.player).int("checks")? as usize;
        self.keys = mw.options(self.player).int("keys")? as usize;
        Ok(())
    }

    fn create_regions(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let menu = mw.graph.create_region(self.player, MENU_REGION)?;
        for n in 1..=self.checks {
            mw.add_location(menu, &check_name(n))?;
        }
        Ok(())
    }

    fn create_items(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let filler = match mw.options(self.player).int("filler")? {
            -1 => self.checks.saturating_sub(self.keys),
            n => n as usize,
        };
        for _ in 0..self.keys {
            mw.add_pool_item(self.player, KEY)?;
        }
        for _ in 0..filler {
            mw.add_pool_item(self.player, COIN)?;
        }
        Ok(())
    }

    fn set_rules(&mut self, mw: &mut MultiWorld) -> Result<()> {
        for n in 1..=self.checks {
            let loc = mw.graph.location_idx(self.player, &check_name(n))?;
            mw.graph.set_location_rule(
                loc,
                Requirement::item_count(self.player, KEY, keys_needed(n, self.keys)),
            );
        }
        mw.set_completion_condition(
            self.player,
            Requirement::item_count(self.player, KEY, self.keys),
        );
        Ok(())
    }
}

pub fn registry() -> Result<WorldRegistry> {
    let mut registry = default_registry()?;
    registry.register(Arc::new(ChecksGame::new()))?;
    Ok(registry)
}

pub fn checks_player(name: &str, checks: i64, keys: i64) -> PlayerSettings {
    PlayerSettings::new(name, CHECKS)
        .with_option("checks", checks)
        .with_option("keys", keys)
}

pub fn generate(settings: &[PlayerSettings], seed: u64) -> Result<GenerationOutput> {
    let registry = registry()?;
    Generator::new(&registry, settings).generate(1, seed)
}

/// Runs a generation that must fail and returns the typed failure.
pub fn generation_error(settings: &[PlayerSettings], seed: u64) -> GenerationError {
    match generate(settings, seed) {
        Ok(_) => panic!("generation unexpectedly succeeded"),
        Err(e) => match e.downcast::<GenerationError>() {
            Ok(err) => err,
            Err(other) => panic!("expected a GenerationError, got: {other:#}"),
        },
    }
}

/// Placed item names per (location owner, location name).
pub fn placement_map(output: &GenerationOutput) -> BTreeMap<(PlayerId, String), (PlayerId, String)> {
    output
        .placements
        .iter()
        .map(|p| {
            (
                (p.location_player, p.location.clone()),
                (p.item_player, p.item.clone()),
            )
        })
        .collect()
}

pub fn count_items(output: &GenerationOutput, player: PlayerId, name: &str) -> usize {
    output
        .placements
        .iter()
        .filter(|p| p.item_player == player && p.item == name)
        .count()
}
