use anyhow::{anyhow, ensure, Result};
use log::debug;
use multiworld_game::{Item, ItemCode, LocationCode, PlayerId, Requirement, MENU_REGION};
use rand::seq::SliceRandom;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::GenerationError;
use crate::multiworld::MultiWorld;
use crate::options::OptionDef;
use crate::world::{SlotData, World, WorldType};

pub const GAME: &str = "The Password Game";

const BASE_ID: i64 = 8_008_000;
const NUM_RULES: usize = 35;
const VICTORY_LOCATION: &str = "Entered Password Successfully";
const VICTORY_ITEM: &str = "My Password";

pub struct PasswordGame {
    item_name_to_id: BTreeMap<String, ItemCode>,
    location_name_to_id: BTreeMap<String, LocationCode>,
}

impl PasswordGame {
    pub fn new() -> Self {
        let mut location_name_to_id = BTreeMap::new();
        for i in 0..NUM_RULES {
            location_name_to_id.insert(format!("Rule {}", i + 1), BASE_ID + i as i64);
        }
        location_name_to_id.insert("Re-enter Your Password".to_string(), BASE_ID + NUM_RULES as i64);
        PasswordGame {
            item_name_to_id: BTreeMap::new(),
            location_name_to_id,
        }
    }
}

impl Default for PasswordGame {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldType for PasswordGame {
    fn game(&self) -> &'static str {
        GAME
    }

    fn item_name_to_id(&self) -> &BTreeMap<String, ItemCode> {
        &self.item_name_to_id
    }

    fn location_name_to_id(&self) -> &BTreeMap<String, LocationCode> {
        &self.location_name_to_id
    }

    fn option_definitions(&self) -> Vec<OptionDef> {
        vec![OptionDef::toggle("death_link")]
    }

    fn create_item(&self, name: &str, player: PlayerId) -> Result<Item> {
        // Only the victory event exists; the pool is drawn from other games.
        ensure!(name == VICTORY_ITEM, "{GAME} has no item named '{name}'");
        Ok(Item::event(VICTORY_ITEM, player))
    }

    fn create_world(&self, player: PlayerId) -> Box<dyn World> {
        Box::new(PasswordWorld { player })
    }
}

struct PasswordWorld {
    player: PlayerId,
}

impl World for PasswordWorld {
    fn player(&self) -> PlayerId {
        self.player
    }

    fn generate_early(&mut self, mw: &mut MultiWorld) -> Result<()> {
        if mw.players_of_game(GAME).len() == mw.num_players() {
            return Err(GenerationError::Invariant {
                game: GAME.to_string(),
                message: "cannot generate a multiworld made only of Password games".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn create_regions(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let menu = mw.graph.create_region(self.player, MENU_REGION)?;
        let mut names: Vec<String> = (1..=NUM_RULES).map(|i| format!("Rule {i}")).collect();
        names.push("Re-enter Your Password".to_string());
        for name in names {
            let loc = mw.add_location(menu, &name)?;
            mw.graph.locations[loc].priority = true;
        }
        let victory = mw.create_item(self.player, VICTORY_ITEM)?;
        mw.graph.add_event(menu, VICTORY_LOCATION, victory)?;
        Ok(())
    }

    /// Every location gets a filler item drawn from a random other participant.
    fn create_items(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let count = NUM_RULES + 1;
        let mut candidates: Vec<PlayerId> = mw
            .player_ids()
            .filter(|&p| mw.player(p).game != GAME)
            .collect();
        let mut invalid: BTreeSet<PlayerId> = BTreeSet::new();
        let mut items = Vec::with_capacity(count);
        while items.len() < count {
            candidates.retain(|p| !invalid.contains(p));
            let Some(&source) = candidates.choose(&mut mw.rng) else {
                return Err(GenerationError::NoFillerSource {
                    player: self.player,
                    name: mw.player_name(self.player).to_string(),
                }
                .into());
            };
            let world_type = mw.world_type(source).clone();
            let created = match world_type.filler_item_name(&mut mw.rng) {
                Some(name) => world_type.create_item(&name, source),
                None => Err(anyhow!("{} has no filler item", world_type.game())),
            };
            match created {
                Ok(item) => items.push(item),
                Err(e) => {
                    debug!(
                        "{}: not drawing filler from {}: {e}",
                        mw.player_name(self.player),
                        mw.player_name(source)
                    );
                    invalid.insert(source);
                }
            }
        }
        mw.itempool.extend(items);
        Ok(())
    }

    fn set_rules(&mut self, mw: &mut MultiWorld) -> Result<()> {
        mw.set_completion_condition(self.player, Requirement::item(self.player, VICTORY_ITEM));
        Ok(())
    }

    fn fill_slot_data(&self, mw: &MultiWorld) -> Result<SlotData> {
        let mut slot_data = SlotData::new();
        slot_data.insert(
            "death_link".to_string(),
            JsonValue::Bool(mw.options(self.player).bool("death_link")?),
        );
        Ok(slot_data)
    }
}
