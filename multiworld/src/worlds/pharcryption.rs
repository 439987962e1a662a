use anyhow::Result;
use multiworld_game::{
    Item, ItemClassification, ItemCode, LocationCode, PlayerId, Requirement, MENU_REGION,
};
use rand::seq::SliceRandom;
use serde_json::json;
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::error::GenerationError;
use crate::multiworld::MultiWorld;
use crate::options::{OptionDef, LOCAL_ITEMS, NON_LOCAL_ITEMS};
use crate::preset::Preset;
use crate::world::{SlotData, World, WorldType};

pub const GAME: &str = "Pharcryption";

const GAME_ID_OFFSET: i64 = 420_000_000;
const MAX_LOCATIONS: usize = 3_000;
const MAX_OTHER_WORLDS: usize = 100;
const MIN_TIMELIMIT_SECONDS: i64 = 30 * 60;

// Coin items and the value each one is worth:
pub const PHARCOINS: [(&str, usize); 3] = [("1 Pharcoin", 1), ("2 Pharcoins", 2), ("3 Pharcoins", 3)];

fn location_name(n: usize) -> String {
    format!("Encrypted Item #{n}")
}

fn coin_weights() -> Vec<(String, usize)> {
    PHARCOINS
        .iter()
        .map(|&(name, value)| (name.to_string(), value))
        .collect()
}

/// Participants that count towards the ransom: everyone not playing Pharcryption.
fn world_count(mw: &MultiWorld) -> usize {
    mw.player_ids()
        .filter(|&p| mw.player(p).game != GAME)
        .count()
}

pub struct Pharcryption {
    item_name_to_id: BTreeMap<String, ItemCode>,
    location_name_to_id: BTreeMap<String, LocationCode>,
}

impl Pharcryption {
    pub fn new() -> Self {
        let item_name_to_id = PHARCOINS
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.to_string(), GAME_ID_OFFSET + i as i64))
            .collect();
        let location_name_to_id = (0..MAX_LOCATIONS)
            .map(|i| (location_name(i + 1), GAME_ID_OFFSET + i as i64))
            .collect();
        Pharcryption {
            item_name_to_id,
            location_name_to_id,
        }
    }
}

impl Default for Pharcryption {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldType for Pharcryption {
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
        vec![
            OptionDef::range("encrypted_items", 10, 50, 15),
            OptionDef::range("free_decryptions", 0, 5, 1),
            OptionDef::range("payment_amount", 1, 10, 5),
            OptionDef::range("extra_pharcoins", 0, 100, 0),
            OptionDef::default_on_toggle("enable_timelimit"),
            OptionDef::range("timelimit_days", 0, 31, 0),
            OptionDef::range("timelimit_hours", 0, 23, 4),
            OptionDef::range("timelimit_minutes", 0, 59, 0),
        ]
    }

    fn presets(&self) -> Vec<Preset> {
        vec![
            Preset::new(
                "Quick",
                &[
                    ("encrypted_items", Value::from(10)),
                    ("payment_amount", Value::from(2)),
                    ("extra_pharcoins", Value::from(5)),
                    ("timelimit_hours", Value::from(1)),
                ],
            ),
            Preset::new(
                "Lax",
                &[
                    ("free_decryptions", Value::from(3)),
                    ("extra_pharcoins", Value::from(20)),
                    ("enable_timelimit", Value::Bool(false)),
                ],
            ),
        ]
    }

    fn create_item(&self, name: &str, player: PlayerId) -> Result<Item> {
        Ok(Item::new(
            name,
            ItemClassification::Progression,
            Some(self.item_code(name)?),
            player,
        ))
    }

    fn assert_generate(&self, mw: &MultiWorld) -> Result<()> {
        let invariant = |message: String| GenerationError::Invariant {
            game: GAME.to_string(),
            message,
        };
        let pharcryption_worlds = mw.players_of_game(GAME).len();
        if pharcryption_worlds > 1 {
            return Err(invariant(format!(
                "only 1 Pharcryption world allowed, found {pharcryption_worlds}"
            ))
            .into());
        }
        let others = world_count(mw);
        if others == 0 {
            return Err(invariant("at least 1 other playable world is required".to_string()).into());
        }
        if others > MAX_OTHER_WORLDS {
            return Err(invariant(format!(
                "at most {MAX_OTHER_WORLDS} other worlds allowed, found {others}"
            ))
            .into());
        }
        Ok(())
    }

    fn create_world(&self, player: PlayerId) -> Box<dyn World> {
        Box::new(PharcryptionWorld {
            player,
            world_count: 0,
            encrypted_items: 0,
        })
    }
}

struct PharcryptionWorld {
    player: PlayerId,
    world_count: usize,
    encrypted_items: usize,
}

impl PharcryptionWorld {
    fn timelimit_seconds(&self, mw: &MultiWorld) -> Result<i64> {
        let options = mw.options(self.player);
        Ok(options.int("timelimit_days")? * 86_400
            + options.int("timelimit_hours")? * 3_600
            + options.int("timelimit_minutes")? * 60)
    }

    fn num_locations(&self) -> usize {
        self.encrypted_items * self.world_count
    }
}

impl World for PharcryptionWorld {
    fn player(&self) -> PlayerId {
        self.player
    }

    fn generate_early(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let player = self.player;
        // Coins always go to other participants.
        mw.options_mut(player).set_mut(LOCAL_ITEMS)?.clear();
        let non_local = mw.options_mut(player).set_mut(NON_LOCAL_ITEMS)?;
        for (name, _) in PHARCOINS {
            non_local.insert(name.to_string());
        }

        self.world_count = world_count(mw);
        self.encrypted_items = mw.options(player).int("encrypted_items")? as usize;
        if mw.options(player).bool("enable_timelimit")?
            && self.timelimit_seconds(mw)? < MIN_TIMELIMIT_SECONDS
        {
            return Err(GenerationError::Configuration {
                player,
                name: mw.player_name(player).to_string(),
                message: "If timelimit is enabled, timelimit must be at least 30 minutes."
                    .to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn create_regions(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let menu = mw.graph.create_region(self.player, MENU_REGION)?;
        let ransomware = mw.graph.create_region(self.player, "Ransomware")?;
        mw.graph
            .connect_regions(menu, ransomware, "Legit Download", Requirement::Free)?;
        for n in 1..=self.num_locations() {
            let loc = mw.add_location(ransomware, &location_name(n))?;
            mw.graph.locations[loc].priority = true;
        }
        Ok(())
    }

    /// One coin per location. Each extra pharcoin upgrades a single coin by one or two.
    fn create_items(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let mut items_to_create = self.num_locations();
        let mut extra_to_create = mw.options(self.player).int("extra_pharcoins")?;
        while extra_to_create > 0 && items_to_create > 0 {
            let extra = *[1, 2].choose(&mut mw.rng).unwrap_or(&1);
            if extra_to_create == 1 || extra == 1 {
                mw.add_pool_item(self.player, "2 Pharcoins")?;
            } else {
                mw.add_pool_item(self.player, "3 Pharcoins")?;
            }
            extra_to_create -= extra;
            items_to_create -= 1;
        }
        for _ in 0..items_to_create {
            mw.add_pool_item(self.player, "1 Pharcoin")?;
        }
        Ok(())
    }

    /// Locations open in batches of `payment_amount`, each batch costing that many more coins.
    fn set_rules(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let payment = mw.options(self.player).int("payment_amount")? as usize;
        let total_value: usize = mw
            .itempool
            .iter()
            .filter(|item| item.player == self.player)
            .map(|item| {
                PHARCOINS
                    .iter()
                    .find(|(name, _)| *name == item.name)
                    .map_or(0, |&(_, value)| value)
            })
            .sum();
        for i in 0..self.num_locations() {
            let required = (payment * (i / payment + 1)).min(total_value);
            let loc = mw.graph.location_idx(self.player, &location_name(i + 1))?;
            mw.graph.set_location_rule(
                loc,
                Requirement::ItemValue {
                    player: self.player,
                    items: coin_weights(),
                    amount: required,
                },
            );
        }
        mw.set_completion_condition(
            self.player,
            Requirement::ItemValue {
                player: self.player,
                items: coin_weights(),
                amount: self.world_count,
            },
        );
        Ok(())
    }

    fn fill_slot_data(&self, mw: &MultiWorld) -> Result<SlotData> {
        let options = mw.options(self.player);
        let mut slot_data = SlotData::new();
        slot_data.insert("world_count".to_string(), json!(self.world_count));
        slot_data.insert("encrypted_items".to_string(), json!(self.encrypted_items));
        slot_data.insert(
            "free_decryptions".to_string(),
            json!(options.int("free_decryptions")?),
        );
        slot_data.insert(
            "payment_amount".to_string(),
            json!(options.int("payment_amount")?),
        );
        slot_data.insert(
            "enable_timelimit".to_string(),
            json!(options.bool("enable_timelimit")?),
        );
        slot_data.insert("timelimit".to_string(), json!(self.timelimit_seconds(mw)?));
        Ok(slot_data)
    }
}
