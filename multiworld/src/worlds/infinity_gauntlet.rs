use anyhow::Result;
use multiworld_game::{
    Item, ItemClassification, ItemCode, LocationCode, PlayerId, Requirement, MENU_REGION,
};
use std::collections::BTreeMap;

use crate::multiworld::MultiWorld;
use crate::world::{World, WorldType};

pub const GAME: &str = "Infinity Gauntlet";

pub const STONES: [&str; 6] = [
    "Space Stone",
    "Reality Stone",
    "Power Stone",
    "Soul Stone",
    "Mind Stone",
    "Time Stone",
];

const STONE_BASE_ID: i64 = 69_888_000;
const DUSTED_BASE_ID: i64 = 69_889_000;

// Snapped remains of another game's items, offset by that item's id there.
const DUSTED_REMAINS: [(&str, i64); 21] = [
    ("the dusted remains of a single arrow", 0x43),
    ("the dusted remains of 10 arrows", 0x44),
    ("the dusted remains of a single bomb", 0x27),
    ("the dusted remains of 3 bombs", 0x28),
    ("the dusted remains of 10 bombs", 0x31),
    ("the dusted remains of some Red Mail", 0x60),
    ("the dusted remains of a Mirror Shield", 0x5F),
    ("the dusted remains of a Boss Heart Container", 0x3E),
    ("the dusted remains of a Sanctuary Heart Container", 0x3F),
    ("the dusted remains of a Piece of Heart", 0x17),
    ("the dusted remains of a green rupee", 0x34),
    ("the dusted remains of a blue rupee", 0x35),
    ("the dusted remains of a red rupee", 0x36),
    ("the dusted remains of a purple rupee", 0x41),
    ("the dusted remains of an orange rupee", 0x40),
    ("the dusted remains of a silver rupee", 0x46),
    ("the dusted remains of a map", 9999),
    ("the dusted remains of a compass", 9998),
    ("the dusted remains of a bee", 0x0E),
    ("the dusted remains of a bunch of bees", 0xB0),
    ("the dusted remains of a sword", 0x5E),
];

fn location_name(stone: &str) -> String {
    format!("Taped to the {stone}")
}

pub struct InfinityGauntlet {
    item_name_to_id: BTreeMap<String, ItemCode>,
    location_name_to_id: BTreeMap<String, LocationCode>,
}

impl InfinityGauntlet {
    pub fn new() -> Self {
        let mut item_name_to_id = BTreeMap::new();
        let mut location_name_to_id = BTreeMap::new();
        for (i, stone) in STONES.iter().enumerate() {
            item_name_to_id.insert(stone.to_string(), STONE_BASE_ID + i as i64);
            location_name_to_id.insert(location_name(stone), STONE_BASE_ID + i as i64);
        }
        for (name, offset) in DUSTED_REMAINS {
            item_name_to_id.insert(name.to_string(), DUSTED_BASE_ID + offset);
        }
        InfinityGauntlet {
            item_name_to_id,
            location_name_to_id,
        }
    }
}

impl Default for InfinityGauntlet {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldType for InfinityGauntlet {
    fn game(&self) -> &'static str {
        GAME
    }

    fn item_name_to_id(&self) -> &BTreeMap<String, ItemCode> {
        &self.item_name_to_id
    }

    fn location_name_to_id(&self) -> &BTreeMap<String, LocationCode> {
        &self.location_name_to_id
    }

    fn create_item(&self, name: &str, player: PlayerId) -> Result<Item> {
        let classification = if name.starts_with("the dusted") {
            ItemClassification::Trap
        } else {
            ItemClassification::ProgressionSkipBalancing
        };
        Ok(Item::new(
            name,
            classification,
            Some(self.item_code(name)?),
            player,
        ))
    }

    fn create_world(&self, player: PlayerId) -> Box<dyn World> {
        Box::new(InfinityGauntletWorld { player })
    }
}

struct InfinityGauntletWorld {
    player: PlayerId,
}

impl World for InfinityGauntletWorld {
    fn player(&self) -> PlayerId {
        self.player
    }

    fn create_regions(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let menu = mw.graph.create_region(self.player, MENU_REGION)?;
        for stone in STONES {
            mw.add_location(menu, &location_name(stone))?;
        }
        Ok(())
    }

    fn create_items(&mut self, mw: &mut MultiWorld) -> Result<()> {
        for stone in STONES {
            mw.add_pool_item(self.player, stone)?;
        }
        Ok(())
    }

    fn set_rules(&mut self, mw: &mut MultiWorld) -> Result<()> {
        for stone in STONES {
            let loc = mw.graph.location_idx(self.player, &location_name(stone))?;
            mw.graph
                .set_location_rule(loc, Requirement::item(self.player, stone));
        }
        mw.set_completion_condition(self.player, Requirement::all_items(self.player, &STONES));
        Ok(())
    }
}
