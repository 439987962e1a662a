use anyhow::Result;
use log::{info, warn};
use multiworld_game::{Item, ItemClassification, ItemCode, LocationCode, PlayerId, MENU_REGION};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use crate::fill::{fill_restrictive, FillOptions};
use crate::multiworld::MultiWorld;
use crate::traverse::get_all_state;
use crate::world::{World, WorldType};

pub const GAME: &str = "Pharcryption 2";

// Octal 31 is decimal 25.
const BASE_ID_OFFSET: i64 = 0o31_000000;

// Delivered to every other participant, in this order, as far as room allows.
const GIFTS: [&str; 7] = [
    "Milk & Cookies",
    "Milk & Cookies",
    "Milk & Cookies",
    "Milk & Cookies",
    "Milk & Cookies",
    "The Christmas Slay",
    "The Christmas Slay",
];

pub struct Santa {
    item_name_to_id: BTreeMap<String, ItemCode>,
    location_name_to_id: BTreeMap<String, LocationCode>,
}

impl Santa {
    pub fn new() -> Self {
        let item_name_to_id = ["Milk & Cookies", "The Christmas Slay", "Lump of Coal"]
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), BASE_ID_OFFSET + i as i64))
            .collect();
        // Listed for the id table only; no such location is ever created.
        let location_name_to_id = [("Dummy Location".to_string(), BASE_ID_OFFSET)].into();
        Santa {
            item_name_to_id,
            location_name_to_id,
        }
    }
}

impl Default for Santa {
    fn default() -> Self {
        Self::new()
    }
}

fn is_junk(item: &Item) -> bool {
    matches!(
        item.classification,
        ItemClassification::Filler | ItemClassification::Trap
    )
}

impl WorldType for Santa {
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
        let classification = if name == "Milk & Cookies" {
            ItemClassification::Useful
        } else {
            ItemClassification::Trap
        };
        Ok(Item::new(
            name,
            classification,
            Some(self.item_code(name)?),
            player,
        ))
    }

    fn filler_item_name(&self, _rng: &mut StdRng) -> Option<String> {
        Some("The Christmas Slay".to_string())
    }

    /// Hands gifts from the first Santa participant to everyone else. Each gift takes the
    /// place of one junk item of the receiving participant, so pool and location counts
    /// stay equal.
    fn pre_fill(&self, mw: &mut MultiWorld) -> Result<()> {
        let Some(&santa) = mw.players_of_game(GAME).first() else {
            return Ok(());
        };
        for player in mw.player_ids() {
            if mw.player(player).game == GAME {
                continue;
            }
            let mut locations = mw.graph.unfilled_locations_for(player);
            locations.shuffle(&mut mw.rng);

            let junk: Vec<usize> = mw
                .itempool
                .iter()
                .enumerate()
                .filter(|(_, item)| item.player == player && is_junk(item))
                .map(|(i, _)| i)
                .collect();
            let num_gifts = GIFTS.len().min(junk.len()).min(locations.len());
            if num_gifts < GIFTS.len() {
                warn!(
                    "[Santa] {} only has room for {num_gifts} gifts",
                    mw.player_name(player)
                );
            }
            if num_gifts == 0 {
                continue;
            }
            // Highest indices first, so the remaining ones stay valid.
            for &i in junk.iter().rev().take(num_gifts) {
                mw.itempool.remove(i);
            }
            let mut gifts = GIFTS[..num_gifts]
                .iter()
                .map(|name| self.create_item(name, santa))
                .collect::<Result<Vec<Item>>>()?;
            locations.truncate(num_gifts);

            let base_state = get_all_state(mw);
            fill_restrictive(
                mw,
                &base_state,
                &mut locations,
                &mut gifts,
                &FillOptions {
                    allow_partial: true,
                    ..FillOptions::new("Santa")
                },
            )?;
            if !gifts.is_empty() {
                info!(
                    "[Santa] {} gifts for {} go back to the pool",
                    gifts.len(),
                    mw.player_name(player)
                );
                mw.itempool.extend(gifts);
            }
        }
        Ok(())
    }

    fn create_world(&self, player: PlayerId) -> Box<dyn World> {
        Box::new(SantaWorld { player })
    }
}

struct SantaWorld {
    player: PlayerId,
}

impl World for SantaWorld {
    fn player(&self) -> PlayerId {
        self.player
    }

    fn create_regions(&mut self, mw: &mut MultiWorld) -> Result<()> {
        mw.graph.create_region(self.player, MENU_REGION)?;
        Ok(())
    }

    fn create_items(&mut self, _mw: &mut MultiWorld) -> Result<()> {
        Ok(())
    }

    // No goal: Santa is done once everyone else is.
    fn set_rules(&mut self, _mw: &mut MultiWorld) -> Result<()> {
        Ok(())
    }
}
