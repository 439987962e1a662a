use serde::{Deserialize, Serialize};

use crate::multiworld::{MultiWorld, PlayerInfo};
use crate::traverse::playthrough_spheres;
use multiworld_game::LocationIdx;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpoilerItemLoc {
    pub item: String,
    pub item_player: String,
    pub location: String,
    pub location_player: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpoilerSummary {
    pub step: usize,
    pub items: Vec<SpoilerItemLoc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpoilerStartInventory {
    pub player: String,
    pub items: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpoilerLog {
    pub seed: u64,
    pub players: Vec<PlayerInfo>,
    pub start_inventory: Vec<SpoilerStartInventory>,
    // Spheres of progression, in the order they open up:
    pub summary: Vec<SpoilerSummary>,
    pub all_items: Vec<SpoilerItemLoc>,
}

fn item_loc(mw: &MultiWorld, loc: LocationIdx) -> Option<SpoilerItemLoc> {
    let location = &mw.graph.locations[loc];
    let item = location.item.as_ref()?;
    Some(SpoilerItemLoc {
        item: item.name.clone(),
        item_player: mw.player_name(item.player).to_string(),
        location: location.name.clone(),
        location_player: mw.player_name(location.player).to_string(),
    })
}

pub fn get_spoiler_log(mw: &MultiWorld) -> SpoilerLog {
    let start_inventory = mw
        .player_ids()
        .map(|p| SpoilerStartInventory {
            player: mw.player_name(p).to_string(),
            items: mw.precollected[p].iter().map(|i| i.name.clone()).collect(),
        })
        .collect();
    let summary = playthrough_spheres(mw)
        .into_iter()
        .enumerate()
        .map(|(step, sphere)| SpoilerSummary {
            step: step + 1,
            items: sphere.into_iter().filter_map(|loc| item_loc(mw, loc)).collect(),
        })
        .collect();
    let all_items = (0..mw.graph.locations.len())
        .filter(|&loc| !mw.graph.locations[loc].is_event())
        .filter_map(|loc| item_loc(mw, loc))
        .collect();
    SpoilerLog {
        seed: mw.seed,
        players: mw.players.clone(),
        start_inventory,
        summary,
        all_items,
    }
}
