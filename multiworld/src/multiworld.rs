use anyhow::{Context, Result};
use log::warn;
use multiworld_game::{Item, LocationIdx, PlayerId, RegionIdx, Requirement, WorldGraph};
use multiworld_logic::CollectionState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::options::{ResolvedOptions, LOCAL_ITEMS, NON_LOCAL_ITEMS};
use crate::world::WorldType;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub game: String,
}

/// Everything one generation run works on. Owned by the orchestrator and passed by
/// reference into every stage.
pub struct MultiWorld {
    pub seed: u64,
    pub rng: StdRng,
    // Index i describes player i + 1:
    pub players: Vec<PlayerInfo>,
    world_types: Vec<Arc<dyn WorldType>>,
    options: Vec<ResolvedOptions>,
    pub graph: WorldGraph,
    pub itempool: Vec<Item>,
    // Indexed by PlayerId; index 0 is unused.
    pub precollected: Vec<Vec<Item>>,
    pub completion_conditions: Vec<Requirement>,
    local_items: Vec<BTreeSet<String>>,
    non_local_items: Vec<BTreeSet<String>>,
    // Items guaranteed from the start, i.e. precollected ones:
    pub state: CollectionState,
}

pub fn seeded_rng(seed: u64) -> StdRng {
    let mut rng_seed = [0u8; 32];
    rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
    StdRng::from_seed(rng_seed)
}

impl MultiWorld {
    pub fn new(
        seed: u64,
        players: Vec<(PlayerInfo, Arc<dyn WorldType>, ResolvedOptions)>,
    ) -> Self {
        let num_players = players.len();
        let mut infos = Vec::with_capacity(num_players);
        let mut world_types = Vec::with_capacity(num_players);
        let mut options = Vec::with_capacity(num_players);
        for (info, world_type, opts) in players {
            infos.push(info);
            world_types.push(world_type);
            options.push(opts);
        }
        MultiWorld {
            seed,
            rng: seeded_rng(seed),
            players: infos,
            world_types,
            options,
            graph: WorldGraph::default(),
            itempool: vec![],
            precollected: vec![vec![]; num_players + 1],
            // Participants that never set a goal are considered done.
            completion_conditions: vec![Requirement::Free; num_players + 1],
            local_items: vec![BTreeSet::new(); num_players + 1],
            non_local_items: vec![BTreeSet::new(); num_players + 1],
            state: CollectionState::new(num_players),
        }
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        1..=self.players.len()
    }

    pub fn player(&self, player: PlayerId) -> &PlayerInfo {
        &self.players[player - 1]
    }

    pub fn player_name(&self, player: PlayerId) -> &str {
        &self.players[player - 1].name
    }

    pub fn world_type(&self, player: PlayerId) -> &Arc<dyn WorldType> {
        &self.world_types[player - 1]
    }

    pub fn options(&self, player: PlayerId) -> &ResolvedOptions {
        &self.options[player - 1]
    }

    pub fn options_mut(&mut self, player: PlayerId) -> &mut ResolvedOptions {
        &mut self.options[player - 1]
    }

    pub fn players_of_game(&self, game: &str) -> Vec<PlayerId> {
        self.player_ids()
            .filter(|&p| self.player(p).game == game)
            .collect()
    }

    pub fn create_item(&self, player: PlayerId, name: &str) -> Result<Item> {
        self.world_type(player)
            .create_item(name, player)
            .with_context(|| format!("unable to create '{name}' for {}", self.player_name(player)))
    }

    pub fn add_pool_item(&mut self, player: PlayerId, name: &str) -> Result<()> {
        let item = self.create_item(player, name)?;
        self.itempool.push(item);
        Ok(())
    }

    /// Adds a location whose id comes from the owner's location table.
    pub fn add_location(&mut self, region: RegionIdx, name: &str) -> Result<LocationIdx> {
        let player = self.graph.region(region)?.player;
        let code = self.world_type(player).location_code(name)?;
        self.graph.add_location(region, name, Some(code))
    }

    pub fn push_precollected(&mut self, item: Item) {
        self.state.collect(&item);
        self.precollected[item.player].push(item);
    }

    pub fn set_completion_condition(&mut self, player: PlayerId, req: Requirement) {
        self.completion_conditions[player] = req;
    }

    /// Reads local/non-local item sets out of the options. An item listed in both is kept
    /// non-local only.
    pub fn refresh_locality(&mut self) -> Result<()> {
        for player in 1..=self.num_players() {
            let non_local = self.options(player).set(NON_LOCAL_ITEMS)?.clone();
            let mut local = self.options(player).set(LOCAL_ITEMS)?.clone();
            let overlap: Vec<String> = local.intersection(&non_local).cloned().collect();
            if !overlap.is_empty() {
                warn!(
                    "{}: items marked both local and non-local, keeping them non-local: {}",
                    self.player_name(player),
                    overlap.join(", ")
                );
                for name in &overlap {
                    local.remove(name);
                }
            }
            self.local_items[player] = local;
            self.non_local_items[player] = non_local;
        }
        Ok(())
    }

    /// Whether the owner's locality rules let `item` sit at `loc`.
    pub fn item_allowed_at(&self, item: &Item, loc: LocationIdx) -> bool {
        let same_player = self.graph.locations[loc].player == item.player;
        if same_player && self.non_local_items[item.player].contains(&item.name) {
            return false;
        }
        if !same_player && self.local_items[item.player].contains(&item.name) {
            return false;
        }
        true
    }

    pub fn describe_item(&self, item: &Item) -> String {
        format!("{} ({})", item.name, self.player_name(item.player))
    }

    pub fn describe_location(&self, loc: LocationIdx) -> String {
        let location = &self.graph.locations[loc];
        format!("{} ({})", location.name, self.player_name(location.player))
    }
}
