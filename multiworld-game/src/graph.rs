use anyhow::{bail, ensure, Context, Result};

use crate::{
    EntranceIdx, IndexedVec, Item, LocationCode, LocationIdx, PlayerId, RegionIdx, Requirement,
};

#[derive(Clone, Debug)]
pub struct Region {
    pub name: String,
    pub player: PlayerId,
    pub locations: Vec<LocationIdx>,
    pub exits: Vec<EntranceIdx>,
}

#[derive(Clone, Debug)]
pub struct Location {
    pub name: String,
    // None for event locations:
    pub code: Option<LocationCode>,
    pub player: PlayerId,
    pub region: RegionIdx,
    pub access_rule: Requirement,
    pub item: Option<Item>,
    pub locked: bool,
    pub priority: bool,
}

impl Location {
    pub fn is_event(&self) -> bool {
        self.code.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct Entrance {
    pub name: String,
    pub player: PlayerId,
    pub parent_region: RegionIdx,
    pub connected_region: Option<RegionIdx>,
    pub access_rule: Requirement,
}

/// Region/location/entrance graph of every participant, stored in flat arenas.
/// Nodes are append-only; only placed items and rules change after creation.
/// Structural and rule changes made through these methods bump `revision()`.
#[derive(Default, Clone, Debug)]
pub struct WorldGraph {
    pub regions: Vec<Region>,
    pub locations: Vec<Location>,
    pub entrances: Vec<Entrance>,
    region_isv: IndexedVec<(PlayerId, String)>,
    location_isv: IndexedVec<(PlayerId, String)>,
    entrance_isv: IndexedVec<(PlayerId, String)>,
    revision: u64,
}

impl WorldGraph {
    /// Changes whenever a region, location or entrance is added, wired or re-ruled.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn create_region(&mut self, player: PlayerId, name: &str) -> Result<RegionIdx> {
        let key = (player, name.to_string());
        ensure!(
            self.region_isv.get(&key).is_none(),
            "player {player} already has a region named '{name}'"
        );
        let idx = self.region_isv.add(&key);
        self.regions.push(Region {
            name: name.to_string(),
            player,
            locations: vec![],
            exits: vec![],
        });
        self.revision += 1;
        Ok(idx)
    }

    pub fn add_location(
        &mut self,
        region: RegionIdx,
        name: &str,
        code: Option<LocationCode>,
    ) -> Result<LocationIdx> {
        let player = self.region(region)?.player;
        let key = (player, name.to_string());
        ensure!(
            self.location_isv.get(&key).is_none(),
            "player {player} already has a location named '{name}'"
        );
        let idx = self.location_isv.add(&key);
        self.locations.push(Location {
            name: name.to_string(),
            code,
            player,
            region,
            access_rule: Requirement::Free,
            item: None,
            locked: false,
            priority: false,
        });
        self.regions[region].locations.push(idx);
        self.revision += 1;
        Ok(idx)
    }

    /// Adds an id-less location holding a locked item that exists only for logic.
    pub fn add_event(&mut self, region: RegionIdx, name: &str, item: Item) -> Result<LocationIdx> {
        ensure!(
            item.is_event(),
            "event location '{name}' must hold an event item, got '{}'",
            item.name
        );
        let idx = self.add_location(region, name, None)?;
        self.place_locked_item(idx, item)?;
        Ok(idx)
    }

    pub fn create_exit(&mut self, region: RegionIdx, name: &str) -> Result<EntranceIdx> {
        let player = self.region(region)?.player;
        let key = (player, name.to_string());
        ensure!(
            self.entrance_isv.get(&key).is_none(),
            "player {player} already has an entrance named '{name}'"
        );
        let idx = self.entrance_isv.add(&key);
        self.entrances.push(Entrance {
            name: name.to_string(),
            player,
            parent_region: region,
            connected_region: None,
            access_rule: Requirement::Free,
        });
        self.regions[region].exits.push(idx);
        self.revision += 1;
        Ok(idx)
    }

    pub fn connect(&mut self, entrance: EntranceIdx, target: RegionIdx) -> Result<()> {
        let target_player = self.region(target)?.player;
        let e = self
            .entrances
            .get_mut(entrance)
            .with_context(|| format!("no entrance with index {entrance}"))?;
        if e.player != target_player {
            bail!(
                "entrance '{}' of player {} cannot lead into player {target_player}'s graph",
                e.name,
                e.player
            );
        }
        e.connected_region = Some(target);
        self.revision += 1;
        Ok(())
    }

    pub fn connect_regions(
        &mut self,
        from: RegionIdx,
        to: RegionIdx,
        name: &str,
        rule: Requirement,
    ) -> Result<EntranceIdx> {
        let idx = self.create_exit(from, name)?;
        self.connect(idx, to)?;
        self.set_entrance_rule(idx, rule);
        Ok(idx)
    }

    pub fn region(&self, idx: RegionIdx) -> Result<&Region> {
        self.regions
            .get(idx)
            .with_context(|| format!("no region with index {idx}"))
    }

    pub fn region_idx(&self, player: PlayerId, name: &str) -> Result<RegionIdx> {
        self.find_region(player, name)
            .with_context(|| format!("no region named '{name}' for player {player}"))
    }

    pub fn find_region(&self, player: PlayerId, name: &str) -> Option<RegionIdx> {
        self.region_isv.get(&(player, name.to_string()))
    }

    pub fn location_idx(&self, player: PlayerId, name: &str) -> Result<LocationIdx> {
        self.location_isv
            .get(&(player, name.to_string()))
            .with_context(|| format!("no location named '{name}' for player {player}"))
    }

    pub fn entrance_idx(&self, player: PlayerId, name: &str) -> Result<EntranceIdx> {
        self.entrance_isv
            .get(&(player, name.to_string()))
            .with_context(|| format!("no entrance named '{name}' for player {player}"))
    }

    pub fn set_location_rule(&mut self, idx: LocationIdx, rule: Requirement) {
        self.locations[idx].access_rule = rule;
        self.revision += 1;
    }

    pub fn set_entrance_rule(&mut self, idx: EntranceIdx, rule: Requirement) {
        self.entrances[idx].access_rule = rule;
        self.revision += 1;
    }

    pub fn place_item(&mut self, idx: LocationIdx, item: Item) -> Result<()> {
        let loc = &mut self.locations[idx];
        if let Some(existing) = &loc.item {
            bail!(
                "location '{}' of player {} already holds '{}'",
                loc.name,
                loc.player,
                existing.name
            );
        }
        loc.item = Some(item);
        Ok(())
    }

    pub fn place_locked_item(&mut self, idx: LocationIdx, item: Item) -> Result<()> {
        self.place_item(idx, item)?;
        self.locations[idx].locked = true;
        Ok(())
    }

    pub fn player_locations(&self, player: PlayerId) -> impl Iterator<Item = LocationIdx> + '_ {
        self.locations
            .iter()
            .enumerate()
            .filter(move |(_, loc)| loc.player == player)
            .map(|(i, _)| i)
    }

    pub fn unfilled_locations(&self) -> Vec<LocationIdx> {
        (0..self.locations.len())
            .filter(|&i| self.locations[i].item.is_none())
            .collect()
    }

    pub fn unfilled_locations_for(&self, player: PlayerId) -> Vec<LocationIdx> {
        self.player_locations(player)
            .filter(|&i| self.locations[i].item.is_none())
            .collect()
    }
}
