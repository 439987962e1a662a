use anyhow::Result;
use hashbrown::HashSet;
use log::{info, warn};
use multiworld_game::{
    ItemClassification, ItemCode, LocationCode, PlayerId, MENU_REGION,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::GenerationError;
use crate::fill::distribute_items_restrictive;
use crate::multiworld::{MultiWorld, PlayerInfo};
use crate::options::{resolve_options, ResolvedOptions, PRIORITY_LOCATIONS, START_INVENTORY};
use crate::player_options::{validate_player_name, PlayerSettings};
use crate::preset::apply_preset;
use crate::spoiler_log::{get_spoiler_log, SpoilerLog};
use crate::traverse::unbeaten_players;
use crate::world::{SlotData, World, WorldRegistry, WorldType};

/// One filled, non-event location of the final assignment.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Placement {
    pub location_player: PlayerId,
    pub location: String,
    pub location_code: LocationCode,
    pub item_player: PlayerId,
    pub item: String,
    pub item_code: Option<ItemCode>,
    pub classification: ItemClassification,
}

#[derive(Serialize, Clone, Debug)]
pub struct GenerationOutput {
    pub seed: u64,
    pub players: Vec<PlayerInfo>,
    pub placements: Vec<Placement>,
    pub slot_data: BTreeMap<PlayerId, SlotData>,
    pub spoiler: SpoilerLog,
}

pub struct Generator<'a> {
    pub registry: &'a WorldRegistry,
    pub settings: &'a [PlayerSettings],
}

type ResolvedPlayer = (PlayerInfo, Arc<dyn WorldType>, ResolvedOptions);

impl<'a> Generator<'a> {
    pub fn new(registry: &'a WorldRegistry, settings: &'a [PlayerSettings]) -> Self {
        Generator { registry, settings }
    }

    /// Validates names and options of every participant, in slot order. Every participant
    /// is checked; a single failing participant is reported as its own error, several
    /// together as `InvalidPlayers`.
    pub fn resolve_players(&self) -> Result<Vec<ResolvedPlayer>> {
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(self.settings.len());
        let mut failures: Vec<GenerationError> = vec![];
        for (i, settings) in self.settings.iter().enumerate() {
            match self.resolve_player(i + 1, settings, &mut seen_names) {
                Ok(resolved) => out.push(resolved),
                Err(e) => failures.push(e),
            }
        }
        if failures.len() > 1 {
            return Err(GenerationError::InvalidPlayers { failures }.into());
        }
        if let Some(e) = failures.pop() {
            return Err(e.into());
        }
        Ok(out)
    }

    fn resolve_player(
        &self,
        player: PlayerId,
        settings: &PlayerSettings,
        seen_names: &mut HashSet<String>,
    ) -> Result<ResolvedPlayer, GenerationError> {
        let configuration_error = |message: String| GenerationError::Configuration {
            player,
            name: settings.name.clone(),
            message,
        };
        let problems = validate_player_name(&settings.name);
        if !problems.is_empty() {
            return Err(configuration_error(problems.join("; ")));
        }
        if !seen_names.insert(settings.name.to_lowercase()) {
            return Err(configuration_error(format!(
                "name '{}' is used by more than one participant",
                settings.name
            )));
        }
        let Some(world_type) = self.registry.get(&settings.game) else {
            let known: Vec<&str> = self.registry.games().collect();
            return Err(configuration_error(format!(
                "unknown game '{}' (known: {})",
                settings.game,
                known.join(", ")
            )));
        };

        let mut raw = settings.options.clone();
        let mut errors = vec![];
        if let Err(e) = apply_preset(&mut raw, &world_type.presets()) {
            errors.push(e);
        }
        let defs = world_type.all_option_definitions();
        match resolve_options(&defs, &raw, &world_type.name_tables()) {
            Ok(options) if errors.is_empty() => {
                let info = PlayerInfo {
                    id: player,
                    name: settings.name.clone(),
                    game: settings.game.clone(),
                };
                Ok((info, world_type, options))
            }
            Ok(_) => Err(GenerationError::InvalidOptions {
                player,
                name: settings.name.clone(),
                errors,
            }),
            Err(errs) => {
                errors.extend(errs);
                Err(GenerationError::InvalidOptions {
                    player,
                    name: settings.name.clone(),
                    errors,
                })
            }
        }
    }

    pub fn generate(&self, attempt_num: usize, seed: u64) -> Result<GenerationOutput> {
        let players = self.resolve_players()?;
        let mut mw = MultiWorld::new(seed, players);
        info!(
            "[attempt {attempt_num}] Generating seed {seed} for {} players",
            mw.num_players()
        );

        // Class-level hooks run once per game, in order of first appearance.
        let mut world_types: Vec<Arc<dyn WorldType>> = vec![];
        for player in mw.player_ids() {
            let world_type = mw.world_type(player);
            if !world_types.iter().any(|t| t.game() == world_type.game()) {
                world_types.push(world_type.clone());
            }
        }
        for world_type in &world_types {
            world_type.assert_generate(&mw)?;
        }

        let mut worlds: Vec<Box<dyn World>> = mw
            .player_ids()
            .map(|p| mw.world_type(p).create_world(p))
            .collect();

        for world in worlds.iter_mut() {
            world.generate_early(&mut mw)?;
        }
        mw.refresh_locality()?;
        precollect_start_inventory(&mut mw)?;

        for world in worlds.iter_mut() {
            world.create_regions(&mut mw)?;
        }
        for player in mw.player_ids() {
            if mw.graph.find_region(player, MENU_REGION).is_none() {
                return Err(GenerationError::Invariant {
                    game: mw.player(player).game.clone(),
                    message: format!(
                        "{} has no region named '{MENU_REGION}'",
                        mw.player_name(player)
                    ),
                }
                .into());
            }
        }
        info!(
            "[attempt {attempt_num}] Created {} regions, {} locations, {} entrances",
            mw.graph.regions.len(),
            mw.graph.locations.len(),
            mw.graph.entrances.len()
        );

        for world in worlds.iter_mut() {
            world.create_items(&mut mw)?;
        }
        for world in worlds.iter_mut() {
            world.set_rules(&mut mw)?;
        }
        apply_priority_locations(&mut mw)?;
        for world in worlds.iter_mut() {
            world.generate_basic(&mut mw)?;
        }
        for world_type in &world_types {
            world_type.pre_fill(&mut mw)?;
        }

        check_counts(&mw)?;
        distribute_items_restrictive(&mut mw)?;

        let unbeaten = unbeaten_players(&mw);
        if !unbeaten.is_empty() {
            return Err(GenerationError::Unbeatable {
                players: unbeaten
                    .into_iter()
                    .map(|p| mw.player_name(p).to_string())
                    .collect(),
            }
            .into());
        }

        let spoiler = get_spoiler_log(&mw);
        info!(
            "[attempt {attempt_num}] Success: {} spheres of progression",
            spoiler.summary.len()
        );

        let mut slot_data = BTreeMap::new();
        for world in &worlds {
            slot_data.insert(world.player(), world.fill_slot_data(&mw)?);
        }

        Ok(GenerationOutput {
            seed,
            players: mw.players.clone(),
            placements: get_placements(&mw),
            slot_data,
            spoiler,
        })
    }
}

fn precollect_start_inventory(mw: &mut MultiWorld) -> Result<()> {
    for player in mw.player_ids() {
        let counts = mw.options(player).counter(START_INVENTORY)?.clone();
        for (name, count) in counts {
            for _ in 0..count {
                let item = mw.create_item(player, &name)?;
                mw.push_precollected(item);
            }
        }
    }
    Ok(())
}

fn apply_priority_locations(mw: &mut MultiWorld) -> Result<()> {
    for player in mw.player_ids() {
        let names = mw.options(player).set(PRIORITY_LOCATIONS)?.clone();
        for name in names {
            match mw.graph.location_idx(player, &name) {
                Ok(loc) => mw.graph.locations[loc].priority = true,
                Err(_) => warn!(
                    "{}: priority location '{name}' was not created, ignoring it",
                    mw.player_name(player)
                ),
            }
        }
    }
    Ok(())
}

fn check_counts(mw: &MultiWorld) -> Result<()> {
    let unfilled = mw.graph.unfilled_locations();
    if mw.itempool.len() == unfilled.len() {
        return Ok(());
    }
    let breakdown: Vec<String> = mw
        .player_ids()
        .map(|p| {
            let items = mw.itempool.iter().filter(|i| i.player == p).count();
            let locations = unfilled
                .iter()
                .filter(|&&l| mw.graph.locations[l].player == p)
                .count();
            format!("{}: {items} items, {locations} locations", mw.player_name(p))
        })
        .collect();
    Err(GenerationError::CountMismatch {
        items: mw.itempool.len(),
        locations: unfilled.len(),
        breakdown: breakdown.join("; "),
    }
    .into())
}

fn get_placements(mw: &MultiWorld) -> Vec<Placement> {
    mw.graph
        .locations
        .iter()
        .filter_map(|location| {
            let location_code = location.code?;
            let item = location.item.as_ref()?;
            Some(Placement {
                location_player: location.player,
                location: location.name.clone(),
                location_code,
                item_player: item.player,
                item: item.name.clone(),
                item_code: item.code,
                classification: item.classification,
            })
        })
        .collect()
}
