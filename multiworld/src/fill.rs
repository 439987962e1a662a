use anyhow::Result;
use hashbrown::HashMap;
use log::{debug, info, warn};
use multiworld_game::{Item, LocationIdx, PlayerId};
use multiworld_logic::CollectionState;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, VecDeque};

use crate::error::GenerationError;
use crate::multiworld::MultiWorld;
use crate::traverse::{can_beat_game, sweep_from_pool};

#[derive(Clone, Debug)]
pub struct FillOptions {
    // Used as the bracketed prefix of log lines and in errors:
    pub stage: &'static str,
    pub swap: bool,
    pub lock: bool,
    pub single_player_placement: bool,
    pub allow_partial: bool,
}

impl FillOptions {
    pub fn new(stage: &'static str) -> Self {
        FillOptions {
            stage,
            swap: true,
            lock: false,
            single_player_placement: false,
            allow_partial: false,
        }
    }
}

fn can_fill(mw: &MultiWorld, state: &mut CollectionState, item: &Item, loc: LocationIdx) -> bool {
    mw.graph.locations[loc].item.is_none()
        && mw.item_allowed_at(item, loc)
        && state.can_reach_location(loc, &mw.graph)
}

fn place(mw: &mut MultiWorld, loc: LocationIdx, item: Item, lock: bool, stage: &str) -> Result<()> {
    debug!(
        "[{stage}] {} -> {}",
        mw.describe_item(&item),
        mw.describe_location(loc)
    );
    mw.graph.place_item(loc, item)?;
    if lock {
        mw.graph.locations[loc].locked = true;
    }
    Ok(())
}

fn infeasible(
    mw: &MultiWorld,
    stage: &str,
    items: &[Item],
    locations: &[LocationIdx],
) -> GenerationError {
    GenerationError::FillInfeasible {
        stage: stage.to_string(),
        unplaced_items: items.iter().map(|item| mw.describe_item(item)).collect(),
        unfilled_locations: locations
            .iter()
            .map(|&loc| mw.describe_location(loc))
            .collect(),
    }
}

// Key: (owner, item name, unsafe pass).
type SwapCounts = HashMap<(PlayerId, String, bool), usize>;

/// Frees an earlier placement of this call for `item`, re-queueing the displaced item.
fn try_swap(
    mw: &mut MultiWorld,
    base_state: &CollectionState,
    queues: &mut BTreeMap<PlayerId, VecDeque<Item>>,
    placements: &mut Vec<LocationIdx>,
    swapped: &mut SwapCounts,
    item: &Item,
    opts: &FillOptions,
) -> Option<LocationIdx> {
    for unsafe_swap in [false, true] {
        for i in 0..placements.len() {
            let loc = placements[i];
            if opts.single_player_placement && mw.graph.locations[loc].player != item.player {
                continue;
            }
            let Some(placed) = mw.graph.locations[loc].item.take() else {
                continue;
            };
            let key = (placed.player, placed.name.clone(), unsafe_swap);
            // An unplaceable item can otherwise bounce between two spots forever.
            if swapped.get(&key).copied().unwrap_or(0) > 1 {
                mw.graph.locations[loc].item = Some(placed);
                continue;
            }
            // The unsafe pass assumes the displaced item can still be collected first.
            let held = if unsafe_swap { Some(&placed) } else { None };
            let mut swap_state =
                sweep_from_pool(base_state, queues.values().flatten().chain(held), &mw.graph);
            if can_fill(mw, &mut swap_state, item, loc) {
                placements.remove(i);
                *swapped.entry(key).or_insert(0) += 1;
                debug!(
                    "[{}] swapping {} out of {} for {}",
                    opts.stage,
                    mw.describe_item(&placed),
                    mw.describe_location(loc),
                    mw.describe_item(item)
                );
                queues.entry(placed.player).or_default().push_front(placed);
                return Some(loc);
            }
            mw.graph.locations[loc].item = Some(placed);
        }
    }
    None
}

/// Places items so that each one lands somewhere reachable without itself.
///
/// Items are taken one per owning participant per round. Each round computes the
/// maximum-exploration state: `base_state` plus every item not yet placed, swept over
/// what is already placed. An empty location is eligible if locality allows the item
/// there and it is reachable in that state. When nothing is eligible and `swap` is set, earlier
/// placements of this call are swapped out and retried.
///
/// Filled locations are removed from `locations`. Items that could not be placed are
/// left in `item_pool`. Returns the locations filled by this call.
pub fn fill_restrictive(
    mw: &mut MultiWorld,
    base_state: &CollectionState,
    locations: &mut Vec<LocationIdx>,
    item_pool: &mut Vec<Item>,
    opts: &FillOptions,
) -> Result<Vec<LocationIdx>> {
    let stage = opts.stage;
    let mut queues: BTreeMap<PlayerId, VecDeque<Item>> = BTreeMap::new();
    for item in item_pool.drain(..) {
        queues.entry(item.player).or_default().push_back(item);
    }
    let mut unplaced: Vec<Item> = vec![];
    let mut placements: Vec<LocationIdx> = vec![];
    let mut swapped = SwapCounts::new();
    let mut cleanup_required = false;

    while !locations.is_empty() && queues.values().any(|q| !q.is_empty()) {
        let mut items_to_place: VecDeque<Item> =
            queues.values_mut().filter_map(|q| q.pop_back()).collect();
        let mut max_state = sweep_from_pool(
            base_state,
            queues.values().flatten().chain(unplaced.iter()),
            &mw.graph,
        );
        while let Some(item) = items_to_place.pop_front() {
            let mut spot = None;
            for i in 0..locations.len() {
                let loc = locations[i];
                if opts.single_player_placement && mw.graph.locations[loc].player != item.player {
                    continue;
                }
                if can_fill(mw, &mut max_state, &item, loc) {
                    spot = Some(locations.remove(i));
                    break;
                }
            }
            if spot.is_none() && opts.swap {
                spot = try_swap(
                    mw,
                    base_state,
                    &mut queues,
                    &mut placements,
                    &mut swapped,
                    &item,
                    opts,
                );
                cleanup_required |= spot.is_some();
            }
            let Some(loc) = spot else {
                debug!("[{stage}] no spot for {}", mw.describe_item(&item));
                unplaced.push(item);
                continue;
            };
            place(mw, loc, item, opts.lock, stage)?;
            placements.push(loc);
        }
    }

    if cleanup_required {
        placements =
            undo_unreachable_placements(mw, base_state, placements, locations, &mut unplaced);
    }

    if !opts.allow_partial && !unplaced.is_empty() && !locations.is_empty() {
        if can_beat_game(mw) {
            warn!(
                "[{stage}] {} items have no valid location, but the multiworld is already beatable",
                unplaced.len()
            );
        } else {
            return Err(infeasible(mw, stage, &unplaced, locations).into());
        }
    }

    item_pool.extend(queues.into_values().flatten());
    item_pool.extend(unplaced);
    info!(
        "[{stage}] placed {} items, {} unplaced",
        placements.len(),
        item_pool.len()
    );
    Ok(placements)
}

/// Takes back every placement in `placements` that is not reachable from `base_state` and
/// what is placed, without counting items still waiting to be placed. Freed locations go
/// back to `locations` and their items to `unplaced`. Returns the placements kept.
pub fn undo_unreachable_placements(
    mw: &mut MultiWorld,
    base_state: &CollectionState,
    placements: Vec<LocationIdx>,
    locations: &mut Vec<LocationIdx>,
    unplaced: &mut Vec<Item>,
) -> Vec<LocationIdx> {
    let mut state = sweep_from_pool(base_state, std::iter::empty::<&Item>(), &mw.graph);
    let mut kept = Vec::with_capacity(placements.len());
    for loc in placements {
        if state.can_reach_location(loc, &mw.graph) {
            kept.push(loc);
            continue;
        }
        let location = &mut mw.graph.locations[loc];
        location.locked = false;
        if let Some(item) = location.item.take() {
            debug!("undoing unreachable placement at {}", location.name);
            unplaced.push(item);
        }
        locations.push(loc);
    }
    kept
}

/// Places items into the given locations ignoring reachability. Locality is still honored;
/// when it blocks the last spots, earlier placements are swapped to make room.
pub fn remaining_fill(
    mw: &mut MultiWorld,
    locations: &mut Vec<LocationIdx>,
    item_pool: &mut Vec<Item>,
    stage: &'static str,
) -> Result<()> {
    let mut unplaced: Vec<Item> = vec![];
    let mut placements: Vec<LocationIdx> = vec![];
    let mut swapped: HashMap<(PlayerId, String), usize> = HashMap::new();

    while !locations.is_empty() {
        let Some(item) = item_pool.pop() else {
            break;
        };
        let mut spot = None;
        if let Some(i) = locations
            .iter()
            .position(|&loc| mw.item_allowed_at(&item, loc))
        {
            spot = Some(locations.remove(i));
        } else {
            for i in 0..placements.len() {
                let loc = placements[i];
                let Some(placed) = &mw.graph.locations[loc].item else {
                    continue;
                };
                let key = (placed.player, placed.name.clone());
                if swapped.get(&key).copied().unwrap_or(0) > 1 || !mw.item_allowed_at(&item, loc) {
                    continue;
                }
                if let Some(displaced) = mw.graph.locations[loc].item.take() {
                    debug!(
                        "[{stage}] swapping {} out of {}",
                        mw.describe_item(&displaced),
                        mw.describe_location(loc)
                    );
                    item_pool.push(displaced);
                }
                *swapped.entry(key).or_insert(0) += 1;
                placements.remove(i);
                spot = Some(loc);
                break;
            }
        }
        let Some(loc) = spot else {
            unplaced.push(item);
            continue;
        };
        place(mw, loc, item, false, stage)?;
        placements.push(loc);
    }

    if !unplaced.is_empty() && !locations.is_empty() {
        return Err(infeasible(mw, stage, &unplaced, locations).into());
    }
    item_pool.extend(unplaced);
    info!(
        "[{stage}] placed {} items, {} unplaced",
        placements.len(),
        item_pool.len()
    );
    Ok(())
}

/// Main fill: progression into priority locations, then progression everywhere, then the
/// rest of the pool without reachability checks. The pool is consumed.
pub fn distribute_items_restrictive(mw: &mut MultiWorld) -> Result<()> {
    let mut fill_locations = mw.graph.unfilled_locations();
    fill_locations.sort_by(|&a, &b| {
        let (la, lb) = (&mw.graph.locations[a], &mw.graph.locations[b]);
        (la.player, &la.name).cmp(&(lb.player, &lb.name))
    });
    fill_locations.shuffle(&mut mw.rng);

    let mut itempool = std::mem::take(&mut mw.itempool);
    itempool.sort();
    itempool.shuffle(&mut mw.rng);

    let mut prog_items = vec![];
    let mut useful_items = vec![];
    let mut filler_items = vec![];
    for item in itempool {
        if item.is_progression() {
            prog_items.push(item);
        } else if item.classification.is_useful() {
            useful_items.push(item);
        } else {
            filler_items.push(item);
        }
    }
    info!(
        "Distributing {} progression, {} useful, {} filler items over {} locations",
        prog_items.len(),
        useful_items.len(),
        filler_items.len(),
        fill_locations.len()
    );

    let (mut priority_locations, mut default_locations): (Vec<LocationIdx>, Vec<LocationIdx>) =
        fill_locations
            .into_iter()
            .partition(|&loc| mw.graph.locations[loc].priority);
    let base_state = mw.state.clone();

    if !priority_locations.is_empty() {
        let opts = FillOptions {
            swap: false,
            allow_partial: true,
            ..FillOptions::new("Priority")
        };
        fill_restrictive(
            mw,
            &base_state,
            &mut priority_locations,
            &mut prog_items,
            &opts,
        )?;
        priority_locations.append(&mut default_locations);
        default_locations = priority_locations;
    }

    if !prog_items.is_empty() {
        let opts = FillOptions::new("Progression");
        fill_restrictive(
            mw,
            &base_state,
            &mut default_locations,
            &mut prog_items,
            &opts,
        )?;
        if !prog_items.is_empty() {
            return Err(infeasible(mw, opts.stage, &prog_items, &default_locations).into());
        }
    }

    let mut rest_items = filler_items;
    rest_items.append(&mut useful_items);
    remaining_fill(mw, &mut default_locations, &mut rest_items, "Remaining")?;
    if !rest_items.is_empty() || !default_locations.is_empty() {
        return Err(infeasible(mw, "Remaining", &rest_items, &default_locations).into());
    }
    Ok(())
}
