use multiworld_game::{Item, LocationIdx, PlayerId, WorldGraph};
use multiworld_logic::CollectionState;

use crate::multiworld::MultiWorld;

/// Collects every placed progression item that is reachable now but not yet collected,
/// and returns where they were. One call is one sphere.
pub fn collect_sphere(state: &mut CollectionState, graph: &WorldGraph) -> Vec<LocationIdx> {
    let sphere: Vec<LocationIdx> = state
        .reachable_locations(graph)
        .into_iter()
        .filter(|loc| !state.collected_locations.contains(loc))
        .filter(|&loc| {
            graph.locations[loc]
                .item
                .as_ref()
                .is_some_and(|item| item.is_progression())
        })
        .collect();
    for &loc in &sphere {
        if let Some(item) = &graph.locations[loc].item {
            state.collect(item);
        }
        state.collected_locations.insert(loc);
    }
    sphere
}

/// Collects reachable placed progression until nothing new is reachable.
pub fn sweep_for_advancements(state: &mut CollectionState, graph: &WorldGraph) {
    while !collect_sphere(state, graph).is_empty() {}
}

/// State holding `base` plus every item in `items`, swept over the placed items.
pub fn sweep_from_pool<'a>(
    base: &CollectionState,
    items: impl IntoIterator<Item = &'a Item>,
    graph: &WorldGraph,
) -> CollectionState {
    let mut state = base.clone();
    for item in items {
        state.collect(item);
    }
    sweep_for_advancements(&mut state, graph);
    state
}

/// State with every item of the multiworld, placed or still in the pool.
pub fn get_all_state(mw: &MultiWorld) -> CollectionState {
    sweep_from_pool(&mw.state, mw.itempool.iter(), &mw.graph)
}

pub fn has_beaten(state: &mut CollectionState, mw: &MultiWorld, player: PlayerId) -> bool {
    state.evaluate(&mw.completion_conditions[player], &mw.graph)
}

pub fn has_beaten_game(state: &mut CollectionState, mw: &MultiWorld) -> bool {
    mw.player_ids().all(|p| has_beaten(state, mw, p))
}

/// Whether the multiworld is completable with the items placed so far.
pub fn can_beat_game(mw: &MultiWorld) -> bool {
    let mut state = mw.state.clone();
    sweep_for_advancements(&mut state, &mw.graph);
    has_beaten_game(&mut state, mw)
}

/// Participants whose completion condition fails against the fully swept placement.
pub fn unbeaten_players(mw: &MultiWorld) -> Vec<PlayerId> {
    let mut state = mw.state.clone();
    sweep_for_advancements(&mut state, &mw.graph);
    mw.player_ids()
        .filter(|&p| !has_beaten(&mut state, mw, p))
        .collect()
}

/// Progression placements grouped by the sphere in which they become reachable.
pub fn playthrough_spheres(mw: &MultiWorld) -> Vec<Vec<LocationIdx>> {
    let mut state = mw.state.clone();
    let mut spheres = vec![];
    loop {
        let sphere = collect_sphere(&mut state, &mw.graph);
        if sphere.is_empty() {
            break;
        }
        spheres.push(sphere);
    }
    spheres
}
