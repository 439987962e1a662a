use multiworld_game::{
    EntranceIdx, LocationIdx, PlayerId, RegionIdx, Requirement, WorldGraph, MENU_REGION,
};
use std::collections::BTreeSet;

use crate::CollectionState;

impl CollectionState {
    /// Evaluates a requirement against the cached reachability. Call
    /// `update_reachable_regions` first if items were collected since.
    pub fn satisfies(&self, req: &Requirement, graph: &WorldGraph) -> bool {
        match req {
            Requirement::Free => true,
            Requirement::Never => false,
            Requirement::Item {
                player,
                name,
                count,
            } => self.has_count(name, *player, *count),
            Requirement::ItemValue {
                player,
                items,
                amount,
            } => self.count_value(items, *player) >= *amount,
            Requirement::Region(region) => self.is_region_reachable(*region),
            Requirement::Location(loc) => {
                let location = &graph.locations[*loc];
                self.is_region_reachable(location.region)
                    && self.satisfies(&location.access_rule, graph)
            }
            Requirement::And(reqs) => reqs.iter().all(|r| self.satisfies(r, graph)),
            Requirement::Or(reqs) => reqs.iter().any(|r| self.satisfies(r, graph)),
        }
    }

    /// Updates the cache, then evaluates the requirement.
    pub fn evaluate(&mut self, req: &Requirement, graph: &WorldGraph) -> bool {
        self.update_reachable_regions(graph);
        self.satisfies(req, graph)
    }

    pub fn can_reach_region(&mut self, region: RegionIdx, graph: &WorldGraph) -> bool {
        self.update_reachable_regions(graph);
        self.is_region_reachable(region)
    }

    pub fn can_reach_location(&mut self, loc: LocationIdx, graph: &WorldGraph) -> bool {
        self.update_reachable_regions(graph);
        self.is_location_reachable(loc, graph)
    }

    pub fn can_reach_entrance(&mut self, entrance: EntranceIdx, graph: &WorldGraph) -> bool {
        self.update_reachable_regions(graph);
        let e = &graph.entrances[entrance];
        self.is_region_reachable(e.parent_region) && self.satisfies(&e.access_rule, graph)
    }

    /// All locations reachable right now, in index order.
    pub fn reachable_locations(&mut self, graph: &WorldGraph) -> Vec<LocationIdx> {
        self.update_reachable_regions(graph);
        (0..graph.locations.len())
            .filter(|&i| self.is_location_reachable(i, graph))
            .collect()
    }

    pub fn reachable_regions(&mut self, graph: &WorldGraph) -> Vec<RegionIdx> {
        self.update_reachable_regions(graph);
        (0..graph.regions.len())
            .filter(|&i| self.is_region_reachable(i))
            .collect()
    }

    fn is_region_reachable(&self, region: RegionIdx) -> bool {
        self.reachable_regions.get(region).copied().unwrap_or(false)
    }

    fn is_location_reachable(&self, loc: LocationIdx, graph: &WorldGraph) -> bool {
        let location = &graph.locations[loc];
        self.is_region_reachable(location.region) && self.satisfies(&location.access_rule, graph)
    }

    fn reset_reachability(&mut self, graph: &WorldGraph) {
        self.reachable_regions = vec![false; graph.regions.len()];
        for blocked in self.blocked_connections.iter_mut() {
            blocked.clear();
        }
        for player in 1..=self.num_players() {
            self.stale[player] = true;
            if let Some(menu) = graph.find_region(player, MENU_REGION) {
                self.reachable_regions[menu] = true;
                self.blocked_connections[player].extend(graph.regions[menu].exits.iter().copied());
            }
        }
        self.graph_revision = graph.revision();
        self.needs_reset = false;
    }

    /// Fixed-point search from each participant's Menu region, resuming from the previous
    /// result. Only exits that were blocked last time are re-examined.
    pub fn update_reachable_regions(&mut self, graph: &WorldGraph) {
        if self.needs_reset || self.graph_revision != graph.revision() {
            self.reset_reachability(graph);
        }
        if !self.stale.iter().any(|&s| s) {
            return;
        }
        // A region reached by one participant may satisfy a Region requirement in another's
        // graph, so keep expanding everyone until nothing moves.
        loop {
            let mut any_update = false;
            for player in 1..=self.num_players() {
                if self.expand_player(player, graph) {
                    any_update = true;
                }
            }
            if !any_update {
                break;
            }
        }
        for s in self.stale.iter_mut() {
            *s = false;
        }
    }

    fn expand_player(&mut self, player: PlayerId, graph: &WorldGraph) -> bool {
        let mut any_update = false;
        loop {
            // BTreeSet iteration keeps the expansion order deterministic.
            let passable: Vec<EntranceIdx> = self.blocked_connections[player]
                .iter()
                .copied()
                .filter(|&e| self.satisfies(&graph.entrances[e].access_rule, graph))
                .collect();
            if passable.is_empty() {
                break;
            }
            let mut newly_reached: BTreeSet<RegionIdx> = BTreeSet::new();
            for e in passable {
                let Some(target) = graph.entrances[e].connected_region else {
                    // Dangling exits never lead anywhere.
                    continue;
                };
                self.blocked_connections[player].remove(&e);
                if !self.reachable_regions[target] {
                    self.reachable_regions[target] = true;
                    newly_reached.insert(target);
                }
            }
            if newly_reached.is_empty() {
                break;
            }
            any_update = true;
            for region in newly_reached {
                for &exit in &graph.regions[region].exits {
                    let leads_to_known = graph.entrances[exit]
                        .connected_region
                        .is_some_and(|t| self.reachable_regions[t]);
                    if !leads_to_known {
                        self.blocked_connections[player].insert(exit);
                    }
                }
            }
        }
        any_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiworld_game::{Item, ItemClassification};
    use rand::{Rng, SeedableRng};

    fn prog(name: &str, player: PlayerId) -> Item {
        Item::new(name, ItemClassification::Progression, Some(0), player)
    }

    // Menu -> A (needs Key) -> B (needs Lamp) and Menu -> C (needs Lamp and Key).
    fn small_graph() -> (WorldGraph, Vec<RegionIdx>) {
        let mut graph = WorldGraph::default();
        let menu = graph.create_region(1, "Menu").unwrap();
        let a = graph.create_region(1, "A").unwrap();
        let b = graph.create_region(1, "B").unwrap();
        let c = graph.create_region(1, "C").unwrap();
        graph
            .connect_regions(menu, a, "Menu -> A", Requirement::item(1, "Key"))
            .unwrap();
        graph
            .connect_regions(a, b, "A -> B", Requirement::item(1, "Lamp"))
            .unwrap();
        graph
            .connect_regions(
                menu,
                c,
                "Menu -> C",
                Requirement::all_items(1, &["Lamp", "Key"]),
            )
            .unwrap();
        (graph, vec![menu, a, b, c])
    }

    #[test]
    fn test_fixed_point_from_menu() {
        let (graph, r) = small_graph();
        let mut state = CollectionState::new(1);
        assert_eq!(state.reachable_regions(&graph), vec![r[0]]);
        state.collect(&prog("Key", 1));
        assert_eq!(state.reachable_regions(&graph), vec![r[0], r[1]]);
        let a_to_b = graph.entrance_idx(1, "A -> B").unwrap();
        assert!(!state.can_reach_entrance(a_to_b, &graph));
        state.collect(&prog("Lamp", 1));
        assert_eq!(state.reachable_regions(&graph), r);

        state.remove(&prog("Key", 1));
        assert_eq!(state.reachable_regions(&graph), vec![r[0]]);
    }

    #[test]
    fn test_rule_and_wiring_changes_invalidate_cache() {
        let (mut graph, r) = small_graph();
        let mut state = CollectionState::new(1);
        assert_eq!(state.reachable_regions(&graph), vec![r[0]]);

        let menu_to_a = graph.entrance_idx(1, "Menu -> A").unwrap();
        graph.set_entrance_rule(menu_to_a, Requirement::Free);
        assert_eq!(state.reachable_regions(&graph), vec![r[0], r[1]]);

        // The exit exists before it leads anywhere; wiring it must still be picked up.
        let shortcut = graph.create_exit(r[1], "A -> C").unwrap();
        assert_eq!(state.reachable_regions(&graph), vec![r[0], r[1]]);
        graph.connect(shortcut, r[3]).unwrap();
        assert_eq!(state.reachable_regions(&graph), vec![r[0], r[1], r[3]]);
    }

    #[test]
    fn test_region_requirement_across_participants() {
        let mut graph = WorldGraph::default();
        let menu1 = graph.create_region(1, "Menu").unwrap();
        let vault1 = graph.create_region(1, "Vault").unwrap();
        let menu2 = graph.create_region(2, "Menu").unwrap();
        let tower2 = graph.create_region(2, "Tower").unwrap();
        graph
            .connect_regions(menu1, vault1, "Vault Door", Requirement::Region(tower2))
            .unwrap();
        graph
            .connect_regions(menu2, tower2, "Tower Door", Requirement::item(2, "Ladder"))
            .unwrap();

        let mut state = CollectionState::new(2);
        assert!(!state.can_reach_region(vault1, &graph));
        state.collect(&prog("Ladder", 2));
        assert!(state.can_reach_region(tower2, &graph));
        assert!(state.can_reach_region(vault1, &graph));
    }

    #[test]
    fn test_reachability_monotone_and_matches_fresh_state() {
        let item_names = ["A", "B", "C", "D", "E"];
        for seed in 0..50u64 {
            let mut rng_seed = [0u8; 32];
            rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
            let mut rng = rand::rngs::StdRng::from_seed(rng_seed);

            let mut graph = WorldGraph::default();
            let mut regions = vec![graph.create_region(1, "Menu").unwrap()];
            for i in 0..8 {
                regions.push(graph.create_region(1, &format!("R{i}")).unwrap());
            }
            for i in 0..16 {
                let from = regions[rng.gen_range(0..regions.len())];
                let to = regions[rng.gen_range(0..regions.len())];
                let rule = match rng.gen_range(0..4) {
                    0 => Requirement::Free,
                    1 => Requirement::item(1, item_names[rng.gen_range(0..5)]),
                    2 => Requirement::make_or(vec![
                        Requirement::item(1, item_names[rng.gen_range(0..5)]),
                        Requirement::Region(regions[rng.gen_range(0..regions.len())]),
                    ]),
                    _ => Requirement::item_count(1, item_names[rng.gen_range(0..5)], 2),
                };
                graph
                    .connect_regions(from, to, &format!("E{i}"), rule)
                    .unwrap();
            }

            let mut state = CollectionState::new(1);
            let mut prev = state.reachable_regions(&graph);
            for _ in 0..8 {
                let item = prog(item_names[rng.gen_range(0..5)], 1);
                state.collect(&item);
                let next = state.reachable_regions(&graph);
                assert!(prev.iter().all(|r| next.contains(r)), "seed {seed}");

                let mut fresh = CollectionState::new(1);
                fresh.prog_items = state.prog_items.clone();
                assert_eq!(fresh.reachable_regions(&graph), next, "seed {seed}");
                prev = next;
            }
        }
    }
}
