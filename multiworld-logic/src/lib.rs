pub mod reachability;

use hashbrown::{HashMap, HashSet};
use multiworld_game::{Item, LocationIdx, PlayerId};
use std::collections::BTreeSet;

/// Items held so far by every participant, plus reachability derived from them.
///
/// Only progression items are tracked, since nothing else can gate a location or entrance.
/// The reachability cache is extended incrementally as items are collected, and rebuilt
/// from scratch when an item is removed or the graph has changed since the last search.
#[derive(Clone, Debug)]
pub struct CollectionState {
    // Indexed by PlayerId; index 0 is unused since slots start at 1.
    pub prog_items: Vec<HashMap<String, usize>>,
    // Placed items already picked up by a sweep:
    pub collected_locations: HashSet<LocationIdx>,
    reachable_regions: Vec<bool>,
    // Per participant, exits of reachable regions that could not be passed yet:
    blocked_connections: Vec<BTreeSet<usize>>,
    stale: Vec<bool>,
    needs_reset: bool,
    // WorldGraph::revision() the cache was built against:
    graph_revision: u64,
}

impl CollectionState {
    pub fn new(num_players: usize) -> Self {
        CollectionState {
            prog_items: vec![HashMap::new(); num_players + 1],
            collected_locations: HashSet::new(),
            reachable_regions: vec![],
            blocked_connections: vec![BTreeSet::new(); num_players + 1],
            stale: vec![true; num_players + 1],
            needs_reset: true,
            graph_revision: 0,
        }
    }

    pub fn num_players(&self) -> usize {
        self.prog_items.len() - 1
    }

    /// Adds the item if it is progression. Returns whether the state changed.
    pub fn collect(&mut self, item: &Item) -> bool {
        if !item.is_progression() {
            return false;
        }
        *self.prog_items[item.player]
            .entry(item.name.clone())
            .or_insert(0) += 1;
        self.stale[item.player] = true;
        true
    }

    pub fn remove(&mut self, item: &Item) -> bool {
        if !item.is_progression() {
            return false;
        }
        let items = &mut self.prog_items[item.player];
        match items.get_mut(item.name.as_str()) {
            Some(cnt) if *cnt > 0 => {
                *cnt -= 1;
                if *cnt == 0 {
                    items.remove(item.name.as_str());
                }
                // Losing an item can shrink reachability, which the incremental cache cannot express.
                self.needs_reset = true;
                true
            }
            _ => false,
        }
    }

    pub fn count(&self, name: &str, player: PlayerId) -> usize {
        self.prog_items
            .get(player)
            .and_then(|items| items.get(name))
            .copied()
            .unwrap_or(0)
    }

    pub fn has(&self, name: &str, player: PlayerId) -> bool {
        self.count(name, player) > 0
    }

    pub fn has_count(&self, name: &str, player: PlayerId, count: usize) -> bool {
        self.count(name, player) >= count
    }

    pub fn has_all<S: AsRef<str>>(&self, names: &[S], player: PlayerId) -> bool {
        names.iter().all(|n| self.has(n.as_ref(), player))
    }

    pub fn has_any<S: AsRef<str>>(&self, names: &[S], player: PlayerId) -> bool {
        names.iter().any(|n| self.has(n.as_ref(), player))
    }

    /// Sum of item counts weighted per name.
    pub fn count_value(&self, items: &[(String, usize)], player: PlayerId) -> usize {
        items
            .iter()
            .map(|(name, weight)| self.count(name, player) * weight)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiworld_game::ItemClassification;

    #[test]
    fn test_collect_only_tracks_progression() {
        let mut state = CollectionState::new(2);
        let stone = Item::new("Space Stone", ItemClassification::ProgressionSkipBalancing, Some(1), 1);
        let junk = Item::new("Nothing", ItemClassification::Filler, Some(2), 1);
        assert!(state.collect(&stone));
        assert!(state.collect(&stone));
        assert!(!state.collect(&junk));
        assert_eq!(state.count("Space Stone", 1), 2);
        assert_eq!(state.count("Space Stone", 2), 0);
        assert!(!state.has("Nothing", 1));

        assert!(state.remove(&stone));
        assert!(state.remove(&stone));
        assert!(!state.remove(&stone));
        assert!(!state.has("Space Stone", 1));
    }

    #[test]
    fn test_count_value() {
        let mut state = CollectionState::new(1);
        for name in ["1 Pharcoin", "1 Pharcoin", "3 Pharcoins"] {
            state.collect(&Item::new(name, ItemClassification::Progression, Some(0), 1));
        }
        let weights = vec![
            ("1 Pharcoin".to_string(), 1),
            ("2 Pharcoins".to_string(), 2),
            ("3 Pharcoins".to_string(), 3),
        ];
        assert_eq!(state.count_value(&weights, 1), 5);
        assert!(state.has_all(&["1 Pharcoin", "3 Pharcoins"], 1));
        assert!(!state.has_all(&["1 Pharcoin", "2 Pharcoins"], 1));
        assert!(state.has_any(&["2 Pharcoins", "3 Pharcoins"], 1));
    }
}
