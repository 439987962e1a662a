pub mod graph;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use strum_macros::{Display, EnumString, VariantNames};

pub use graph::{Entrance, Location, Region, WorldGraph};

pub type PlayerId = usize; // Slot number, starting at 1
pub type RegionIdx = usize; // Index into WorldGraph.regions
pub type LocationIdx = usize; // Index into WorldGraph.locations
pub type EntranceIdx = usize; // Index into WorldGraph.entrances
pub type ItemCode = i64;
pub type LocationCode = i64;

/// Name of the region every participant's traversal starts from.
pub const MENU_REGION: &str = "Menu";

#[derive(Default, Clone, Debug)]
pub struct IndexedVec<T: Hash + Eq> {
    pub keys: Vec<T>,
    pub index_by_key: HashMap<T, usize>,
}

impl<T: Hash + Eq> IndexedVec<T> {
    pub fn add<U: ToOwned<Owned = T> + ?Sized>(&mut self, name: &U) -> usize {
        if !self.index_by_key.contains_key(&name.to_owned()) {
            let idx = self.keys.len();
            self.index_by_key.insert(name.to_owned(), self.keys.len());
            self.keys.push(name.to_owned());
            idx
        } else {
            self.index_by_key[&name.to_owned()]
        }
    }

    pub fn get(&self, key: &T) -> Option<usize> {
        self.index_by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Hands out consecutive ids from a fixed base, so that data tables built in a fixed
/// order always get the same ids.
#[derive(Clone, Debug)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    pub fn new(base: i64) -> Self {
        Self { next: base }
    }

    pub fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemClassification {
    Filler,
    Progression,
    // Progression that is never moved earlier by progression balancing:
    ProgressionSkipBalancing,
    Useful,
    Trap,
}

impl ItemClassification {
    pub fn is_progression(self) -> bool {
        matches!(
            self,
            ItemClassification::Progression | ItemClassification::ProgressionSkipBalancing
        )
    }

    pub fn is_useful(self) -> bool {
        self == ItemClassification::Useful
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Item {
    pub player: PlayerId,
    pub name: String,
    pub code: Option<ItemCode>,
    pub classification: ItemClassification,
}

impl Item {
    pub fn new(
        name: &str,
        classification: ItemClassification,
        code: Option<ItemCode>,
        player: PlayerId,
    ) -> Self {
        Item {
            player,
            name: name.to_string(),
            code,
            classification,
        }
    }

    /// A logical-only item, with no id, that is locked onto an event location.
    pub fn event(name: &str, player: PlayerId) -> Self {
        Item::new(name, ItemClassification::Progression, None, player)
    }

    pub fn is_event(&self) -> bool {
        self.code.is_none()
    }

    pub fn is_progression(&self) -> bool {
        self.classification.is_progression()
    }
}

/// Predicate gating a location or entrance. Parameters are captured by value, so a
/// requirement built inside a loop keeps the values of that iteration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    Free,
    Never,
    Item {
        player: PlayerId,
        name: String,
        count: usize,
    },
    // Weighted sum of item counts, for currencies that come in several denominations.
    ItemValue {
        player: PlayerId,
        items: Vec<(String, usize)>,
        amount: usize,
    },
    Region(RegionIdx),
    Location(LocationIdx),
    And(Vec<Requirement>),
    Or(Vec<Requirement>),
}

impl Requirement {
    pub fn item(player: PlayerId, name: &str) -> Requirement {
        Requirement::item_count(player, name, 1)
    }

    pub fn item_count(player: PlayerId, name: &str, count: usize) -> Requirement {
        if count == 0 {
            return Requirement::Free;
        }
        Requirement::Item {
            player,
            name: name.to_string(),
            count,
        }
    }

    pub fn all_items<S: AsRef<str>>(player: PlayerId, names: &[S]) -> Requirement {
        Requirement::make_and(
            names
                .iter()
                .map(|n| Requirement::item(player, n.as_ref()))
                .collect(),
        )
    }

    pub fn any_item<S: AsRef<str>>(player: PlayerId, names: &[S]) -> Requirement {
        Requirement::make_or(
            names
                .iter()
                .map(|n| Requirement::item(player, n.as_ref()))
                .collect(),
        )
    }

    pub fn make_and(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                return Requirement::Never;
            } else if let Requirement::Free = req {
                continue;
            } else if let Requirement::And(and_reqs) = req {
                out_reqs.extend(and_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        match out_reqs.len() {
            0 => Requirement::Free,
            1 => out_reqs.swap_remove(0),
            _ => Requirement::And(out_reqs),
        }
    }

    pub fn make_or(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                continue;
            } else if let Requirement::Free = req {
                return Requirement::Free;
            } else if let Requirement::Or(or_reqs) = req {
                out_reqs.extend(or_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        match out_reqs.len() {
            0 => Requirement::Never,
            1 => out_reqs.swap_remove(0),
            _ => Requirement::Or(out_reqs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_and_flattens() {
        let a = Requirement::item(1, "A");
        let b = Requirement::item(1, "B");
        let c = Requirement::item(1, "C");
        let req = Requirement::make_and(vec![
            Requirement::Free,
            Requirement::make_and(vec![a.clone(), b.clone()]),
            c.clone(),
        ]);
        assert_eq!(req, Requirement::And(vec![a.clone(), b, c]));
        assert_eq!(
            Requirement::make_and(vec![a.clone(), Requirement::Never]),
            Requirement::Never
        );
        assert_eq!(Requirement::make_and(vec![a.clone()]), a);
        assert_eq!(Requirement::make_and(vec![]), Requirement::Free);
    }

    #[test]
    fn test_make_or_short_circuits() {
        let a = Requirement::item(2, "A");
        assert_eq!(
            Requirement::make_or(vec![a.clone(), Requirement::Free]),
            Requirement::Free
        );
        assert_eq!(
            Requirement::make_or(vec![Requirement::Never, a.clone()]),
            a
        );
        assert_eq!(Requirement::make_or(vec![]), Requirement::Never);
    }

    #[test]
    fn test_requirements_capture_loop_values() {
        let names = ["Space Stone", "Time Stone", "Mind Stone"];
        let mut reqs = vec![];
        for name in names {
            reqs.push(Requirement::item(1, name));
        }
        for (req, name) in reqs.iter().zip(names) {
            assert_eq!(req, &Requirement::item(1, name));
        }
    }

    #[test]
    fn test_id_allocator() {
        let mut ids = IdAllocator::new(90_000);
        assert_eq!(ids.allocate(), 90_000);
        assert_eq!(ids.allocate(), 90_001);
    }

    #[test]
    fn test_classification_names() {
        use std::str::FromStr;
        assert_eq!(
            ItemClassification::from_str("progression_skip_balancing").ok(),
            Some(ItemClassification::ProgressionSkipBalancing)
        );
        assert!(ItemClassification::ProgressionSkipBalancing.is_progression());
        assert!(!ItemClassification::Useful.is_progression());
        assert_eq!(ItemClassification::Trap.to_string(), "trap");
    }
}
