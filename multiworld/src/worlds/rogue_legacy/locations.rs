use multiworld_game::{IdAllocator, LocationCode};
use std::collections::BTreeMap;

const LOCATION_ID_BASE: i64 = 91_000;

pub const MIN_BROWN_CHESTS: i64 = 100;
pub const MAX_BROWN_CHESTS: i64 = 300;
pub const MIN_SILVER_CHESTS: i64 = 25;
pub const MAX_SILVER_CHESTS: i64 = 75;
pub const MIN_GOLD_CHESTS: i64 = 10;
pub const MAX_GOLD_CHESTS: i64 = 50;
pub const MIN_FAIRY_CHESTS: i64 = 0;
pub const MAX_FAIRY_CHESTS: i64 = 25;
pub const MIN_DIARIES: i64 = 2;
pub const MAX_DIARIES: i64 = 75;

pub const MANOR: [&str; 31] = [
    "Manor - Ground Road",
    "Manor - Main Building",
    "Manor - Main Bottom Window",
    "Manor - Main Top Window",
    "Manor - Main Rooftop",
    "Manor - Outdoors Left Tree 1",
    "Manor - Outdoors Left Tree 2",
    "Manor - Outdoors Right Tree",
    "Manor - Left Wing Building",
    "Manor - Left Wing Window",
    "Manor - Left Wing Rooftop",
    "Manor - Rear Left Wing First Floor",
    "Manor - Rear Left Wing Second Floor",
    "Manor - Rear Left Wing Third Floor",
    "Manor - Rear Left Wing Windows",
    "Manor - Rear Left Wing Rooftop",
    "Manor - Far Left Wing Building",
    "Manor - Far Left Wing Rooftop",
    "Manor - Far Left Wing Extension",
    "Manor - Right Wing Building",
    "Manor - Right Wing Window",
    "Manor - Right Wing Rooftop",
    "Manor - Right Wing Extension",
    "Manor - Far Right Wing First Floor",
    "Manor - Far Right Wing Second Floor",
    "Manor - Far Right Wing Rooftop",
    "Manor - Right Tower Base Level",
    "Manor - Right Tower Middle Level",
    "Manor - Right Tower Top Level",
    "Manor - Observatory Building",
    "Manor - Observatory Telescope",
];

// One-off challenges, all found inside the castle:
pub const CHALLENGES: [&str; 6] = [
    "Melophobia",
    "Coulrophobia",
    "Zoophobia",
    "Artphobia",
    "Theophobia",
    "Eutychemaphobia",
];

pub const CASTLE: &str = "Castle Hamson";
pub const FOUNTAIN_ROOM: &str = "The Fountain Room";
pub const BROTHERS_CHAMBER: &str = "The Brothers Boss Chamber";

pub struct Area {
    pub name: &'static str,
    // Obol that opens this area's neo boss chamber:
    pub obol: &'static str,
}

// The castle comes first; the others branch off it.
pub const AREAS: [Area; 4] = [
    Area {
        name: CASTLE,
        obol: "Khidr's Obol",
    },
    Area {
        name: "Forest Abkhazia",
        obol: "Alexander's Obol",
    },
    Area {
        name: "The Maya",
        obol: "Ponce de Leon's Obol",
    },
    Area {
        name: "The Land of Darkness",
        obol: "Herodotus' Obol",
    },
];

impl Area {
    pub fn boss_chamber(&self, neo: bool) -> String {
        if neo {
            format!("{} Neo Boss Chamber", self.name)
        } else {
            format!("{} Boss Chamber", self.name)
        }
    }

    pub fn boss_chest(&self, neo: bool) -> String {
        if neo {
            format!("{} Neo Boss Chest", self.name)
        } else {
            format!("{} Boss Chest", self.name)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChestKind {
    Brown,
    Silver,
    Gold,
    Fairy,
}

impl ChestKind {
    pub const ALL: [ChestKind; 4] = [
        ChestKind::Brown,
        ChestKind::Silver,
        ChestKind::Gold,
        ChestKind::Fairy,
    ];

    pub fn max(self) -> i64 {
        match self {
            ChestKind::Brown => MAX_BROWN_CHESTS,
            ChestKind::Silver => MAX_SILVER_CHESTS,
            ChestKind::Gold => MAX_GOLD_CHESTS,
            ChestKind::Fairy => MAX_FAIRY_CHESTS,
        }
    }

    pub fn option_name(self) -> &'static str {
        match self {
            ChestKind::Brown => "chests_brown",
            ChestKind::Silver => "chests_silver",
            ChestKind::Gold => "chests_gold",
            ChestKind::Fairy => "chests_fairy",
        }
    }

    /// Name of the `n`th chest of this kind, counting from 1.
    pub fn chest_name(self, n: usize) -> String {
        let prefix = match self {
            ChestKind::Brown => "Brown",
            ChestKind::Silver => "Silver",
            ChestKind::Gold => "Gold",
            ChestKind::Fairy => "Fairy",
        };
        format!("{prefix} Chest {}", int_to_roman(n))
    }
}

pub fn diary_name(n: usize) -> String {
    format!("Diary Entry #{n}")
}

const ROMAN_NUMERALS: [(usize, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

pub fn int_to_roman(mut num: usize) -> String {
    let mut output = String::new();
    for (value, numeral) in ROMAN_NUMERALS {
        while num >= value {
            output.push_str(numeral);
            num -= value;
        }
    }
    output
}

/// Every location the game knows, at its maximum counts. Ids follow this order.
pub fn location_name_to_id() -> BTreeMap<String, LocationCode> {
    let mut names: Vec<String> = MANOR.iter().map(|s| s.to_string()).collect();
    names.extend(CHALLENGES.iter().map(|s| s.to_string()));
    names.extend((1..=MAX_DIARIES as usize).map(diary_name));
    for kind in ChestKind::ALL {
        names.extend((1..=kind.max() as usize).map(|n| kind.chest_name(n)));
    }
    for area in &AREAS {
        names.push(area.boss_chest(false));
        names.push(area.boss_chest(true));
    }

    let mut ids = IdAllocator::new(LOCATION_ID_BASE);
    names
        .into_iter()
        .map(|name| (name, ids.allocate()))
        .collect()
}
