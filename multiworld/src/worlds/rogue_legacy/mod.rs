mod items;
mod locations;
mod options;

use anyhow::Result;
use log::info;
use multiworld_game::{Item, ItemCode, LocationCode, PlayerId, RegionIdx, Requirement, MENU_REGION};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

use crate::error::GenerationError;
use crate::multiworld::MultiWorld;
use crate::options::{common_option_definitions, OptionDef, ResolvedOptions};
use crate::world::{SlotData, World, WorldType};
use items::{
    defeat_event, random_filler, BLACKSMITH_SLOTS, ENCHANTRESS_SLOTS, FIXED_SKILLS,
    FLIGHT_SOURCES, FOUNTAIN_PIECE, GOLD_PIECE, LEVELED_SKILLS, NEO_BOSSES, OBOLS,
    PROGRESSIVE_CLASSES, STANDARD_BOSSES, TRAPS, VICTORY_ITEM,
};
use locations::{
    diary_name, ChestKind, AREAS, BROTHERS_CHAMBER, CASTLE, CHALLENGES, FOUNTAIN_ROOM, MANOR,
    MAX_BROWN_CHESTS,
};
use options::{NEO_BOSSES_EXCLUDED, NEO_BOSSES_REQUIRED};

pub const GAME: &str = "Rogue Legacy";

const FOUNTAIN_DOOR: &str = "Fountain Door";

pub struct RogueLegacy {
    item_name_to_id: BTreeMap<String, ItemCode>,
    location_name_to_id: BTreeMap<String, LocationCode>,
}

impl RogueLegacy {
    pub fn new() -> Self {
        RogueLegacy {
            item_name_to_id: items::item_name_to_id(),
            location_name_to_id: locations::location_name_to_id(),
        }
    }
}

impl Default for RogueLegacy {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldType for RogueLegacy {
    fn game(&self) -> &'static str {
        GAME
    }

    fn item_name_to_id(&self) -> &BTreeMap<String, ItemCode> {
        &self.item_name_to_id
    }

    fn location_name_to_id(&self) -> &BTreeMap<String, LocationCode> {
        &self.location_name_to_id
    }

    fn option_definitions(&self) -> Vec<OptionDef> {
        options::option_definitions()
    }

    fn create_item(&self, name: &str, player: PlayerId) -> Result<Item> {
        if items::is_boss_event(name) {
            return Ok(Item::event(name, player));
        }
        let code = self.item_code(name)?;
        let classification = items::classification(name)
            .ok_or_else(|| anyhow::anyhow!("{GAME} has no classification for '{name}'"))?;
        Ok(Item::new(name, classification, Some(code), player))
    }

    fn filler_item_name(&self, rng: &mut StdRng) -> Option<String> {
        Some(random_filler(rng).to_string())
    }

    fn create_world(&self, player: PlayerId) -> Box<dyn World> {
        Box::new(RogueLegacyWorld {
            player,
            core_items: vec![],
            chests: [0; 4],
            diaries: 0,
            challenges: false,
            neo_bosses: NEO_BOSSES_EXCLUDED,
            boss_order: vec![],
            num_filler: 0,
        })
    }
}

struct RogueLegacyWorld {
    player: PlayerId,
    // Everything in the pool except generic filler:
    core_items: Vec<&'static str>,
    // Counts per chest kind, in `ChestKind::ALL` order:
    chests: [usize; 4],
    diaries: usize,
    challenges: bool,
    neo_bosses: i64,
    // Bosses in chamber order: the four areas, then the four neo chambers, then the brothers.
    boss_order: Vec<&'static str>,
    num_filler: usize,
}

fn core_items(options: &ResolvedOptions) -> Result<Vec<&'static str>> {
    let mut pool = vec![];
    for class in PROGRESSIVE_CLASSES {
        pool.extend([class, class]);
    }
    pool.push("Dragons");
    pool.push("Traitors");
    for (skill, option) in LEVELED_SKILLS {
        let copies = options.int(option)? as usize / 5;
        pool.extend(std::iter::repeat(skill).take(copies));
    }
    for (skill, copies) in FIXED_SKILLS {
        pool.extend(std::iter::repeat(skill).take(copies));
    }
    // One of each blueprint and rune:
    for (name, _) in items::ITEMS {
        if name.ends_with(" Blueprints") || name.ends_with(" Runes") {
            pool.push(name);
        }
    }
    if options.bool("shuffle_blacksmith")? {
        pool.extend(BLACKSMITH_SLOTS);
    }
    if options.bool("shuffle_enchantress")? {
        pool.extend(ENCHANTRESS_SLOTS);
    }
    if options.bool("level_limit")? {
        pool.extend(std::iter::repeat("Level Cap Increase").take(5));
    }
    if options.int("neo_bosses")? != NEO_BOSSES_EXCLUDED {
        pool.extend(OBOLS);
    }
    if options.bool("fountain_hunt")? {
        let available = options.int("fountain_pieces_available")? as usize;
        pool.extend(std::iter::repeat(FOUNTAIN_PIECE).take(available));
    }
    Ok(pool)
}

impl RogueLegacyWorld {
    fn neo_enabled(&self) -> bool {
        self.neo_bosses != NEO_BOSSES_EXCLUDED
    }

    fn boss_chests(&self) -> usize {
        if self.neo_enabled() {
            AREAS.len() * 2
        } else {
            AREAS.len()
        }
    }

    fn fountain_pieces_needed(&self, mw: &MultiWorld) -> Result<usize> {
        let options = mw.options(self.player);
        if !options.bool("fountain_hunt")? {
            return Ok(0);
        }
        let available = options.int("fountain_pieces_available")? as usize;
        let percent = options.int("fountain_pieces_required")? as usize;
        Ok((available * percent).div_ceil(100).max(1))
    }

    fn defeat(&self, chamber: usize) -> Result<&'static str> {
        let boss = self.boss_order.get(chamber).copied().unwrap_or_default();
        defeat_event(boss)
    }
}

impl World for RogueLegacyWorld {
    fn player(&self) -> PlayerId {
        self.player
    }

    /// Plans the pool and sizes the castle. Brown chests grow when the pool would not fit.
    fn generate_early(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let player = self.player;
        let options = mw.options(player);
        self.core_items = core_items(options)?;
        for (i, kind) in ChestKind::ALL.iter().enumerate() {
            self.chests[i] = options.int(kind.option_name())? as usize;
        }
        self.diaries = options.int("diary_entries")? as usize;
        self.challenges = options.bool("additional_challenges")?;
        self.neo_bosses = options.int("neo_bosses")?;
        let boss_shuffle = options.bool("boss_shuffle")?;

        let challenges = if self.challenges { CHALLENGES.len() } else { 0 };
        let fixed = MANOR.len()
            + challenges
            + self.diaries
            + self.boss_chests()
            + self.chests[1..].iter().sum::<usize>();
        let needed = self.core_items.len();
        if fixed + self.chests[0] < needed {
            self.chests[0] = needed - fixed;
            info!(
                "[Rogue Legacy] {}: raising brown chests to {}",
                mw.player_name(player),
                self.chests[0]
            );
        }
        if self.chests[0] > MAX_BROWN_CHESTS as usize {
            return Err(GenerationError::Configuration {
                player,
                name: mw.player_name(player).to_string(),
                message: format!(
                    "{needed} items do not fit, even with {MAX_BROWN_CHESTS} brown chests"
                ),
            }
            .into());
        }
        self.num_filler = fixed + self.chests[0] - needed;

        let mut boss_order: Vec<&'static str> = STANDARD_BOSSES.to_vec();
        if self.neo_enabled() {
            boss_order.extend(NEO_BOSSES);
        }
        if boss_shuffle {
            boss_order.shuffle(&mut mw.rng);
        }
        self.boss_order = boss_order;
        Ok(())
    }

    fn create_regions(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let player = self.player;
        let menu = mw.graph.create_region(player, MENU_REGION)?;
        for name in MANOR {
            mw.add_location(menu, name)?;
        }
        mw.add_location(menu, &diary_name(1))?;

        let castle = mw.graph.create_region(player, CASTLE)?;
        mw.graph
            .connect_regions(menu, castle, "Charon's Toll", Requirement::Free)?;
        if self.challenges {
            for name in CHALLENGES {
                mw.add_location(castle, name)?;
            }
        }
        let mut areas: Vec<RegionIdx> = vec![castle];
        for area in &AREAS[1..] {
            let region = mw.graph.create_region(player, area.name)?;
            mw.graph.connect_regions(
                castle,
                region,
                &format!("Enter {}", area.name),
                Requirement::Free,
            )?;
            areas.push(region);
        }

        for (kind, &count) in ChestKind::ALL.iter().zip(self.chests.iter()) {
            for i in 0..count {
                mw.add_location(areas[i % areas.len()], &kind.chest_name(i + 1))?;
            }
        }
        for n in 2..self.diaries {
            mw.add_location(areas[(n - 2) % areas.len()], &diary_name(n))?;
        }

        for (i, area) in AREAS.iter().enumerate() {
            let defeat = mw.create_item(player, self.defeat(i)?)?;
            mw.graph.add_event(areas[i], &area.boss_chamber(false), defeat)?;
            mw.add_location(areas[i], &area.boss_chest(false))?;
            if self.neo_enabled() {
                let defeat = mw.create_item(player, self.defeat(AREAS.len() + i)?)?;
                mw.graph.add_event(areas[i], &area.boss_chamber(true), defeat)?;
                mw.add_location(areas[i], &area.boss_chest(true))?;
            }
        }
        if self.neo_enabled() {
            let defeat = mw.create_item(player, self.defeat(2 * AREAS.len())?)?;
            mw.graph.add_event(castle, BROTHERS_CHAMBER, defeat)?;
        }

        let fountain = mw.graph.create_region(player, FOUNTAIN_ROOM)?;
        let door = mw.graph.create_exit(castle, FOUNTAIN_DOOR)?;
        mw.graph.connect(door, fountain)?;
        mw.add_location(fountain, &diary_name(self.diaries))?;
        let victory = mw.create_item(player, VICTORY_ITEM)?;
        mw.graph.add_event(fountain, FOUNTAIN_ROOM, victory)?;
        Ok(())
    }

    /// The planned items, then one lone gold piece, then weighted filler. Each filler slot
    /// after the gold piece becomes a trap with probability `trap_percentage`.
    fn create_items(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let player = self.player;
        for &name in &self.core_items {
            mw.add_pool_item(player, name)?;
        }
        let trap_percentage = mw.options(player).int("trap_percentage")?;
        for i in 0..self.num_filler {
            let name = if i == 0 {
                GOLD_PIECE
            } else if mw.rng.gen_range(0..100) < trap_percentage {
                TRAPS.choose(&mut mw.rng).copied().unwrap_or(GOLD_PIECE)
            } else {
                random_filler(&mut mw.rng)
            };
            mw.add_pool_item(player, name)?;
        }
        Ok(())
    }

    fn set_rules(&mut self, mw: &mut MultiWorld) -> Result<()> {
        let player = self.player;
        let fairy = ChestKind::Fairy;
        let fairy_count = self.chests[3];
        for n in 1..=fairy_count {
            let loc = mw.graph.location_idx(player, &fairy.chest_name(n))?;
            mw.graph
                .set_location_rule(loc, Requirement::any_item(player, &FLIGHT_SOURCES));
        }

        for (i, area) in AREAS.iter().enumerate() {
            let chest = mw.graph.location_idx(player, &area.boss_chest(false))?;
            mw.graph
                .set_location_rule(chest, Requirement::item(player, self.defeat(i)?));
            if self.neo_enabled() {
                let chamber = mw.graph.location_idx(player, &area.boss_chamber(true))?;
                mw.graph
                    .set_location_rule(chamber, Requirement::item(player, area.obol));
                let chest = mw.graph.location_idx(player, &area.boss_chest(true))?;
                mw.graph.set_location_rule(
                    chest,
                    Requirement::item(player, self.defeat(AREAS.len() + i)?),
                );
            }
        }
        if self.neo_enabled() {
            let chamber = mw.graph.location_idx(player, BROTHERS_CHAMBER)?;
            mw.graph
                .set_location_rule(chamber, Requirement::item(player, "Traitor's Obol"));
        }

        let mut door_reqs = vec![];
        for boss in STANDARD_BOSSES {
            door_reqs.push(Requirement::item(player, defeat_event(boss)?));
        }
        if self.neo_bosses == NEO_BOSSES_REQUIRED {
            for boss in NEO_BOSSES {
                door_reqs.push(Requirement::item(player, defeat_event(boss)?));
            }
        }
        door_reqs.push(Requirement::item_count(
            player,
            FOUNTAIN_PIECE,
            self.fountain_pieces_needed(mw)?,
        ));
        let door = mw.graph.entrance_idx(player, FOUNTAIN_DOOR)?;
        mw.graph
            .set_entrance_rule(door, Requirement::make_and(door_reqs));

        mw.set_completion_condition(player, Requirement::item(player, VICTORY_ITEM));
        Ok(())
    }

    fn fill_slot_data(&self, mw: &MultiWorld) -> Result<SlotData> {
        let common: Vec<String> = common_option_definitions()
            .into_iter()
            .map(|def| def.name)
            .collect();
        let mut slot_data = SlotData::new();
        for (name, value) in mw.options(self.player).iter() {
            if !common.contains(name) {
                slot_data.insert(name.clone(), serde_json::to_value(value)?);
            }
        }
        slot_data.insert(
            "boss_order".to_string(),
            serde_json::to_value(&self.boss_order)?,
        );
        slot_data.insert(
            "chests_brown".to_string(),
            serde_json::to_value(self.chests[0])?,
        );
        Ok(slot_data)
    }
}
