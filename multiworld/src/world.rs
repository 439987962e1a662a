use anyhow::{bail, Context, Result};
use multiworld_game::{Item, ItemCode, LocationCode, PlayerId};
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::multiworld::MultiWorld;
use crate::options::{common_option_definitions, NameTables, OptionDef};
use crate::preset::Preset;

/// Per-participant payload handed to the game client after generation.
pub type SlotData = serde_json::Map<String, serde_json::Value>;

/// Class-level half of a world plugin: static tables, option declarations, and the hooks
/// that run once per game type rather than once per participant.
pub trait WorldType: Send + Sync {
    fn game(&self) -> &'static str;

    fn item_name_to_id(&self) -> &BTreeMap<String, ItemCode>;

    fn location_name_to_id(&self) -> &BTreeMap<String, LocationCode>;

    fn option_definitions(&self) -> Vec<OptionDef> {
        vec![]
    }

    fn presets(&self) -> Vec<Preset> {
        vec![]
    }

    fn create_item(&self, name: &str, player: PlayerId) -> Result<Item>;

    /// Name of a generic filler item, or None if this game cannot supply filler.
    fn filler_item_name(&self, _rng: &mut StdRng) -> Option<String> {
        None
    }

    /// Runs once with every participant known and before any per-participant stage.
    fn assert_generate(&self, _mw: &MultiWorld) -> Result<()> {
        Ok(())
    }

    /// Runs once after all rules are set and before the main fill.
    fn pre_fill(&self, _mw: &mut MultiWorld) -> Result<()> {
        Ok(())
    }

    fn create_world(&self, player: PlayerId) -> Box<dyn World>;

    fn all_option_definitions(&self) -> Vec<OptionDef> {
        let mut defs = common_option_definitions();
        defs.extend(self.option_definitions());
        defs
    }

    fn name_tables(&self) -> NameTables {
        NameTables {
            items: self.item_name_to_id().keys().cloned().collect(),
            locations: self.location_name_to_id().keys().cloned().collect(),
        }
    }

    fn item_code(&self, name: &str) -> Result<ItemCode> {
        self.item_name_to_id()
            .get(name)
            .copied()
            .with_context(|| format!("{} has no item named '{name}'", self.game()))
    }

    fn location_code(&self, name: &str) -> Result<LocationCode> {
        self.location_name_to_id()
            .get(name)
            .copied()
            .with_context(|| format!("{} has no location named '{name}'", self.game()))
    }
}

/// Per-participant half of a world plugin. The orchestrator calls each stage for every
/// participant in slot order before moving to the next stage.
pub trait World {
    fn player(&self) -> PlayerId;

    /// May only touch this participant's options. An error aborts the whole generation.
    fn generate_early(&mut self, _mw: &mut MultiWorld) -> Result<()> {
        Ok(())
    }

    /// Must build a graph rooted at a region named "Menu".
    fn create_regions(&mut self, mw: &mut MultiWorld) -> Result<()>;

    fn create_items(&mut self, mw: &mut MultiWorld) -> Result<()>;

    /// Attaches rules to this participant's locations and entrances and sets its
    /// completion condition.
    fn set_rules(&mut self, mw: &mut MultiWorld) -> Result<()>;

    fn generate_basic(&mut self, _mw: &mut MultiWorld) -> Result<()> {
        Ok(())
    }

    fn fill_slot_data(&self, _mw: &MultiWorld) -> Result<SlotData> {
        Ok(SlotData::new())
    }
}

#[derive(Default, Clone)]
pub struct WorldRegistry {
    types: BTreeMap<String, Arc<dyn WorldType>>,
}

impl WorldRegistry {
    pub fn register(&mut self, world_type: Arc<dyn WorldType>) -> Result<()> {
        let game = world_type.game();
        if self.types.contains_key(game) {
            bail!("world type '{game}' registered twice");
        }
        let defs = world_type.all_option_definitions();
        for (i, def) in defs.iter().enumerate() {
            def.validate_definition()
                .with_context(|| format!("invalid option declared by {game}"))?;
            if defs[..i].iter().any(|d| d.name == def.name) {
                bail!("{game} declares option '{}' twice", def.name);
            }
        }
        self.types.insert(game.to_string(), world_type);
        Ok(())
    }

    pub fn get(&self, game: &str) -> Option<Arc<dyn WorldType>> {
        self.types.get(game).cloned()
    }

    pub fn games(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_str())
    }
}
