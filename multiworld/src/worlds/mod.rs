pub mod infinity_gauntlet;
pub mod password;
pub mod pharcryption;
pub mod rogue_legacy;
pub mod santa;

use anyhow::Result;
use std::sync::Arc;

use crate::world::WorldRegistry;

/// Registry holding every bundled world type.
pub fn default_registry() -> Result<WorldRegistry> {
    let mut registry = WorldRegistry::default();
    registry.register(Arc::new(infinity_gauntlet::InfinityGauntlet::new()))?;
    registry.register(Arc::new(password::PasswordGame::new()))?;
    registry.register(Arc::new(pharcryption::Pharcryption::new()))?;
    registry.register(Arc::new(rogue_legacy::RogueLegacy::new()))?;
    registry.register(Arc::new(santa::Santa::new()))?;
    Ok(registry)
}
