use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::options::OptionError;

/// Reserved key inside a game block that selects a preset.
pub const PRESET_KEY: &str = "preset";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: String,
    pub values: BTreeMap<String, Value>,
}

impl Preset {
    pub fn new(name: &str, values: &[(&str, Value)]) -> Self {
        Preset {
            name: name.to_string(),
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

/// Expands the `preset` key, if present, into the preset's values. Keys given explicitly
/// alongside the preset take precedence.
pub fn apply_preset(raw: &mut BTreeMap<String, Value>, presets: &[Preset]) -> Result<(), OptionError> {
    let Some(selected) = raw.remove(PRESET_KEY) else {
        return Ok(());
    };
    let Value::String(preset_name) = &selected else {
        return Err(OptionError::new(PRESET_KEY, "preset must be given by name"));
    };
    let preset = presets
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(preset_name))
        .ok_or_else(|| {
            let known: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
            OptionError::new(
                PRESET_KEY,
                format!("unknown preset '{preset_name}' (known: {})", known.join(", ")),
            )
        })?;
    for (k, v) in &preset.values {
        raw.entry(k.clone()).or_insert_with(|| v.clone());
    }
    Ok(())
}
