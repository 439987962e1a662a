use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::options::{encode_options, OptionDef, ResolvedOptions};

pub const MAX_NAME_LENGTH: usize = 16;

/// One participant's entry from a player options file.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSettings {
    pub name: String,
    pub game: String,
    pub description: Option<String>,
    // Raw values of the block keyed by the game name, not yet validated:
    pub options: BTreeMap<String, Value>,
}

impl PlayerSettings {
    pub fn new(name: &str, game: &str) -> Self {
        PlayerSettings {
            name: name.to_string(),
            game: game.to_string(),
            description: None,
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

fn get_string(doc: &Mapping, key: &str) -> Result<Option<String>> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => bail!("'{key}' must be a string, got {other:?}"),
    }
}

fn parse_document(doc: Value) -> Result<PlayerSettings> {
    let Value::Mapping(doc) = doc else {
        bail!("player options must be a mapping");
    };
    let name = get_string(&doc, "name")?.context("missing 'name'")?;
    let game = get_string(&doc, "game")?.context("missing 'game'")?;
    let description = get_string(&doc, "description")?;
    let options = match doc.get(game.as_str()) {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Mapping(block)) => {
            let mut options = BTreeMap::new();
            for (k, v) in block {
                let Value::String(key) = k else {
                    bail!("option names in the '{game}' block must be strings, got {k:?}");
                };
                options.insert(key.clone(), v.clone());
            }
            options
        }
        Some(other) => bail!("the '{game}' block must be a mapping, got {other:?}"),
    };
    Ok(PlayerSettings {
        name,
        game,
        description,
        options,
    })
}

/// Parses every YAML document in `text`; empty documents are skipped.
pub fn parse_player_settings(text: &str) -> Result<Vec<PlayerSettings>> {
    let mut out = vec![];
    for (i, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = Value::deserialize(document)
            .with_context(|| format!("malformed YAML in document {}", i + 1))?;
        if value.is_null() {
            continue;
        }
        out.push(parse_document(value).with_context(|| format!("in document {}", i + 1))?);
    }
    Ok(out)
}

pub fn load_player_file(path: &Path) -> Result<Vec<PlayerSettings>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    parse_player_settings(&text).with_context(|| format!("unable to parse {}", path.display()))
}

/// Loads the given files, and every `.yaml`/`.yml` file of the given directories in name order.
pub fn load_players(paths: &[PathBuf]) -> Result<Vec<PlayerSettings>> {
    let mut out = vec![];
    for path in paths {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("unable to list {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
                })
                .collect();
            files.sort();
            for file in files {
                out.extend(load_player_file(&file)?);
            }
        } else {
            out.extend(load_player_file(path)?);
        }
    }
    Ok(out)
}

/// Returns one message per problem with a participant name.
pub fn validate_player_name(name: &str) -> Vec<String> {
    let mut problems = vec![];
    let len = name.chars().count();
    if len == 0 {
        problems.push("name must not be empty".to_string());
    }
    if len > MAX_NAME_LENGTH {
        problems.push(format!(
            "name '{name}' is {len} characters long, the limit is {MAX_NAME_LENGTH}"
        ));
    }
    let invalid: Vec<String> = name
        .chars()
        .filter(|c| c.is_control())
        .map(|c| format!("{c:?}"))
        .collect();
    if !invalid.is_empty() {
        problems.push(format!(
            "name contains invalid characters: {}",
            invalid.join(", ")
        ));
    }
    if name.trim() != name {
        problems.push(format!("name '{name}' has leading or trailing whitespace"));
    }
    problems
}

/// Writes resolved options back out in the player options file shape.
pub fn export_player_yaml(
    settings: &PlayerSettings,
    defs: &[OptionDef],
    options: &ResolvedOptions,
) -> Result<String> {
    let mut doc = Mapping::new();
    doc.insert(Value::from("name"), Value::from(settings.name.as_str()));
    doc.insert(Value::from("game"), Value::from(settings.game.as_str()));
    if let Some(description) = &settings.description {
        doc.insert(Value::from("description"), Value::from(description.as_str()));
    }
    doc.insert(
        Value::from(settings.game.as_str()),
        Value::Mapping(encode_options(defs, options)?),
    );
    Ok(serde_yaml::to_string(&Value::Mapping(doc))?)
}
