use anyhow::{bail, ensure, Context, Result};
use serde::Serialize;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub const LOCAL_ITEMS: &str = "local_items";
pub const NON_LOCAL_ITEMS: &str = "non_local_items";
pub const START_INVENTORY: &str = "start_inventory";
pub const PRIORITY_LOCATIONS: &str = "priority_locations";

/// One violation found while reading an option value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{option}: {message}")]
pub struct OptionError {
    pub option: String,
    pub message: String,
}

impl OptionError {
    pub fn new(option: &str, message: impl Into<String>) -> Self {
        OptionError {
            option: option.to_string(),
            message: message.into(),
        }
    }
}

// Returns one message per offending entry.
pub type KeyVerifier = fn(&BTreeSet<String>) -> Vec<String>;

#[derive(Clone, Debug)]
pub enum KeyUniverse {
    Static(Vec<String>),
    ItemNames,
    LocationNames,
    Any,
}

/// Item and location names of one world type, used to check dynamic key universes.
#[derive(Clone, Debug, Default)]
pub struct NameTables {
    pub items: BTreeSet<String>,
    pub locations: BTreeSet<String>,
}

impl NameTables {
    fn contains(&self, universe: &KeyUniverse, key: &str) -> bool {
        match universe {
            KeyUniverse::Static(keys) => keys.iter().any(|k| k == key),
            KeyUniverse::ItemNames => self.items.contains(key),
            KeyUniverse::LocationNames => self.locations.contains(key),
            KeyUniverse::Any => true,
        }
    }
}

#[derive(Clone, Debug)]
pub enum OptionKind {
    Toggle {
        default: bool,
    },
    Range {
        start: i64,
        end: i64,
        default: i64,
    },
    NamedRange {
        start: i64,
        end: i64,
        default: i64,
        special: Vec<(String, i64)>,
    },
    Choice {
        options: Vec<(String, i64)>,
        aliases: Vec<(String, i64)>,
        default: i64,
    },
    OptionSet {
        default: BTreeSet<String>,
        universe: KeyUniverse,
        verify: Option<KeyVerifier>,
    },
    Counter {
        universe: KeyUniverse,
    },
}

#[derive(Clone, Debug)]
pub struct OptionDef {
    pub name: String,
    pub kind: OptionKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Set(BTreeSet<String>),
    Counter(BTreeMap<String, u32>),
}

fn named(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
    pairs.iter().map(|&(n, v)| (n.to_string(), v)).collect()
}

fn value_to_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn describe_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => format!("'{s}'"),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

impl OptionDef {
    pub fn toggle(name: &str) -> Self {
        OptionDef {
            name: name.to_string(),
            kind: OptionKind::Toggle { default: false },
        }
    }

    pub fn default_on_toggle(name: &str) -> Self {
        OptionDef {
            name: name.to_string(),
            kind: OptionKind::Toggle { default: true },
        }
    }

    pub fn range(name: &str, start: i64, end: i64, default: i64) -> Self {
        OptionDef {
            name: name.to_string(),
            kind: OptionKind::Range {
                start,
                end,
                default,
            },
        }
    }

    pub fn named_range(
        name: &str,
        start: i64,
        end: i64,
        default: i64,
        special: &[(&str, i64)],
    ) -> Self {
        OptionDef {
            name: name.to_string(),
            kind: OptionKind::NamedRange {
                start,
                end,
                default,
                special: named(special),
            },
        }
    }

    pub fn choice(name: &str, options: &[(&str, i64)], default: i64) -> Self {
        OptionDef {
            name: name.to_string(),
            kind: OptionKind::Choice {
                options: named(options),
                aliases: vec![],
                default,
            },
        }
    }

    pub fn option_set(name: &str, default: &[&str], universe: KeyUniverse) -> Self {
        OptionDef {
            name: name.to_string(),
            kind: OptionKind::OptionSet {
                default: default.iter().map(|s| s.to_string()).collect(),
                universe,
                verify: None,
            },
        }
    }

    pub fn counter(name: &str, universe: KeyUniverse) -> Self {
        OptionDef {
            name: name.to_string(),
            kind: OptionKind::Counter { universe },
        }
    }

    pub fn with_aliases(mut self, new_aliases: &[(&str, i64)]) -> Self {
        if let OptionKind::Choice { aliases, .. } = &mut self.kind {
            aliases.extend(named(new_aliases));
        }
        self
    }

    pub fn with_verifier(mut self, verifier: KeyVerifier) -> Self {
        if let OptionKind::OptionSet { verify, .. } = &mut self.kind {
            *verify = Some(verifier);
        }
        self
    }

    /// Checks the declaration itself, e.g. that a default lies inside its range.
    pub fn validate_definition(&self) -> Result<()> {
        let name = &self.name;
        match &self.kind {
            OptionKind::Toggle { .. } | OptionKind::Counter { .. } => {}
            OptionKind::Range {
                start,
                end,
                default,
            } => {
                ensure!(start <= end, "{name}: empty range {start}..={end}");
                ensure!(
                    (start..=end).contains(&default),
                    "{name}: default {default} is outside {start}..={end}"
                );
            }
            OptionKind::NamedRange {
                start,
                end,
                default,
                special,
            } => {
                ensure!(start <= end, "{name}: empty range {start}..={end}");
                let default_ok = (start..=end).contains(&default)
                    || special.iter().any(|(_, v)| v == default);
                ensure!(
                    default_ok,
                    "{name}: default {default} is neither in {start}..={end} nor a named value"
                );
            }
            OptionKind::Choice {
                options,
                aliases,
                default,
            } => {
                ensure!(!options.is_empty(), "{name}: choice without options");
                ensure!(
                    options.iter().any(|(_, v)| v == default),
                    "{name}: default {default} is not one of the choices"
                );
                for (alias, v) in aliases {
                    ensure!(
                        options.iter().any(|(_, o)| o == v),
                        "{name}: alias '{alias}' points at unknown value {v}"
                    );
                }
            }
            OptionKind::OptionSet {
                default, universe, ..
            } => {
                if let KeyUniverse::Static(keys) = universe {
                    for d in default {
                        ensure!(
                            keys.contains(d),
                            "{name}: default key '{d}' is not a valid key"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    pub fn default_value(&self) -> OptionValue {
        match &self.kind {
            OptionKind::Toggle { default } => OptionValue::Bool(*default),
            OptionKind::Range { default, .. }
            | OptionKind::NamedRange { default, .. }
            | OptionKind::Choice { default, .. } => OptionValue::Int(*default),
            OptionKind::OptionSet { default, .. } => OptionValue::Set(default.clone()),
            OptionKind::Counter { .. } => OptionValue::Counter(BTreeMap::new()),
        }
    }

    /// Reads a raw value, reporting every violation rather than stopping at the first.
    pub fn decode(&self, raw: &Value, names: &NameTables) -> Result<OptionValue, Vec<OptionError>> {
        let name = self.name.as_str();
        let err = |message: String| vec![OptionError::new(name, message)];
        match &self.kind {
            OptionKind::Toggle { .. } => {
                let b = match raw {
                    Value::Bool(b) => Some(*b),
                    Value::Number(n) => match n.as_i64() {
                        Some(0) => Some(false),
                        Some(1) => Some(true),
                        _ => None,
                    },
                    Value::String(s) => match s.trim().to_lowercase().as_str() {
                        "true" | "on" | "yes" | "1" => Some(true),
                        "false" | "off" | "no" | "0" => Some(false),
                        _ => None,
                    },
                    _ => None,
                };
                b.map(OptionValue::Bool)
                    .ok_or_else(|| err(format!("expected true or false, got {}", describe_raw(raw))))
            }
            OptionKind::Range { start, end, .. } => {
                let v = value_to_int(raw)
                    .ok_or_else(|| err(format!("expected an integer, got {}", describe_raw(raw))))?;
                if !(start..=end).contains(&&v) {
                    return Err(err(format!("value {v} is outside the range {start}..={end}")));
                }
                Ok(OptionValue::Int(v))
            }
            OptionKind::NamedRange {
                start,
                end,
                special,
                ..
            } => {
                if let Value::String(s) = raw {
                    let key = s.trim().to_lowercase();
                    if let Some((_, v)) = special.iter().find(|(n, _)| *n == key) {
                        return Ok(OptionValue::Int(*v));
                    }
                }
                let special_names: Vec<&str> = special.iter().map(|(n, _)| n.as_str()).collect();
                let v = value_to_int(raw).ok_or_else(|| {
                    err(format!(
                        "expected an integer or one of [{}], got {}",
                        special_names.join(", "),
                        describe_raw(raw)
                    ))
                })?;
                if !(start..=end).contains(&&v) && !special.iter().any(|(_, s)| *s == v) {
                    return Err(err(format!(
                        "value {v} is outside the range {start}..={end} and is not one of [{}]",
                        special_names.join(", ")
                    )));
                }
                Ok(OptionValue::Int(v))
            }
            OptionKind::Choice {
                options, aliases, ..
            } => {
                let lookup = |key: &str| {
                    options
                        .iter()
                        .chain(aliases.iter())
                        .find(|(n, _)| n == key)
                        .map(|(_, v)| *v)
                };
                let v = match raw {
                    Value::String(s) => lookup(&s.trim().to_lowercase()),
                    Value::Bool(b) => lookup(if *b { "true" } else { "false" }),
                    Value::Number(n) => n
                        .as_i64()
                        .filter(|v| options.iter().any(|(_, o)| o == v)),
                    _ => None,
                };
                v.map(OptionValue::Int).ok_or_else(|| {
                    let valid: Vec<&str> = options.iter().map(|(n, _)| n.as_str()).collect();
                    err(format!(
                        "unknown choice {} (valid: {})",
                        describe_raw(raw),
                        valid.join(", ")
                    ))
                })
            }
            OptionKind::OptionSet {
                universe, verify, ..
            } => {
                let mut keys = BTreeSet::new();
                match raw {
                    Value::Null => {}
                    Value::Sequence(seq) => {
                        for entry in seq {
                            match entry {
                                Value::String(s) => {
                                    keys.insert(s.clone());
                                }
                                other => {
                                    return Err(err(format!(
                                        "expected a list of names, found {}",
                                        describe_raw(other)
                                    )))
                                }
                            }
                        }
                    }
                    other => {
                        return Err(err(format!(
                            "expected a list of names, got {}",
                            describe_raw(other)
                        )))
                    }
                }
                let invalid: Vec<&str> = keys
                    .iter()
                    .filter(|k| !names.contains(universe, k))
                    .map(|k| k.as_str())
                    .collect();
                let mut errors = vec![];
                if !invalid.is_empty() {
                    errors.push(OptionError::new(
                        name,
                        format!("invalid keys: {}", invalid.join(", ")),
                    ));
                }
                if let Some(verify) = verify {
                    errors.extend(verify(&keys).into_iter().map(|m| OptionError::new(name, m)));
                }
                if errors.is_empty() {
                    Ok(OptionValue::Set(keys))
                } else {
                    Err(errors)
                }
            }
            OptionKind::Counter { universe } => {
                let mapping = match raw {
                    Value::Null => return Ok(OptionValue::Counter(BTreeMap::new())),
                    Value::Mapping(m) => m,
                    other => {
                        return Err(err(format!(
                            "expected a mapping of names to counts, got {}",
                            describe_raw(other)
                        )))
                    }
                };
                let mut counts = BTreeMap::new();
                let mut errors = vec![];
                for (k, v) in mapping {
                    let Value::String(key) = k else {
                        errors.push(OptionError::new(
                            name,
                            format!("invalid key {}", describe_raw(k)),
                        ));
                        continue;
                    };
                    if !names.contains(universe, key) {
                        errors.push(OptionError::new(name, format!("invalid key: {key}")));
                        continue;
                    }
                    match value_to_int(v).and_then(|c| u32::try_from(c).ok()) {
                        Some(c) => {
                            counts.insert(key.clone(), c);
                        }
                        None => errors.push(OptionError::new(
                            name,
                            format!("count for '{key}' must be a non-negative integer"),
                        )),
                    }
                }
                if errors.is_empty() {
                    Ok(OptionValue::Counter(counts))
                } else {
                    Err(errors)
                }
            }
        }
    }

    /// Canonical external form of a value, which `decode` reads back unchanged.
    pub fn encode(&self, value: &OptionValue) -> Value {
        match (&self.kind, value) {
            (OptionKind::NamedRange { start, end, special, .. }, OptionValue::Int(v))
                if !(start..=end).contains(&v) =>
            {
                match special.iter().find(|(_, s)| s == v) {
                    Some((n, _)) => Value::String(n.clone()),
                    None => Value::Number((*v).into()),
                }
            }
            (OptionKind::Choice { options, .. }, OptionValue::Int(v)) => {
                match options.iter().find(|(_, o)| o == v) {
                    Some((n, _)) => Value::String(n.clone()),
                    None => Value::Number((*v).into()),
                }
            }
            (_, OptionValue::Bool(b)) => Value::Bool(*b),
            (_, OptionValue::Int(v)) => Value::Number((*v).into()),
            (_, OptionValue::Set(keys)) => {
                Value::Sequence(keys.iter().map(|k| Value::String(k.clone())).collect())
            }
            (_, OptionValue::Counter(counts)) => Value::Mapping(
                counts
                    .iter()
                    .map(|(k, c)| (Value::String(k.clone()), Value::Number((*c).into())))
                    .collect(),
            ),
        }
    }
}

/// Options present on every world type.
pub fn common_option_definitions() -> Vec<OptionDef> {
    vec![
        OptionDef::option_set(LOCAL_ITEMS, &[], KeyUniverse::ItemNames),
        OptionDef::option_set(NON_LOCAL_ITEMS, &[], KeyUniverse::ItemNames),
        OptionDef::counter(START_INVENTORY, KeyUniverse::ItemNames),
        OptionDef::option_set(PRIORITY_LOCATIONS, &[], KeyUniverse::LocationNames),
    ]
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResolvedOptions {
    values: BTreeMap<String, OptionValue>,
}

impl ResolvedOptions {
    pub fn get(&self, name: &str) -> Result<&OptionValue> {
        self.values
            .get(name)
            .with_context(|| format!("option '{name}' is not defined"))
    }

    pub fn insert(&mut self, name: &str, value: OptionValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        match self.get(name)? {
            OptionValue::Int(v) => Ok(*v),
            other => bail!("option '{name}' is not an integer: {other:?}"),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            OptionValue::Bool(b) => Ok(*b),
            other => bail!("option '{name}' is not a toggle: {other:?}"),
        }
    }

    pub fn set(&self, name: &str) -> Result<&BTreeSet<String>> {
        match self.get(name)? {
            OptionValue::Set(keys) => Ok(keys),
            other => bail!("option '{name}' is not a set: {other:?}"),
        }
    }

    pub fn set_mut(&mut self, name: &str) -> Result<&mut BTreeSet<String>> {
        match self.values.get_mut(name) {
            Some(OptionValue::Set(keys)) => Ok(keys),
            Some(other) => bail!("option '{name}' is not a set: {other:?}"),
            None => bail!("option '{name}' is not defined"),
        }
    }

    pub fn counter(&self, name: &str) -> Result<&BTreeMap<String, u32>> {
        match self.get(name)? {
            OptionValue::Counter(counts) => Ok(counts),
            other => bail!("option '{name}' is not a counter: {other:?}"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }
}

/// Resolves every definition from the raw map, falling back to defaults for missing keys.
/// All violations are returned together, including keys that match no definition.
pub fn resolve_options(
    defs: &[OptionDef],
    raw: &BTreeMap<String, Value>,
    names: &NameTables,
) -> Result<ResolvedOptions, Vec<OptionError>> {
    let mut errors = vec![];
    for key in raw.keys() {
        if !defs.iter().any(|d| &d.name == key) {
            errors.push(OptionError::new(key, "unknown option"));
        }
    }
    let mut resolved = ResolvedOptions::default();
    for def in defs {
        let value = match raw.get(&def.name) {
            Some(v) => def.decode(v, names),
            None => Ok(def.default_value()),
        };
        match value {
            Ok(v) => resolved.insert(&def.name, v),
            Err(errs) => errors.extend(errs),
        }
    }
    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}

pub fn encode_options(defs: &[OptionDef], options: &ResolvedOptions) -> Result<serde_yaml::Mapping> {
    let mut out = serde_yaml::Mapping::new();
    for def in defs {
        let value = options.get(&def.name)?;
        out.insert(Value::String(def.name.clone()), def.encode(value));
    }
    Ok(out)
}
