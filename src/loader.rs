// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Reads ecosystem sources into validated descriptors
//!
//! Two source forms are accepted: a plain json document `{"apps": [...]}`, and the
//! process manager module form `module.exports = {"apps": [...]};` where the exported
//! object is json compatible.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::descriptor::{json_type_name, validate, AppDescriptor, EnvMap, EnvValue};
use crate::error::ValidationError;
use crate::Error;

const MODULE_EXPORTS: &str = "module.exports";

/// What to do when one `env` declares the same variable twice
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// Keep the last declared value and log a warning
    LastWins,
    /// Fail with a malformed config error
    Reject,
}

impl Default for DuplicateKeys {
    fn default() -> Self {
        DuplicateKeys::LastWins
    }
}

#[derive(Clone, Debug, Default)]
pub struct Loader {
    duplicate_keys: DuplicateKeys,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Loads a single source held in memory, `source_name` is used in errors
    pub fn load_str(&self, source_name: &str, text: &str) -> Result<Vec<AppDescriptor>, Error> {
        let ecosystem: RawEcosystem = serde_json::from_str(json_body(text))
            .map_err(|e| Error::malformed(source_name, e.to_string()))?;

        let raw_apps = ecosystem
            .apps
            .ok_or_else(|| Error::malformed(source_name, "missing `apps` array"))?;

        let apps = raw_apps
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| self.descriptor(source_name, idx, raw))
            .collect::<Result<Vec<_>, Error>>()?;

        for app in &apps {
            validate(app)?;
        }
        check_unique_names(&apps)?;

        debug!(source = source_name, apps = apps.len(), "loaded ecosystem");
        Ok(apps)
    }

    /// Loads the ecosystem file at `path`
    ///
    /// A relative `cwd` in a descriptor is resolved against the file's directory.
    pub fn load_path(&self, path: &Path) -> Result<Vec<AppDescriptor>, Error> {
        let text = fs::read_to_string(path).map_err(|e| Error::read_config(path, e))?;

        let mut apps = self.load_str(&path.display().to_string(), &text)?;

        if let Some(dir) = path.parent() {
            for app in &mut apps {
                if let Some(cwd) = app.cwd.take() {
                    app.cwd = Some(if cwd.is_relative() { dir.join(cwd) } else { cwd });
                }
            }
        }

        Ok(apps)
    }

    /// Loads every source in order, app names must be unique across all of them
    pub fn load_paths<I, P>(&self, paths: I) -> Result<Vec<AppDescriptor>, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut apps = Vec::new();
        for path in paths {
            apps.extend(self.load_path(path.as_ref())?);
        }

        check_unique_names(&apps)?;
        Ok(apps)
    }

    fn descriptor(&self, source_name: &str, idx: usize, raw: RawApp) -> Result<AppDescriptor, Error> {
        let missing = |field: &str| {
            Error::malformed(source_name, format!("apps[{}] is missing `{}`", idx, field))
        };

        let name = raw.name.ok_or_else(|| missing("name"))?;
        let script = raw.script.ok_or_else(|| missing("script"))?;
        let raw_env = raw.env.ok_or_else(|| missing("env"))?;

        let mut env = EnvMap::new();
        for (key, value) in raw_env.0 {
            let value = EnvValue::from_json(value);
            if let EnvValue::Unsupported(ref json) = value {
                return Err(Error::malformed(
                    source_name,
                    format!(
                        "app {:?}: env `{}` must be a string, integer or float, found {}",
                        name,
                        key,
                        json_type_name(json)
                    ),
                ));
            }

            if env.contains_key(&key) {
                match self.duplicate_keys {
                    DuplicateKeys::Reject => {
                        return Err(Error::malformed(
                            source_name,
                            format!("app {:?}: env `{}` is declared more than once", name, key),
                        ))
                    }
                    DuplicateKeys::LastWins => {
                        warn!(
                            source = source_name,
                            app = %name,
                            key = %key,
                            value = %value,
                            "env key declared more than once, keeping the last value"
                        );
                    }
                }
            }

            env.insert(key, value);
        }

        Ok(AppDescriptor {
            name,
            script: PathBuf::from(script),
            interpreter: raw.interpreter,
            args: raw.args.map(RawArgs::into_vec).unwrap_or_default(),
            cwd: raw.cwd,
            env,
        })
    }
}

/// Loads a source with the default policy
pub fn load(text: &str) -> Result<Vec<AppDescriptor>, Error> {
    Loader::default().load_str("<inline>", text)
}

/// Looks an app up by name
pub fn find<'a>(apps: &'a [AppDescriptor], name: &str) -> Result<&'a AppDescriptor, Error> {
    apps.iter().find(|app| app.name == name).ok_or_else(|| {
        let available = apps
            .iter()
            .map(|app| app.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Error::from(format!("no app named {:?}, available: [{}]", name, available))
    })
}

fn check_unique_names(apps: &[AppDescriptor]) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for app in apps {
        if !seen.insert(app.name.as_str()) {
            return Err(ValidationError::new(&app.name, "name", "app name is declared more than once").into());
        }
    }

    Ok(())
}

/// Strips the `module.exports = ...;` wrapper, if any
fn json_body(text: &str) -> &str {
    let text = text.trim();
    let body = match text.strip_prefix(MODULE_EXPORTS) {
        Some(rest) => {
            let rest = rest.trim_start();
            rest.strip_prefix('=').unwrap_or(rest)
        }
        None => text,
    };

    body.trim().trim_end_matches(';').trim_end()
}

#[derive(Deserialize)]
struct RawEcosystem {
    apps: Option<Vec<RawApp>>,
}

#[derive(Deserialize)]
struct RawApp {
    name: Option<String>,
    script: Option<String>,
    env: Option<RawEnv>,
    interpreter: Option<String>,
    args: Option<RawArgs>,
    cwd: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArgs {
    Line(String),
    List(Vec<String>),
}

impl RawArgs {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawArgs::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            RawArgs::List(list) => list,
        }
    }
}

/// Every `env` entry in declaration order, duplicates included
struct RawEnv(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for RawEnv {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EnvVisitor;

        impl<'de> Visitor<'de> for EnvVisitor {
            type Value = RawEnv;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of environment variables")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawEnv, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    entries.push(entry);
                }

                Ok(RawEnv(entries))
            }
        }

        deserializer.deserialize_map(EnvVisitor)
    }
}
