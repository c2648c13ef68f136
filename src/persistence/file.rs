// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use log::{debug, info, warn};

use super::PropertyStore;
use crate::error::StoreError;

const STORE_DIR: &str = "flypad";
const STORE_FILE: &str = "properties.json";

/// Property store backed by a flat JSON object on disk.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename. Write failures are logged and the in-memory copy stays
/// authoritative until the process exits.
#[derive(Debug)]
pub struct FilePropertyStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FilePropertyStore {
    /// Default location under the platform data directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(STORE_DIR).join(STORE_FILE))
    }

    /// Open the store at `path`, creating its parent directory if needed.
    ///
    /// A missing file starts empty. So does a file that does not hold a JSON
    /// object of strings, after logging a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let values = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(values) => {
                    info!("Loaded {} properties from {}", values.len(), path.display());
                    values
                }
                Err(e) => {
                    warn!(
                        "Ignoring unreadable property store {}: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        } else {
            debug!("No property store at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        if let Err(e) = write_atomically(&self.path, values) {
            warn!(
                "Failed to write property store {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

fn write_atomically(path: &Path, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
    let contents = serde_json::to_string_pretty(values)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl PropertyStore for FilePropertyStore {
    fn get(&self, key: &str, default: &str) -> String {
        if let Some(value) = self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return value.clone();
        }

        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = values.get(key) {
            return value.clone();
        }
        values.insert(key.to_string(), default.to_string());
        self.persist(&values);
        default.to_string()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn contains(&self, key: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}
