use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
};

use schemars::{json_schema, JsonSchema};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A path written in the configuration, resolved against the directory of the config file.
/// The path has to exist when the configuration is loaded.
#[derive(Debug, Clone)]
pub struct FilePath {
    /// The path as written in the configuration.
    pub relative: String,
    absolute: PathBuf,
}

thread_local!(static CONFIG_ROOT: RefCell<Option<PathBuf>> = const { RefCell::new(None) });

/// Runs `f` with `root` as the directory that [`FilePath`]s deserialized inside it are relative to.
pub fn with_start_path<F, T>(root: &Path, f: F) -> T
where
    F: FnOnce() -> T,
{
    let previous = CONFIG_ROOT.with(|cell| cell.replace(Some(root.to_path_buf())));
    let result = f();
    CONFIG_ROOT.with(|cell| cell.replace(previous));
    result
}

impl FilePath {
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }
}

impl Serialize for FilePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.relative)
    }
}

impl<'de> Deserialize<'de> for FilePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let relative = String::deserialize(deserializer)?;
        let root = CONFIG_ROOT
            .with(|cell| cell.borrow().clone())
            .ok_or_else(|| de::Error::custom("config root directory (start_path) is not set"))?;
        let absolute = fs::canonicalize(root.join(&relative)).map_err(|err| {
            de::Error::custom(format!("failed to resolve path '{}': {}", relative, err))
        })?;

        Ok(FilePath { relative, absolute })
    }
}

impl JsonSchema for FilePath {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "FilePath".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        json_schema!({
            "type": "string",
            "format": "path"
        })
    }

    fn inline_schema() -> bool {
        true
    }
}
