//! Resolving source names into raw configuration data.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::source::format::SourceFormat;

/// Prefix marking a source name as a path on the local filesystem.
pub const FILE_MARKER: &str = "file:";

/// Where a piece of configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Local file, addressed with the `file:` marker.
    File(PathBuf),
    /// Bundled resource, embedded or found in a resource directory.
    Resource,
    /// Remote property endpoint backing the dynamic layer.
    Remote(String),
}

/// A source as loaded, before substitution.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    name: String,
    origin: SourceOrigin,
    entries: Vec<(String, String)>,
}

impl ConfigSource {
    pub fn new(
        name: impl Into<String>,
        origin: SourceOrigin,
        entries: Vec<(String, String)>,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    /// Raw pairs in load order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Raw value for `key`. Later duplicates win, matching merge order.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The set of bundled resources a loader can resolve.
///
/// Embedded contents are consulted first, then each resource directory in
/// the order it was added.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    embedded: HashMap<String, Cow<'static, str>>,
    dirs: Vec<PathBuf>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register contents under a resource name, typically from `include_str!`.
    pub fn with_embedded(
        mut self,
        name: impl Into<String>,
        contents: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.embedded.insert(name.into(), contents.into());
        self
    }

    /// Add a directory searched for resources by file name.
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dirs.push(dir.as_ref().to_path_buf());
        self
    }

    fn lookup(&self, name: &str) -> Result<Option<String>> {
        if let Some(contents) = self.embedded.get(name) {
            tracing::trace!(name, "resource found in embedded set");
            return Ok(Some(contents.to_string()));
        }

        for dir in &self.dirs {
            let path = dir.join(name);
            match read_optional(name, &path)? {
                Some(contents) => {
                    tracing::trace!(name, path = %path.display(), "resource found on disk");
                    return Ok(Some(contents));
                }
                None => continue,
            }
        }

        Ok(None)
    }
}

/// Loads configuration sources by name.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    resources: Resources,
}

impl SourceLoader {
    pub fn new(resources: Resources) -> Self {
        Self { resources }
    }

    /// Load and parse the named source.
    ///
    /// Names beginning with [`FILE_MARKER`] are read from the filesystem, all
    /// others are looked up as bundled resources.
    pub fn load(&self, name: &str) -> Result<ConfigSource> {
        tracing::debug!(name, "loading config source");

        let (origin, contents) = match name.strip_prefix(FILE_MARKER) {
            Some(path) => {
                let path = PathBuf::from(path);
                let contents = read_optional(name, &path)?;
                (SourceOrigin::File(path), contents)
            }
            None => (SourceOrigin::Resource, self.resources.lookup(name)?),
        };

        let contents = contents.ok_or_else(|| ConfigError::SourceNotFound {
            name: name.to_string(),
        })?;

        let entries = SourceFormat::from_name(name)
            .parse(&contents)
            .map_err(|message| ConfigError::Parse {
                name: name.to_string(),
                message,
            })?;

        tracing::debug!(name, entries = entries.len(), "config source loaded");
        Ok(ConfigSource::new(name, origin, entries))
    }
}

fn read_optional(name: &str, path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::Io {
            name: name.to_string(),
            source: e,
        }),
    }
}
