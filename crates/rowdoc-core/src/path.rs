use crate::{Error, IdGenerator, Result};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database id the document store uses when none is named.
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Fully-qualified document name:
/// `projects/<project>/databases/<database>/documents/<relative path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after `/documents/`.
    pub fn relative_path(&self) -> &str {
        self.0
            .split_once("/documents/")
            .map(|(_, relative)| relative)
            .unwrap_or(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentPath {
    fn from(src: String) -> Self {
        Self(src)
    }
}

impl From<&str> for DocumentPath {
    fn from(src: &str) -> Self {
        Self(src.to_string())
    }
}

impl AsRef<str> for DocumentPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Process-wide document store defaults, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDefaults {
    /// Project owning the database. There is no fallback.
    pub project_id: Option<String>,

    /// Database used when a run names none.
    pub database_id: String,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            project_id: None,
            database_id: DEFAULT_DATABASE_ID.to_string(),
        }
    }
}

impl StoreDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }
}

/// Values fixed for one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Query text handed to the source.
    pub query: String,

    /// Top-level collection documents are written under.
    pub collection: String,

    /// Namespaces this run's documents within the collection.
    pub run_id: String,

    /// Target database. `None` or empty selects [`StoreDefaults::database_id`].
    pub database_id: Option<String>,

    pub layout: OutputLayout,
}

impl RunConfig {
    pub fn new(collection: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = Some(database_id.into());
        self
    }

    pub fn layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// How the generated id attaches to the `output` segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputLayout {
    /// `.../output<id>`: id appended to the literal with no separator. Paths
    /// written by earlier runs have this shape.
    #[default]
    Concatenated,

    /// `.../output/<id>`: each document nested under an `output` collection.
    Nested,
}

/// Builds document paths for one run.
///
/// Everything except the id is resolved once in [`PathBuilder::new`], so a
/// missing project surfaces before any record is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBuilder {
    /// Everything up to and including `output` (and the separator, if any).
    base: String,
}

impl PathBuilder {
    pub fn new(run: &RunConfig, defaults: &StoreDefaults) -> Result<Self> {
        let database = match run.database_id.as_deref() {
            Some(database) if !database.is_empty() => database,
            _ => defaults.database_id.as_str(),
        };

        if database.is_empty() {
            return Err(Error::configuration(
                "no database id configured and no default database id is available",
            ));
        }

        let project = match defaults.project_id.as_deref() {
            Some(project) if !project.is_empty() => project,
            _ => return Err(Error::configuration("no default project id is available")),
        };

        let separator = match run.layout {
            OutputLayout::Concatenated => "",
            OutputLayout::Nested => "/",
        };

        Ok(Self {
            base: format!(
                "projects/{project}/databases/{database}/documents/{}/{}/output{separator}",
                run.collection, run.run_id
            ),
        })
    }

    /// Path for a caller-supplied id.
    pub fn build(&self, id: &str) -> DocumentPath {
        let mut path = String::with_capacity(self.base.len() + id.len());
        path.push_str(&self.base);
        path.push_str(id);
        DocumentPath(path)
    }

    /// Path for the next id drawn from `ids`.
    pub fn next(&self, ids: &(impl IdGenerator + ?Sized)) -> DocumentPath {
        self.build(&ids.generate())
    }
}

/// Builds one document path, resolving configuration on every call.
///
/// Prefer [`PathBuilder`] when building many paths for the same run.
pub fn document_path(
    run: &RunConfig,
    defaults: &StoreDefaults,
    ids: &(impl IdGenerator + ?Sized),
) -> Result<DocumentPath> {
    Ok(PathBuilder::new(run, defaults)?.next(ids))
}
