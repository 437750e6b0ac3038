pub mod driver;
pub use driver::{Sink, Source};

pub mod document;
pub use document::{Document, FieldValue, Fields, Write};

mod error;
pub use error::Error;

pub mod id;
pub use id::IdGenerator;

mod map;
pub use map::map_record;

pub mod path;
pub use path::{document_path, DocumentPath, OutputLayout, PathBuilder, RunConfig, StoreDefaults};

pub mod record;
pub use record::{Record, RecordStream, Value};

/// A Result type alias that uses rowdoc's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
