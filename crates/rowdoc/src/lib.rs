mod export;
pub use export::{Export, ExportBuilder, Summary, DEFAULT_BATCH_SIZE};

pub mod sink;
pub mod source;

pub use rowdoc_core::{
    document_path, err, id, map_record, path, DocumentPath, Error, FieldValue, Fields,
    IdGenerator, OutputLayout, Record, RecordStream, Result, RunConfig, Sink, Source,
    StoreDefaults, Value, Write,
};

pub use rowdoc_core::async_trait;
