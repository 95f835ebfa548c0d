//! Data module - CSV loading, column resolution, filtering and metrics

pub mod loader;
pub mod metrics;
pub mod processor;
pub mod resolver;

pub use loader::{ColumnKind, DataLoader, Dataset, LoaderError};
pub use metrics::{LabelFormat, MetricCatalog, MetricError, MetricSpec, Scale};
pub use processor::DataProcessor;
pub use resolver::{resolve_columns, ResolutionPolicy, ResolvedColumns, SchemaError};
