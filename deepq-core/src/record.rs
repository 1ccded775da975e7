//! Types and traits for recording training telemetry.
//!
//! Every environment step of the agent produces a [`Record`], a string-keyed
//! map of [`RecordValue`]s. Records are handed to an [`AggregateRecorder`],
//! which stores them and periodically writes an aggregate to its output.
//!
//! * [`Record`] - A container of key-value pairs
//! * [`Recorder`] - Writes a record to an output destination
//! * [`AggregateRecorder`] - Stores records and flushes aggregates of them
//! * [`RecordStorage`] - Aggregates stored scalars with min, max, mean and median
//! * [`StatRecorder`] - Aggregates per-step records and writes them to a [`Recorder`]
//! * [`BufferedRecorder`] - Keeps records in memory
//! * [`NullRecorder`] - Discards every record
//!
//! # Basic Usage
//!
//! ```rust
//! use deepq_core::record::{Record, RecordValue};
//!
//! let t = 1;
//! let q_values = vec![0.1f32, 0.3, -0.2];
//!
//! let mut record = Record::empty();
//! record.insert("t", RecordValue::Scalar(t as f32));
//! record.insert("reward", RecordValue::Scalar(-1.0));
//! record.insert("q_values", RecordValue::Array1(q_values));
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod stat_recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use stat_recorder::StatRecorder;
pub use storage::RecordStorage;
