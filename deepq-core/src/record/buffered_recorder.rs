use super::{AggregateRecorder, Record, Recorder};

/// Buffered recorder.
///
/// Keeps every written or stored record in memory, together with the steps at
/// which [`AggregateRecorder::flush`] was called.
#[derive(Debug, Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    flushed_at: Vec<i64>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// The number of records in the buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been received.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Steps at which the recorder was flushed.
    pub fn flushed_at(&self) -> &[i64] {
        &self.flushed_at
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn flush(&mut self, step: i64) {
        self.flushed_at.push(step);
    }
}
