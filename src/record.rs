use chrono::{DateTime, Utc};

use crate::severity::Severity;
use crate::thread;

/// Attached meta information, a name with a rendered value.
#[derive(Copy, Clone, Debug)]
pub struct Meta<'a> {
    pub name: &'static str,
    pub value: &'a str,
}

impl<'a> Meta<'a> {
    #[inline]
    pub fn new(name: &'static str, value: &'a str) -> Meta<'a> {
        Meta { name, value }
    }
}

#[derive(Clone, Debug)]
struct MetaBuf {
    name: &'static str,
    value: String,
}

impl<'a> From<&'a Meta<'a>> for MetaBuf {
    fn from(meta: &'a Meta<'a>) -> MetaBuf {
        MetaBuf {
            name: meta.name,
            value: meta.value.into(),
        }
    }
}

/// Borrowed snapshot of a single logging event.
///
/// Everything a destination may ask for is captured at construction: the
/// numeric severity, the timestamp, the calling thread and the final message
/// text. Rendering happens before the record is made; the message is written
/// as given.
#[derive(Debug)]
pub struct Record<'a> {
    severity: i32,
    timestamp: DateTime<Utc>,
    thread: usize,
    message: &'a str,
    meta: &'a [Meta<'a>],
}

impl<'a> Record<'a> {
    pub fn new<S>(severity: S, message: &'a str) -> Record<'a>
    where
        S: Severity,
    {
        Record::with_meta(severity, message, &[])
    }

    pub fn with_meta<S>(severity: S, message: &'a str, meta: &'a [Meta<'a>]) -> Record<'a>
    where
        S: Severity,
    {
        Record {
            severity: severity.as_i32(),
            timestamp: Utc::now(),
            thread: thread::id(),
            message,
            meta,
        }
    }

    pub fn severity(&self) -> i32 {
        self.severity
    }

    pub fn datetime(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    /// Numeric id of the thread the record was made on.
    pub fn thread(&self) -> usize {
        self.thread
    }

    pub fn message(&self) -> &str {
        self.message
    }

    pub fn meta(&self) -> &[Meta<'a>] {
        self.meta
    }
}

/// Owned variant of a record for crossing thread boundaries.
#[derive(Clone, Debug)]
pub struct RecordBuf {
    severity: i32,
    timestamp: DateTime<Utc>,
    thread: usize,
    message: String,
    meta: Vec<MetaBuf>,
}

impl RecordBuf {
    /// Temporarily borrows the buffer as a record, giving destinations a
    /// single view type to work with.
    pub fn borrow_and<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Record) -> R,
    {
        let meta: Vec<Meta> = self.meta
            .iter()
            .map(|meta| Meta::new(meta.name, &meta.value))
            .collect();

        let rec = Record {
            severity: self.severity,
            timestamp: self.timestamp,
            thread: self.thread,
            message: &self.message,
            meta: &meta,
        };

        f(&rec)
    }

    pub fn severity(&self) -> i32 {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<'a> From<&'a Record<'a>> for RecordBuf {
    fn from(rec: &'a Record<'a>) -> RecordBuf {
        RecordBuf {
            severity: rec.severity,
            timestamp: rec.timestamp,
            thread: rec.thread,
            message: rec.message.into(),
            meta: rec.meta.iter().map(From::from).collect(),
        }
    }
}
