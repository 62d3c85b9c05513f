use crate::error::{WriteError, WriteResult};
use crate::record::Record;
use crate::target::Target;

/// Transport-side contract for queue-like destinations.
///
/// The transport itself lives outside this crate; implementations adapt
/// whatever client library reaches the broker, database or service the
/// records are bound for.
pub trait Proxy: Send {
    /// Whether the named destination currently exists.
    fn exists(&mut self, name: &str) -> Result<bool, WriteError>;

    /// Creates the named destination.
    fn create(&mut self, name: &str) -> WriteResult;

    /// Delivers one payload to the named destination.
    fn send(&mut self, name: &str, payload: &[u8]) -> WriteResult;
}

#[derive(Clone, Debug)]
pub struct ProxyOptions {
    /// Name of the destination on the far side of the transport.
    pub destination: String,
    /// Create a missing destination on first use instead of failing.
    pub auto_create: bool,
}

/// Delivers records through a [`Proxy`] to a named destination.
///
/// The destination is probed once, on the first record. A missing destination
/// with `auto_create` off makes every record fail with `Unavailable`; the
/// records are dropped and reported, the process keeps running.
pub struct ProxyTarget<P> {
    proxy: P,
    options: ProxyOptions,
    checked: bool,
    available: bool,
}

impl<P: Proxy> ProxyTarget<P> {
    pub fn new(proxy: P, options: ProxyOptions) -> ProxyTarget<P> {
        ProxyTarget {
            proxy,
            options,
            checked: false,
            available: false,
        }
    }

    fn ensure_destination(&mut self) -> WriteResult {
        if !self.checked {
            // A failed probe or create leaves the state unchecked, so a
            // transient transport error does not latch the destination as
            // gone forever.
            let exists = self.proxy.exists(&self.options.destination)?;

            if !exists && self.options.auto_create {
                self.proxy.create(&self.options.destination)?;
            }

            self.available = exists || self.options.auto_create;
            self.checked = true;
        }

        if self.available {
            Ok(())
        } else {
            Err(WriteError::Unavailable(self.options.destination.clone()))
        }
    }
}

impl<P: Proxy> Target for ProxyTarget<P> {
    fn write(&mut self, rec: &Record) -> WriteResult {
        self.ensure_destination()?;

        self.proxy.send(&self.options.destination, rec.message().as_bytes())
    }
}
