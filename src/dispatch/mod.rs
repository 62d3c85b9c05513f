use std::io;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::completion::Completion;
use crate::error::{ConfigError, WriteError, WriteResult};
use crate::record::RecordBuf;
use crate::target::Target;

/// What happens to a record arriving at a full queue.
#[derive(Clone, Copy, Debug)]
pub enum Overflow {
    /// Let the queue grow past the limit.
    Grow,
    /// Reject the incoming record with `Discarded`.
    Discard,
    /// Hold the submitting thread until the queue sinks below the limit.
    Block,
}

impl FromStr for Overflow {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Overflow, ConfigError> {
        match &*name.to_ascii_lowercase() {
            "grow" => Ok(Overflow::Grow),
            "discard" => Ok(Overflow::Discard),
            "block" => Ok(Overflow::Block),
            _ => Err(ConfigError::Invalid("overflowAction", "one of Grow, Discard, Block")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DispatchOptions {
    /// Resolve each record before starting on the next one.
    pub ordered: bool,
    /// Worker threads when unordered. Ordered dispatch always uses one.
    pub workers: usize,
    /// Queue depth at which the overflow policy kicks in.
    pub queue_limit: usize,
    pub overflow: Overflow,
    /// How long shutdown keeps delivering queued records.
    pub drain: Duration,
}

impl Default for DispatchOptions {
    fn default() -> DispatchOptions {
        DispatchOptions {
            ordered: true,
            workers: 1,
            queue_limit: 10_000,
            overflow: Overflow::Grow,
            drain: Duration::from_secs(1),
        }
    }
}

enum Event {
    Record(RecordBuf, Completion),
    Flush(Completion),
    Shutdown,
}

struct Shared {
    depth: AtomicUsize,
    closed: AtomicBool,
    drain_deadline: Mutex<Option<Instant>>,
}

impl Shared {
    fn past_drain_deadline(&self) -> bool {
        match *self.drain_deadline.lock().unwrap() {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

struct Inner {
    tx: Mutex<Sender<Event>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    workers: usize,
    drain: Duration,
    shared: Arc<Shared>,
}

impl Inner {
    fn new(
        tx: Sender<Event>,
        rx: Receiver<Event>,
        target: Box<dyn Target>,
        shared: Arc<Shared>,
        workers: usize,
        drain: Duration,
    ) -> Inner {
        let rx = Arc::new(Mutex::new(rx));
        let target = Arc::new(Mutex::new(target));

        let threads = (0..workers)
            .map(|_| {
                let rx = rx.clone();
                let target = target.clone();
                let shared = shared.clone();

                thread::spawn(move || worker_loop(&rx, &target, &shared))
            })
            .collect();

        Inner {
            tx: Mutex::new(tx),
            threads: Mutex::new(threads),
            workers,
            drain,
            shared,
        }
    }

    fn shutdown(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            *self.shared.drain_deadline.lock().unwrap() = Some(Instant::now() + self.drain);

            // Sent after the closed flag flips, so every record accepted
            // before shutdown sits ahead of the stop events in the queue.
            let tx = self.tx.lock().unwrap();
            for _ in 0..self.workers {
                if tx.send(Event::Shutdown).is_err() {
                    break;
                }
            }
        }

        let threads = mem::take(&mut *self.threads.lock().unwrap());
        for thread in threads {
            let _ = thread.join();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(rx: &Mutex<Receiver<Event>>, target: &Mutex<Box<dyn Target>>, shared: &Shared) {
    loop {
        // Bind before matching: holding the receiver lock across delivery
        // would serialize the whole pool on one record.
        let event = {
            let rx = rx.lock().unwrap_or_else(PoisonError::into_inner);
            rx.recv()
        };

        match event {
            Ok(Event::Record(rec, completion)) => {
                shared.depth.fetch_sub(1, Ordering::SeqCst);

                if shared.past_drain_deadline() {
                    completion.resolve(Err(WriteError::Shutdown));
                    continue;
                }

                completion.resolve(deliver(target, &rec));
            }
            Ok(Event::Flush(completion)) => {
                completion.resolve(flush_target(target));
            }
            Ok(Event::Shutdown) | Err(..) => break,
        }
    }
}

fn deliver(target: &Mutex<Box<dyn Target>>, rec: &RecordBuf) -> WriteResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut target = target.lock().unwrap_or_else(PoisonError::into_inner);

        rec.borrow_and(|rec| target.write(rec))
    }));

    outcome.unwrap_or_else(|_| {
        Err(WriteError::Io(io::Error::new(io::ErrorKind::Other, "destination panicked")))
    })
}

fn flush_target(target: &Mutex<Box<dyn Target>>) -> WriteResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        target.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }));

    outcome.unwrap_or_else(|_| {
        Err(WriteError::Io(io::Error::new(io::ErrorKind::Other, "destination panicked")))
    })
}

/// Asynchronous façade in front of one target.
///
/// Records are queued and delivered on the dispatcher's worker threads; the
/// caller hears the outcome through the completion attached to each record,
/// which resolves exactly once whatever happens to the record.
///
/// Ordered dispatch runs a single worker and resolves each record before
/// starting on the next, so completions observe submission order. Unordered
/// dispatch spreads the queue over a small pool and only promises that every
/// record is delivered and resolved eventually.
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Event>,
    shared: Arc<Shared>,
    options: DispatchOptions,
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(target: Box<dyn Target>, options: DispatchOptions) -> Dispatcher {
        let (tx, rx) = mpsc::channel();
        let workers = if options.ordered { 1 } else { options.workers.max(1) };

        let shared = Arc::new(Shared {
            depth: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            drain_deadline: Mutex::new(None),
        });

        let inner = Inner::new(tx.clone(), rx, target, shared.clone(), workers, options.drain);

        Dispatcher {
            tx,
            shared,
            options,
            inner: Arc::new(inner),
        }
    }

    /// Hands a record to the worker pool.
    ///
    /// Returns as soon as the record is queued; only the `Block` overflow
    /// policy can make it wait longer.
    pub fn write(&self, rec: RecordBuf, completion: Completion) {
        if self.shared.closed.load(Ordering::SeqCst) {
            completion.resolve(Err(WriteError::Closed));
            return;
        }

        if self.shared.depth.load(Ordering::SeqCst) >= self.options.queue_limit {
            match self.options.overflow {
                Overflow::Grow => {}
                Overflow::Discard => {
                    completion.resolve(Err(WriteError::Discarded));
                    return;
                }
                Overflow::Block => {
                    if !self.wait_for_room() {
                        if self.shared.closed.load(Ordering::SeqCst) {
                            completion.resolve(Err(WriteError::Closed));
                        } else {
                            completion.resolve(Err(WriteError::Discarded));
                        }
                        return;
                    }
                }
            }
        }

        self.shared.depth.fetch_add(1, Ordering::SeqCst);

        if let Err(SendError(event)) = self.tx.send(Event::Record(rec, completion)) {
            self.shared.depth.fetch_sub(1, Ordering::SeqCst);

            if let Event::Record(.., completion) = event {
                completion.resolve(Err(WriteError::Closed));
            }
        }
    }

    /// Asks the worker pool to flush the target, resolving `completion` once
    /// everything queued before the flush has been delivered.
    pub fn flush(&self, completion: Completion) {
        if self.shared.closed.load(Ordering::SeqCst) {
            completion.resolve(Err(WriteError::Closed));
            return;
        }

        if let Err(SendError(event)) = self.tx.send(Event::Flush(completion)) {
            if let Event::Flush(completion) = event {
                completion.resolve(Err(WriteError::Closed));
            }
        }
    }

    /// Stops accepting records and joins the workers.
    ///
    /// Records accepted before the call keep flowing to the target until the
    /// drain deadline; whatever is still queued past it resolves with
    /// `Shutdown` unwritten. Dropping the last clone does the same thing.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    fn wait_for_room(&self) -> bool {
        let deadline = Instant::now() + self.options.drain;

        while self.shared.depth.load(Ordering::SeqCst) >= self.options.queue_limit {
            if self.shared.closed.load(Ordering::SeqCst) || Instant::now() >= deadline {
                return false;
            }

            thread::sleep(Duration::from_millis(1));
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::completion::Completion;
    use crate::error::{WriteError, WriteResult};
    use crate::record::{Record, RecordBuf};
    use crate::target::Target;

    use super::{DispatchOptions, Dispatcher, Overflow};

    struct MockTarget {
        written: Arc<AtomicUsize>,
        flushed: Arc<AtomicUsize>,
    }

    impl MockTarget {
        fn new() -> (MockTarget, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let written = Arc::new(AtomicUsize::new(0));
            let flushed = Arc::new(AtomicUsize::new(0));

            let target = MockTarget {
                written: written.clone(),
                flushed: flushed.clone(),
            };

            (target, written, flushed)
        }
    }

    impl Target for MockTarget {
        fn write(&mut self, rec: &Record) -> WriteResult {
            if rec.message() == "boom" {
                panic!("boom");
            }

            self.written.fetch_add(1, Ordering::SeqCst);

            Ok(())
        }

        fn flush(&mut self) -> WriteResult {
            self.flushed.fetch_add(1, Ordering::SeqCst);

            Ok(())
        }
    }

    fn buf(message: &str) -> RecordBuf {
        RecordBuf::from(&Record::new(0, message))
    }

    #[test]
    fn record_is_delivered_and_resolved() {
        let (target, written, _) = MockTarget::new();
        let dispatcher = Dispatcher::new(Box::new(target), DispatchOptions::default());

        let (completion, rx) = Completion::pair();
        dispatcher.write(buf("le message"), completion);

        assert!(rx.recv().unwrap().is_ok());
        assert_eq!(1, written.load(Ordering::SeqCst));
    }

    #[test]
    fn write_after_shutdown_reports_closed() {
        let (target, written, _) = MockTarget::new();
        let dispatcher = Dispatcher::new(Box::new(target), DispatchOptions::default());

        dispatcher.shutdown();

        let (completion, rx) = Completion::pair();
        dispatcher.write(buf("too late"), completion);

        assert!(matches!(rx.recv().unwrap(), Err(WriteError::Closed)));
        assert_eq!(0, written.load(Ordering::SeqCst));
    }

    #[test]
    fn flush_reaches_the_target() {
        let (target, _, flushed) = MockTarget::new();
        let dispatcher = Dispatcher::new(Box::new(target), DispatchOptions::default());

        let (completion, rx) = Completion::pair();
        dispatcher.flush(completion);

        assert!(rx.recv().unwrap().is_ok());
        assert_eq!(1, flushed.load(Ordering::SeqCst));
    }

    #[test]
    fn panicking_target_fails_the_record_not_the_pool() {
        let (target, written, _) = MockTarget::new();
        let dispatcher = Dispatcher::new(Box::new(target), DispatchOptions::default());

        let (completion, rx) = Completion::pair();
        dispatcher.write(buf("boom"), completion);
        assert!(rx.recv().unwrap().is_err());

        let (completion, rx) = Completion::pair();
        dispatcher.write(buf("still alive"), completion);
        assert!(rx.recv().unwrap().is_ok());

        assert_eq!(1, written.load(Ordering::SeqCst));
    }

    #[test]
    fn discard_policy_rejects_overflow() {
        let (target, written, _) = MockTarget::new();
        let dispatcher = Dispatcher::new(Box::new(target), DispatchOptions {
            queue_limit: 0,
            overflow: Overflow::Discard,
            ..DispatchOptions::default()
        });

        let (completion, rx) = Completion::pair();
        dispatcher.write(buf("overboard"), completion);

        assert!(matches!(rx.recv().unwrap(), Err(WriteError::Discarded)));
        assert_eq!(0, written.load(Ordering::SeqCst));
    }

    #[test]
    fn unordered_pool_delivers_everything() {
        let (target, written, _) = MockTarget::new();
        let dispatcher = Dispatcher::new(Box::new(target), DispatchOptions {
            ordered: false,
            workers: 4,
            ..DispatchOptions::default()
        });

        let receivers: Vec<_> = (0..100)
            .map(|i| {
                let (completion, rx) = Completion::pair();
                dispatcher.write(buf(&format!("#{}", i)), completion);
                rx
            })
            .collect();

        for rx in receivers {
            assert!(rx.recv().unwrap().is_ok());
        }

        assert_eq!(100, written.load(Ordering::SeqCst));
    }
}
