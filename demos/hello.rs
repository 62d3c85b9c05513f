//! Builds the delivery pipeline by hand: a file target behind an ordered
//! dispatcher, with a completion waiting on the last record.

use std::sync::Arc;

use duralog::target::FileTarget;
use duralog::{
    AppendOptions, Appender, CacheOptions, Completion, DispatchOptions, Dispatcher, FileCache,
    Record, RecordBuf,
};

fn main() {
    let cache = Arc::new(FileCache::new(CacheOptions::default()));
    let appender = Appender::new(cache, AppendOptions::default());

    let target = FileTarget::new("hello.log", appender);
    let dispatcher = Dispatcher::new(Box::new(target), DispatchOptions::default());

    for message in [
        "GET /static/image.png HTTP/1.1 404 347",
        "nginx/1.6 configured",
        "client stopped connection before send body completed",
    ] {
        dispatcher.write(RecordBuf::from(&Record::new(3, message)), Completion::noop());
    }

    let (completion, rx) = Completion::pair();
    dispatcher.write(
        RecordBuf::from(&Record::new(1, "file does not exist: /var/www/favicon.ico")),
        completion,
    );

    match rx.recv() {
        Ok(Ok(())) => println!("all records are on disk in hello.log"),
        Ok(Err(err)) => println!("delivery failed: {}", err),
        Err(..) => println!("the engine went away before answering"),
    }

    dispatcher.shutdown();
}
