//! This example demonstrates how to initialize the engine from a JSON file
//! and write some messages through the standard log macros.

use std::env;
use std::fs::File;

use log::{LevelFilter, Log};

use duralog::{LogBridge, Registry};

fn main() {
    let path = env::args()
        .nth(1)
        .expect("USAGE: config FILENAME");

    let cfg = serde_json::from_reader(File::open(&path).unwrap())
        .unwrap();

    let dispatcher = Registry::new()
        .dispatcher(&cfg)
        .expect("expect the dispatcher to be properly created");

    LogBridge::new(vec![dispatcher])
        .level(LevelFilter::Trace)
        .install()
        .expect("expect the bridge to install exactly once");

    log::debug!("{} {} HTTP/1.1 {} {}", "GET", "/static/image.png", 404, 347);
    log::info!("nginx/1.6 configured");
    log::warn!("client stopped connection before send body completed");
    log::error!("file does not exist: {}", "/var/www/favicon.ico");

    log::logger().flush();
}
