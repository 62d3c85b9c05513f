use log::Level;

pub trait Severity {
    /// Returns an integer severity representation.
    fn as_i32(&self) -> i32;
}

impl Severity for i32 {
    fn as_i32(&self) -> i32 {
        *self
    }
}

impl Severity for Level {
    fn as_i32(&self) -> i32 {
        match *self {
            Level::Error => 1,
            Level::Warn => 2,
            Level::Info => 3,
            Level::Debug => 4,
            Level::Trace => 5,
        }
    }
}
