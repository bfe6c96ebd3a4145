//! Progress reporting during compilation.
//!
//! Messages go to the `log` facade and, when one is supplied, to a caller
//! callback. Compilation works the same with or without a callback.

use log::{info, trace, warn};

/// Optional progress callback plus logging.
pub struct Status<'a> {
    sink: Option<&'a mut dyn FnMut(&str)>,
}

impl<'a> Status<'a> {
    pub fn new(sink: Option<&'a mut dyn FnMut(&str)>) -> Self {
        Self { sink }
    }

    /// A status that only logs.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self { sink: None }
    }

    /// A major compilation phase, such as `partition...`.
    pub fn phase(&mut self, message: &str) {
        info!("{message}");
        self.emit(message);
    }

    /// One routing decision of the partitioner.
    pub fn step(&mut self, message: &str) {
        trace!("{message}");
        self.emit(message);
    }

    /// Something the caller should look at: leaks, embedded entities.
    pub fn warn(&mut self, message: &str) {
        warn!("{message}");
        self.emit(message);
    }

    fn emit(&mut self, message: &str) {
        if let Some(sink) = self.sink.as_mut() {
            sink(message);
        }
    }
}
