// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The process-wide log sink, and the access log of requests.
//!
//! Everything in the crate logs through the macros of the `log` crate. The binary installs a
//! [`Logger`](struct.Logger.html) once at startup; it writes each record to the standard error
//! and appends it to a log file:
//!
//! ```text
//! 2024-03-01 12:30:05,042 - INFO - Successfully saved file: photo.png to incoming/photo.png
//! ```

use std::fmt;
use std::fmt::Write as FmtWrite;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use ::log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use chrono::{Local, NaiveDateTime};

use crate::Request;
use crate::Response;

/// Target of the records emitted by [`LogEntry`](struct.LogEntry.html).
pub const ACCESS_TARGET: &str = "filedrop::access";

/// A `log::Log` implementation writing timestamped lines to stderr and to an optional file.
pub struct Logger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl Logger {
    /// Builds a logger that only writes to the standard error.
    pub fn new(level: LevelFilter) -> Logger {
        Logger {
            level,
            file: None,
        }
    }

    /// Also appends every record to the file at `path`, creating it if needed.
    pub fn with_file<P>(mut self, path: P) -> io::Result<Logger> where P: AsRef<Path> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.file = Some(Mutex::new(file));
        Ok(self)
    }

    /// Installs this logger as the process-wide sink.
    ///
    /// Fails if a logger was already installed.
    pub fn init(self) -> Result<(), SetLoggerError> {
        ::log::set_max_level(self.level);
        ::log::set_boxed_logger(Box::new(self))
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(&Local::now().naive_local(), record.level(), record.args());
        eprintln!("{}", line);

        if let Some(ref file) = self.file {
            // A poisoned lock only means another thread panicked mid-write.
            let mut file = match file.lock() {
                Ok(f) => f,
                Err(poisoned) => poisoned.into_inner(),
            };
            let _ = writeln!(file, "{}", line);
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Formats a log line as `YYYY-MM-DD HH:MM:SS,mmm - LEVEL - message`.
pub fn format_line(time: &NaiveDateTime, level: Level, args: &fmt::Arguments) -> String {
    format!("{} - {} - {}", time.format("%Y-%m-%d %H:%M:%S,%3f"), level, args)
}

/// RAII guard that ensures that an access log entry corresponding to a request will be written.
///
/// The entry is emitted at the `info` level under the `filedrop::access` target when the guard is
/// dropped. If the thread is panicking at that moment, the entry says so instead of giving a status.
pub struct LogEntry {
    line: String,
    status: Option<u16>,
    start_time: Instant,
}

impl LogEntry {
    /// Starts a `LogEntry`.
    pub fn start(rq: &Request) -> LogEntry {
        LogEntry {
            line: format!("{} {}", rq.method(), rq.raw_url()),
            status: None,
            start_time: Instant::now(),
        }
    }

    /// Records the status code that was sent back.
    #[inline]
    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }
}

impl Drop for LogEntry {
    fn drop(&mut self) {
        let mut line = self.line.clone();

        if thread::panicking() {
            line.push_str(" - PANIC!");
        } else {
            if let Some(status) = self.status {
                let _ = write!(line, " - {}", status);
            }
            line.push_str(" - ");
            format_time(&mut line, self.start_time.elapsed());
        }

        ::log::info!(target: ACCESS_TARGET, "{}", line);
    }
}

/// Calls `f` and writes an access log entry for `rq` once it returns.
///
/// # Example
///
/// ```
/// use filedrop::{Request, Response};
///
/// let request = Request::fake_http("GET", "/", vec![], vec![]);
/// let response = filedrop::log::log(&request, || Response::text("hello world"));
/// assert_eq!(response.status_code, 200);
/// ```
pub fn log<F>(rq: &Request, f: F) -> Response where F: FnOnce() -> Response {
    let mut entry = LogEntry::start(rq);
    let response = f();
    entry.set_status(response.status_code);
    response
}

fn format_time(out: &mut String, duration: Duration) {
    let secs_part = match duration.as_secs().checked_mul(1_000_000_000) {
        Some(v) => v,
        None => {
            let _ = write!(out, "{}s", duration.as_secs() as f64);
            return;
        }
    };

    let duration_in_ns = secs_part + duration.subsec_nanos() as u64;

    let _ = if duration_in_ns < 1_000 {
        write!(out, "{}ns", duration_in_ns)
    } else if duration_in_ns < 1_000_000 {
        write!(out, "{:.1}us", duration_in_ns as f64 / 1_000.0)
    } else if duration_in_ns < 1_000_000_000 {
        write!(out, "{:.1}ms", duration_in_ns as f64 / 1_000_000.0)
    } else {
        write!(out, "{:.1}s", duration_in_ns as f64 / 1_000_000_000.0)
    };
}
