//! Progress observers.

use log;

/// Progress observer interface. The sorter calls into it at phase boundaries,
/// periodically during long-running phases and after each phase with a memory usage snapshot.
pub trait ProgressObserver: Send + Sync {
    /// Logs a phase-level message.
    fn log(&self, message: &str);

    /// Reports progress of the current phase as a `current / total` fraction.
    fn report_progress(&self, current: u64, total: u64);

    /// Reports a free-form progress message.
    fn report_status(&self, message: &str);
}

/// Observer forwarding everything to the [`log`] facade at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn log(&self, message: &str) {
        log::info!("{}", message);
    }

    fn report_progress(&self, current: u64, total: u64) {
        log::info!("{:.2}%", percentage(current, total));
    }

    fn report_status(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Observer ignoring all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn log(&self, _message: &str) {}

    fn report_progress(&self, _current: u64, _total: u64) {}

    fn report_status(&self, _message: &str) {}
}

/// Converts a progress fraction to percents. Zero `total` is reported as complete.
pub fn percentage(current: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        100.0 * current as f64 / total as f64
    }
}

/// Logs current process memory usage through the observer.
#[cfg(feature = "memory-stats")]
pub fn report_memory_usage(observer: &dyn ProgressObserver) {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    const BYTES_PER_MB: u64 = 1024 * 1024;

    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);

    match system.process(pid) {
        Some(process) => observer.log(&format!(
            "{} MB resident | {} MB virtual",
            process.memory() / BYTES_PER_MB,
            process.virtual_memory() / BYTES_PER_MB
        )),
        None => log::warn!("current process memory usage is not available"),
    }
}

/// Logs current process memory usage through the observer (requires `memory-stats` feature).
#[cfg(not(feature = "memory-stats"))]
pub fn report_memory_usage(_observer: &dyn ProgressObserver) {
    log::trace!("memory usage reporting disabled");
}

/// Observer recording every notification, used in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    pub messages: std::sync::Mutex<Vec<String>>,
    pub progress: std::sync::Mutex<Vec<(u64, u64)>>,
    pub statuses: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ProgressObserver for RecordingObserver {
    fn log(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }

    fn report_progress(&self, current: u64, total: u64) {
        self.progress.lock().unwrap().push((current, total));
    }

    fn report_status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_owned());
    }
}
