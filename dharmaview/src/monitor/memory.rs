//! Memory usage probes.
//!
//! Memory sampling is best effort. Where the platform offers no usable
//! source the probe reports [`MonitoringUnavailable`] and the monitor keeps
//! running on FPS alone.

use std::fs;

use thiserror::Error;

/// The runtime has no memory source the monitor can read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("memory monitoring unavailable: {reason}")]
pub struct MonitoringUnavailable {
    pub reason: String,
}

impl MonitoringUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Source of memory usage samples.
pub trait MemoryProbe: Send + Sync {
    /// Current memory usage in bytes.
    fn sample(&self) -> Result<u64, MonitoringUnavailable>;
}

/// Resident set size of the current process, from `/proc/self/status`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessMemoryProbe;

const PROC_STATUS: &str = "/proc/self/status";

impl MemoryProbe for ProcessMemoryProbe {
    fn sample(&self) -> Result<u64, MonitoringUnavailable> {
        let status = fs::read_to_string(PROC_STATUS)
            .map_err(|e| MonitoringUnavailable::new(format!("{}: {}", PROC_STATUS, e)))?;
        parse_vm_rss(&status)
            .ok_or_else(|| MonitoringUnavailable::new(format!("no VmRSS line in {}", PROC_STATUS)))
    }
}

/// Probe for platforms or configurations without memory sampling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn sample(&self) -> Result<u64, MonitoringUnavailable> {
        Err(MonitoringUnavailable::new("memory sampling disabled"))
    }
}

/// Extract `VmRSS` in bytes from a `/proc/<pid>/status` document.
pub(crate) fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut parts = line["VmRSS:".len()..].split_whitespace();
    let value: u64 = parts.next()?.parse().ok()?;
    let multiplier = match parts.next() {
        Some("kB") | None => 1024,
        Some(_) => return None,
    };
    Some(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tdharmaview\nVmPeak:\t  300000 kB\nVmRSS:\t   51200 kB\nThreads:\t4\n";

    #[test]
    fn test_parse_vm_rss() {
        assert_eq!(parse_vm_rss(STATUS), Some(51_200 * 1024));
    }

    #[test]
    fn test_parse_vm_rss_missing() {
        assert_eq!(parse_vm_rss("Name:\tx\nThreads:\t1\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\tlots kB\n"), None);
    }

    #[test]
    fn test_no_memory_probe_is_unavailable() {
        let err = NoMemoryProbe.sample().unwrap_err();
        assert!(err.to_string().contains("memory monitoring unavailable"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_probe_reads_rss() {
        let rss = ProcessMemoryProbe.sample().expect("linux exposes /proc/self/status");
        assert!(rss > 0);
    }
}
