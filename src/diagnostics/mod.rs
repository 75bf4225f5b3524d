//! Process resource probes for scan reporting.
//!
//! Peak RSS comes from `/proc/self/status` on Linux; other platforms have
//! no equivalent cheap probe, so the query returns `None` and callers omit
//! the figure from their summaries.

/// Peak resident set size of this process, in bytes.
#[cfg(target_os = "linux")]
pub fn peak_rss_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        // VmHWM:      12345 kB
        if let Some(rest) = line.strip_prefix("VmHWM:") {
            let kb: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
pub fn peak_rss_bytes() -> Option<u64> {
    None
}

/// Peak RSS in mebibytes, for human-readable summaries.
pub fn peak_rss_mib() -> Option<f64> {
    peak_rss_bytes().map(|bytes| bytes as f64 / (1024.0 * 1024.0))
}
