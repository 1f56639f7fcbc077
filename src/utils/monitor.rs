#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

/// One reading of this process, taken at a named phase of a broadcast run.
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseSample {
    pub cpu_usage: f32,
    pub resident_mb: u64,
    pub peak_mb: u64,
    /// Resident memory above the reading taken when the monitor was created.
    pub growth_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Readings {
    system: System,
    baseline_mb: u64,
    peak_mb: u64,
}

/// Tracks process memory across the phases of a broadcast so the peak can be
/// reported next to the chunk buffer bound.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    readings: Option<Mutex<Readings>>,
    pid: Option<Pid>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() && enabled {
            tracing::warn!("Could not determine current PID, system stats disabled");
        }

        let readings = (enabled && pid.is_some()).then(|| {
            let mut system = System::new_with_specifics(RefreshKind::everything());
            system.refresh_all();
            let baseline_mb = pid
                .and_then(|pid| system.process(pid))
                .map(|process| process.memory() / 1024 / 1024)
                .unwrap_or(0);
            Mutex::new(Readings {
                system,
                baseline_mb,
                peak_mb: baseline_mb,
            })
        });

        Self {
            readings,
            pid,
            started: Instant::now(),
        }
    }

    pub fn sample(&self) -> Option<PhaseSample> {
        let mut readings = self.readings.as_ref()?.lock().ok()?;
        readings.system.refresh_all();

        let process = readings.system.process(self.pid?)?;
        let resident_mb = process.memory() / 1024 / 1024;
        let cpu_usage = process.cpu_usage();

        readings.peak_mb = readings.peak_mb.max(resident_mb);

        Some(PhaseSample {
            cpu_usage,
            resident_mb,
            peak_mb: readings.peak_mb,
            growth_mb: resident_mb.saturating_sub(readings.baseline_mb),
            elapsed: self.started.elapsed(),
        })
    }

    /// Logs a reading for `phase`; `payload_bytes` is the broadcast data live at that point.
    pub fn record_phase(&self, phase: &str, payload_bytes: usize) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB (+{}MB), Peak: {}MB, Payload: {} bytes, Time: {:?}",
                phase,
                sample.cpu_usage,
                sample.resident_mb,
                sample.growth_mb,
                sample.peak_mb,
                payload_bytes,
                sample.elapsed
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                sample.elapsed,
                sample.peak_mb
            );
        }
    }

    pub fn peak_memory_mb(&self) -> Option<u64> {
        self.sample().map(|sample| sample.peak_mb)
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn record_phase(&self, _phase: &str, _payload_bytes: usize) {}

    pub fn log_final_stats(&self) {}

    pub fn peak_memory_mb(&self) -> Option<u64> {
        None
    }
}
