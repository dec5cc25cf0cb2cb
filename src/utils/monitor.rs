use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_usage_mb: Option<u64>,
}

/// Times each ETL phase and, with the `cli` feature, samples process memory.
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    phase_start: Instant,
    phases: Vec<PhaseStats>,
    peak_memory_mb: u64,
    #[cfg(feature = "cli")]
    system: Option<(System, Pid)>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        #[cfg(feature = "cli")]
        let system = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some((System::new(), pid)),
                Err(e) => {
                    tracing::warn!("Memory sampling disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let now = Instant::now();
        Self {
            enabled,
            start_time: now,
            phase_start: now,
            phases: Vec::new(),
            peak_memory_mb: 0,
            #[cfg(feature = "cli")]
            system,
        }
    }

    #[cfg(feature = "cli")]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        let (system, pid) = self.system.as_mut()?;
        system.refresh_all();
        let memory_mb = system.process(*pid)?.memory() / 1024 / 1024;
        Some(memory_mb)
    }

    #[cfg(not(feature = "cli"))]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        None
    }

    /// Closes the current phase and starts timing the next one.
    pub fn end_phase(&mut self, phase: &str) {
        if !self.enabled {
            return;
        }

        let memory_usage_mb = self.sample_memory_mb();
        if let Some(mb) = memory_usage_mb {
            self.peak_memory_mb = self.peak_memory_mb.max(mb);
        }

        let stats = PhaseStats {
            phase: phase.to_string(),
            elapsed: self.phase_start.elapsed(),
            memory_usage_mb,
        };

        match stats.memory_usage_mb {
            Some(mb) => tracing::info!(
                "📊 {} - Time: {:?}, Memory: {}MB, Peak: {}MB",
                stats.phase,
                stats.elapsed,
                mb,
                self.peak_memory_mb
            ),
            None => tracing::info!("📊 {} - Time: {:?}", stats.phase, stats.elapsed),
        }

        self.phases.push(stats);
        self.phase_start = Instant::now();
    }

    pub fn phases(&self) -> &[PhaseStats] {
        &self.phases
    }

    pub fn log_final_stats(&self) {
        if self.enabled {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                self.start_time.elapsed(),
                self.peak_memory_mb
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let mut monitor = RunMonitor::new(false);
        monitor.end_phase("extract");
        assert!(monitor.phases().is_empty());
    }

    #[test]
    fn test_enabled_monitor_records_phases_in_order() {
        let mut monitor = RunMonitor::new(true);
        monitor.end_phase("extract");
        monitor.end_phase("transform");

        let names: Vec<&str> = monitor.phases().iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(names, vec!["extract", "transform"]);
    }
}
