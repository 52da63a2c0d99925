//! Running totals over completed frames, logged periodically.

use bevy::prelude::*;
use bevy_ecs::resource::Resource;
use bevy_log::info;
use sim::{FrameReport, LastFrameReport, Simulation, STATS_INTERVAL_FRAMES};

/// Stops the app after a fixed number of completed frames.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameBudget(pub Option<u64>);

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub frames: u64,
    pub escaped_total: u64,
    pub faults_total: u64,
    pub last_frame: u64,
}

impl RunStats {
    /// Folds a report in, ignoring one already counted.
    pub fn record(&mut self, report: &FrameReport) -> bool {
        if report.frame <= self.last_frame {
            return false;
        }
        self.frames += 1;
        self.escaped_total += report.escaped as u64;
        self.faults_total += report.fault_count() as u64;
        self.last_frame = report.frame;
        true
    }

    pub fn mean_escaped(&self) -> f32 {
        if self.frames == 0 {
            0.0
        } else {
            self.escaped_total as f32 / self.frames as f32
        }
    }
}

/// Mean horizontal distance of the school from the bounds center.
pub fn mean_spread(simulation: &Simulation) -> Option<f32> {
    let center = simulation.0.config().school.bounds.center;
    let transforms = simulation.0.transforms()?;
    if transforms.is_empty() {
        return None;
    }
    let total: f32 = transforms
        .iter()
        .map(|transform| (transform.translation - center).xz().length())
        .sum();
    Some(total / transforms.len() as f32)
}

pub fn record_frame_stats(
    last_report: Res<LastFrameReport>,
    simulation: Option<Res<Simulation>>,
    mut stats: ResMut<RunStats>,
) {
    let Some(report) = last_report.0.as_ref() else {
        return;
    };
    if !stats.record(report) {
        return;
    }

    if stats.frames % STATS_INTERVAL_FRAMES == 0 {
        let spread = simulation.as_deref().and_then(mean_spread).unwrap_or(0.0);
        info!(
            "Frame {}: {} / {} swimmers outside bounds, mean spread {:.2}, {} / {} vertices displaced, {} faults so far",
            report.frame,
            report.escaped,
            report.swimmers,
            spread,
            report.displaced,
            report.vertices,
            stats.faults_total
        );
    }
}

pub fn stop_after_budget(
    budget: Res<FrameBudget>,
    stats: Res<RunStats>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(limit) = budget.0 else {
        return;
    };
    if stats.frames >= limit {
        info!(
            "Completed {} frames: mean {:.2} swimmers outside bounds per frame, {} faults",
            stats.frames,
            stats.mean_escaped(),
            stats.faults_total
        );
        exit.write(AppExit::Success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ignores_repeated_reports() {
        let mut stats = RunStats::default();
        let report = FrameReport {
            frame: 1,
            escaped: 4,
            ..Default::default()
        };

        assert!(stats.record(&report));
        assert!(!stats.record(&report));
        assert!(stats.record(&FrameReport {
            frame: 2,
            escaped: 2,
            ..Default::default()
        }));

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.escaped_total, 6);
        assert_eq!(stats.mean_escaped(), 3.0);
    }
}
