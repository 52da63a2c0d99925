use crate::stats::{record_frame_stats, stop_after_budget, FrameBudget, RunStats};
use bevy::{
    diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin},
    prelude::*,
};
use bevy_app::ScheduleRunnerPlugin;
use sim::{SimulationConfig, SimulationPlugin, SimulationSet};
use std::time::Duration;

/// Builds the headless app without running it.
pub fn build_app(config: SimulationConfig, frames: Option<u64>, frames_per_second: f64) -> App {
    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / frames_per_second,
        ))),
    );

    app.insert_resource(config);
    app.insert_resource(FrameBudget(frames));
    app.init_resource::<RunStats>();

    app.add_plugins(SimulationPlugin);
    app.add_systems(
        PostUpdate,
        (record_frame_stats, stop_after_budget)
            .chain()
            .after(SimulationSet::Commit),
    );

    app
}

pub fn init(config: SimulationConfig, frames: Option<u64>, frames_per_second: f64) -> AppExit {
    let swimmers = config.school.swimmer_count;
    let mut app = build_app(config, frames, frames_per_second);

    app.add_plugins(FrameTimeDiagnosticsPlugin::default());
    app.add_plugins(LogDiagnosticsPlugin::default());
    app.add_plugins(bevy::log::LogPlugin::default());

    info!(
        "Starting headless simulation: {} swimmers at {} frames per second",
        swimmers, frames_per_second
    );

    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim::{LastFrameReport, SaltSource};

    #[test]
    fn test_budget_stops_app() {
        let mut config = SimulationConfig::default();
        config.school.swimmer_count = 20;
        config.surface.resolution = 4;
        config.salt = SaltSource::Fixed(0);
        let mut app = build_app(config, Some(2), 60.0);

        app.update();
        assert!(app.should_exit().is_none());
        app.update();

        assert_eq!(app.world().resource::<RunStats>().frames, 2);
        assert_eq!(
            app.world()
                .resource::<LastFrameReport>()
                .0
                .as_ref()
                .map(|report| report.frame),
            Some(2)
        );
        assert_eq!(app.should_exit(), Some(AppExit::Success));
    }
}
