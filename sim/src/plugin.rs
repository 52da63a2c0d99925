//! Bevy plugin wiring the orchestrator into an app schedule.

use bevy::prelude::*;
use bevy_log::{debug, error, warn};

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::mesh::WaterMesh;
use crate::orchestrator::{FrameClock, FrameOrchestrator, FrameReport};
use crate::sets::SimulationSet;
use crate::spawn::scatter;

/// Marks a swimmer entity with its slot in the simulation buffers.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swimmer {
    pub index: usize,
}

#[derive(Resource)]
pub struct Simulation(pub FrameOrchestrator);

/// Report of the most recently completed frame.
#[derive(Resource, Debug, Default)]
pub struct LastFrameReport(pub Option<FrameReport>);

/// Adds the simulation to an app.
///
/// This plugin:
/// - Builds the orchestrator and spawns one entity per swimmer at startup
/// - Dispatches both jobs during `Update`
/// - Joins them in `PostUpdate`, before anything reads swimmer transforms
///
/// Insert a [`SimulationConfig`] before adding the plugin to override the defaults.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>()
            .init_resource::<LastFrameReport>()
            .add_systems(Startup, setup_simulation)
            .add_systems(Update, dispatch_frame.in_set(SimulationSet::Dispatch))
            .add_systems(
                PostUpdate,
                (complete_frame, sync_swimmer_transforms)
                    .chain()
                    .in_set(SimulationSet::Commit),
            );
    }
}

fn setup_simulation(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    mut exit: EventWriter<AppExit>,
) {
    let transforms = scatter(&config.school);
    let mesh = WaterMesh::grid(config.surface.resolution, config.surface.size);

    let orchestrator = match FrameOrchestrator::init(config.clone(), transforms, mesh) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            error!("Failed to initialize simulation: {}", err);
            exit.write(AppExit::error());
            return;
        }
    };

    if let Some(transforms) = orchestrator.transforms() {
        commands.spawn_batch(
            transforms
                .iter()
                .enumerate()
                .map(|(index, transform)| (Swimmer { index }, *transform))
                .collect::<Vec<_>>(),
        );
    }

    commands.insert_resource(Simulation(orchestrator));
}

fn dispatch_frame(simulation: Option<ResMut<Simulation>>, time: Res<Time>) {
    let Some(mut simulation) = simulation else {
        return;
    };

    let salt = simulation.0.config().salt.sample();
    let clock = FrameClock::new(time.elapsed_secs(), time.delta_secs(), salt);

    if let Err(err) = simulation.0.dispatch(clock) {
        warn!("Skipping frame dispatch: {}", err);
    }
}

fn complete_frame(
    simulation: Option<ResMut<Simulation>>,
    mut last_report: ResMut<LastFrameReport>,
) {
    let Some(mut simulation) = simulation else {
        return;
    };

    match simulation.0.complete() {
        Ok(report) => last_report.0 = Some(report),
        Err(SimError::NoFrameInFlight) => debug!("No frame to complete"),
        Err(err) => error!("Frame completion failed: {}", err),
    }
}

/// Copies the committed buffer transforms onto the swimmer entities.
fn sync_swimmer_transforms(
    simulation: Option<Res<Simulation>>,
    mut swimmers: Query<(&Swimmer, &mut Transform)>,
) {
    let Some(transforms) = simulation.as_ref().and_then(|s| s.0.transforms()) else {
        return;
    };

    swimmers.par_iter_mut().for_each(|(swimmer, mut transform)| {
        if let Some(committed) = transforms.get(swimmer.index) {
            *transform = *committed;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SaltSource;
    use bevy::app::{TaskPoolOptions, TaskPoolPlugin};
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn test_app(config: SimulationConfig) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(config);
        app.add_plugins(SimulationPlugin);
        app
    }

    #[test]
    fn test_plugin_runs_frames_and_syncs_entities() {
        let mut config = SimulationConfig::default();
        config.school.swimmer_count = 50;
        config.surface.resolution = 8;
        config.salt = SaltSource::Fixed(1);
        let mut app = test_app(config);

        for _ in 0..3 {
            app.update();
        }

        let report = app.world().resource::<LastFrameReport>().0.clone().unwrap();
        assert_eq!(report.frame, 3);
        assert_eq!(report.swimmers, 50);
        assert_eq!(report.vertices, 81);

        let committed = app
            .world()
            .resource::<Simulation>()
            .0
            .transforms()
            .unwrap()
            .to_vec();
        let mut query = app.world_mut().query::<(&Swimmer, &Transform)>();
        let mut seen = 0;
        for (swimmer, transform) in query.iter(app.world()) {
            assert_eq!(*transform, committed[swimmer.index]);
            seen += 1;
        }
        assert_eq!(seen, 50);
    }

    #[test]
    fn test_invalid_config_requests_exit() {
        let mut config = SimulationConfig::default();
        config.school.swimmer_count = 0;
        let mut app = test_app(config);

        app.update();

        assert!(app.world().get_resource::<Simulation>().is_none());
        assert!(app.should_exit().is_some());
    }

    #[test]
    fn test_frames_keep_completing_on_single_thread_pools() {
        let mut config = SimulationConfig::default();
        config.school.swimmer_count = 300;
        config.school.batch_size = 16;
        config.waves.batch_size = 16;
        config.surface.resolution = 12;
        config.salt = SaltSource::Fixed(5);

        let mut app = App::new();
        app.add_plugins(MinimalPlugins.set(TaskPoolPlugin {
            task_pool_options: TaskPoolOptions::with_num_threads(1),
        }));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)));
        app.insert_resource(config);
        app.add_plugins(SimulationPlugin);

        let start = {
            app.update();
            app.world()
                .resource::<Simulation>()
                .0
                .transforms()
                .unwrap()
                .to_vec()
        };
        for _ in 1..60 {
            app.update();
        }

        let report = app.world().resource::<LastFrameReport>().0.clone().unwrap();
        assert_eq!(report.frame, 60);
        assert_eq!(report.swimmers, 300);
        assert_eq!(report.vertices, 13 * 13);
        assert_eq!(report.fault_count(), 0);

        let simulation = &app.world().resource::<Simulation>().0;
        assert!(!simulation.is_in_flight());
        assert_ne!(simulation.transforms().unwrap(), &start[..]);
    }
}
