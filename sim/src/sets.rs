use bevy::prelude::*;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Jobs for the current frame are started.
    Dispatch,
    /// Jobs are joined and their outputs committed.
    Commit,
}
