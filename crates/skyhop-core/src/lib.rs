//! # Skyhop Core
//!
//! Core runtime library for the Skyhop simulation loop.
//!
//! This crate provides the foundational pieces shared by every other crate:
//! - **Scene Graph**: Hierarchical visual nodes with tags, box geometry and ray queries
//! - **Math**: glam re-exports plus rays and bounding volumes
//! - **Time**: Frame clock producing per-frame delta and elapsed time

pub mod math;
pub mod scene;
pub mod time;

pub use scene::{Geometry, NodeId, NodeTag, RayHit, SceneGraph, Transform, VisualNode};
pub use time::{DeltaTime, FrameClock, Stopwatch};

use thiserror::Error;

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Parenting {child} under {parent} would create a cycle")]
    ParentCycle { child: NodeId, parent: NodeId },
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
