//! Shared data models for the shorts generation backend.
//!
//! This crate provides Serde-serializable types for:
//! - The validated content brief (`ShortRequest`)
//! - Narrative plans and beats
//! - Generated media and final artifacts
//! - Pipeline log entries and the final result
//! - Encoding configuration for vertical output

pub mod artifact;
pub mod encoding;
pub mod log;
pub mod media;
pub mod plan;
pub mod request;
pub mod result;

// Re-export common types
pub use artifact::{AssembledVideo, ContainerDescriptor, PublishResult, Thumbnail};
pub use encoding::EncodingConfig;
pub use log::{PipelineLogEntry, PipelineStep};
pub use media::{BeatMedia, NarrationAudio, VisualAsset};
pub use plan::{BeatId, ContentPlan, PlanBeat};
pub use request::{ShortRequest, MAX_DURATION_SECONDS, MIN_DURATION_SECONDS};
pub use result::PipelineResult;
