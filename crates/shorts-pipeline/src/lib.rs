//! Shorts generation pipeline.
//!
//! This crate provides:
//! - Plan generation and validation
//! - Bounded-concurrency beat media generation with graceful degradation
//! - Video assembly in plan order
//! - Thumbnail generation with a placeholder fallback
//! - Optional publishing
//! - A per-run, append-only pipeline log

pub mod assembler;
pub mod beat_media;
pub mod config;
pub mod error;
pub mod log;
pub mod metrics;
pub mod orchestrator;
pub mod planner;
pub mod publisher;
pub mod retry;
pub mod thumbnail;

pub use assembler::VideoAssembler;
pub use beat_media::BeatMediaGenerator;
pub use config::{PipelineConfig, ThumbnailMode};
pub use error::{PipelineError, PipelineFailure, StageResult};
pub use log::PipelineLog;
pub use orchestrator::{Capabilities, PipelineOrchestrator};
pub use planner::{PlanGenerator, PlanRules};
pub use publisher::Publisher;
pub use retry::{retry_async, RetryConfig, RetryResult, Retryable};
pub use thumbnail::ThumbnailGenerator;
