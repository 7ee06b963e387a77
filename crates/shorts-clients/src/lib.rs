//! Clients for the external services behind the shorts pipeline.
//!
//! The pipeline depends on the capability traits in [`traits`]; the
//! concrete HTTP clients here implement them:
//! - [`GeminiNarrative`]: narrative plans
//! - [`OpenAiImages`]: beat and thumbnail images
//! - [`ElevenLabsVoice`]: narration audio
//! - [`YouTubePublisher`]: uploads

pub mod config;
pub mod elevenlabs;
pub mod error;
pub mod gemini;
pub mod openai_images;
pub mod traits;
pub mod youtube;

pub use config::ClientsConfig;
pub use elevenlabs::ElevenLabsVoice;
pub use error::{ClientError, ClientResult};
pub use gemini::GeminiNarrative;
pub use openai_images::OpenAiImages;
pub use traits::{NarrativeService, PlanBrief, PublishMetadata, PublishPlatform, VisualService, VoiceService};
pub use youtube::YouTubePublisher;
