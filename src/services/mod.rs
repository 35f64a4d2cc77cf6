// src/services/mod.rs
pub mod encoder;
pub mod generation;

pub use encoder::{ImageEncoder, TransportPayload};
pub use generation::{GenerationBackend, OpenAiBackend};
