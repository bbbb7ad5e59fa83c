//! Core types and traits for the voice-clone job service.
//!
//! Request/response DTOs keep the field names of the public HTTP API
//! (`audio_id`, `video_id`, ...) so existing clients keep working.

mod dto;
mod job;
mod traits;

pub use dto::*;
pub use job::*;
pub use traits::*;
