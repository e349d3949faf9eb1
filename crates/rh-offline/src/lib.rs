//! rh-offline: offline enhancement, stem separation and PCM export
//!
//! Renders whole decoded signals, never streams:
//! - Genre-matched enhancement through a fixed seven-stage chain
//! - Four-stem separation by channel algebra and filtering
//! - 16-bit PCM WAV encoding
//! - Parallel batch rendering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        EnhancementPipeline                           │
//! │                                                                      │
//! │  Signal → NoiseFloor → GenreEq → Compression → Saturation →          │
//! │           StereoWidening → CodecShaping → Limiter → Signal           │
//! │                                                                      │
//! │  failing stage → bypass + StageWarning, render continues             │
//! └──────────────────────────────────────────────────────────────────────┘
//!
//! ┌──────────────────────┐   ┌──────────────┐   ┌──────────────────────┐
//! │   SeparationEngine   │   │  PcmEncoder  │   │    BatchRenderer     │
//! │ vocals / instruments │   │ 44-byte RIFF │   │ rayon pool, one job  │
//! │ drums / bass         │   │ + i16 data   │   │ per render context   │
//! └──────────────────────┘   └──────────────┘   └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rh_offline::{EnhancementPipeline, EnhancementRequest, PcmEncoder};
//!
//! let pipeline = EnhancementPipeline::default();
//! let request = EnhancementRequest::new(7, "rock");
//! let enhanced = pipeline.enhance(&signal, &request)?;
//! let wav = PcmEncoder::encode(&enhanced);
//! ```

mod batch;
mod config;
mod context;
mod encoder;
mod error;
mod genre;
mod pipeline;
mod progress;
mod request;
mod separation;
mod stages;

pub use batch::*;
pub use config::*;
pub use context::*;
pub use encoder::*;
pub use error::*;
pub use genre::*;
pub use pipeline::*;
pub use progress::*;
pub use request::*;
pub use separation::*;
pub use stages::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
