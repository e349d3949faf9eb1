//! Render requests

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OfflineError, OfflineResult};

// ═══════════════════════════════════════════════════════════════════════════════
// ENHANCEMENT LEVEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Enhancement intensity, 1 (subtle) to 10 (aggressive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnhancementLevel(u8);

impl EnhancementLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const DEFAULT: u8 = 7;

    /// Clamp `level` into range, warning when it had to be moved
    pub fn new(level: u8) -> Self {
        let clamped = level.clamp(Self::MIN, Self::MAX);
        if clamped != level {
            log::warn!(
                "enhancement level {} out of range, using {}",
                level,
                clamped
            );
        }
        Self(clamped)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Nearest named preset at or below this level
    pub fn preset(self) -> &'static LevelPreset {
        LEVEL_PRESETS
            .iter()
            .rev()
            .find(|p| p.level <= self.0)
            .unwrap_or(&LEVEL_PRESETS[0])
    }
}

impl Default for EnhancementLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Named enhancement preset shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPreset {
    pub level: u8,
    pub name: &'static str,
    pub description: &'static str,
}

pub const LEVEL_PRESETS: [LevelPreset; 4] = [
    LevelPreset {
        level: 1,
        name: "Subtle Touch",
        description: "Light enhancement preserving original character",
    },
    LevelPreset {
        level: 5,
        name: "Balanced Pro",
        description: "Professional quality with natural sound",
    },
    LevelPreset {
        level: 7,
        name: "Radio Ready",
        description: "Commercial broadcast standard",
    },
    LevelPreset {
        level: 10,
        name: "Maximum Impact",
        description: "Aggressive transformation for maximum quality",
    },
];

// ═══════════════════════════════════════════════════════════════════════════════
// CODEC PROFILE
// ═══════════════════════════════════════════════════════════════════════════════

/// Final tonal shaping applied before the limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecProfile {
    /// 20 Hz high-pass
    #[serde(alias = "dolby-atmos")]
    SpatialWide,
    /// +1 dB presence bump at 1 kHz
    #[default]
    #[serde(alias = "dolby-digital-plus")]
    EnhancedStereo,
    /// Phase-only all-pass
    #[serde(alias = "dolby-truehd")]
    Lossless,
    StandardStereo,
}

impl CodecProfile {
    pub const ALL: [CodecProfile; 4] = [
        Self::SpatialWide,
        Self::EnhancedStereo,
        Self::Lossless,
        Self::StandardStereo,
    ];

    /// Resolve an id, including legacy ids. Unknown ids map to `StandardStereo`.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "spatial-wide" | "dolby-atmos" => Self::SpatialWide,
            "enhanced-stereo" | "dolby-digital-plus" => Self::EnhancedStereo,
            "lossless" | "dolby-truehd" => Self::Lossless,
            "standard-stereo" => Self::StandardStereo,
            other => {
                log::debug!("unknown codec profile '{}', using standard-stereo", other);
                Self::StandardStereo
            }
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::SpatialWide => "spatial-wide",
            Self::EnhancedStereo => "enhanced-stereo",
            Self::Lossless => "lossless",
            Self::StandardStereo => "standard-stereo",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SpatialWide => "Spatial Wide",
            Self::EnhancedStereo => "Enhanced Stereo",
            Self::Lossless => "Lossless",
            Self::StandardStereo => "Standard Stereo",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameters for one enhancement render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementRequest {
    /// 1..=10; out-of-range values are clamped at render time
    pub level: u8,
    /// Genre name; unknown names use the pop profile
    pub genre: String,
    /// Accepted and carried through; does not change any stage
    pub preserve_melody: bool,
    pub codec_profile: CodecProfile,
}

impl Default for EnhancementRequest {
    fn default() -> Self {
        Self {
            level: EnhancementLevel::DEFAULT,
            genre: "pop".to_string(),
            preserve_melody: true,
            codec_profile: CodecProfile::default(),
        }
    }
}

impl EnhancementRequest {
    pub fn new(level: u8, genre: impl Into<String>) -> Self {
        Self {
            level,
            genre: genre.into(),
            ..Default::default()
        }
    }

    pub fn with_codec(mut self, codec_profile: CodecProfile) -> Self {
        self.codec_profile = codec_profile;
        self
    }

    pub fn with_preserve_melody(mut self, preserve: bool) -> Self {
        self.preserve_melody = preserve;
        self
    }

    /// Validated level
    pub fn level(&self) -> EnhancementLevel {
        EnhancementLevel::new(self.level)
    }

    pub fn from_json(json: &str) -> OfflineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| OfflineError::InvalidInput(format!("bad enhancement request: {}", e)))
    }

    pub fn to_json(&self) -> OfflineResult<String> {
        serde_json::to_string(self).map_err(|e| OfflineError::Encoding(e.to_string()))
    }
}

/// Parameters for stem separation (currently none)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparationRequest {}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT NAMING
// ═══════════════════════════════════════════════════════════════════════════════

/// File stem of a source name, `"audio"` when there is none
pub(crate) fn source_stem(source: &str) -> &str {
    Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("audio")
}

/// `enhanced_<source>.wav`
pub fn output_file_name(source: &str) -> String {
    format!("enhanced_{}.wav", source_stem(source))
}
