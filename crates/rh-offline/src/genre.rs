//! Genre EQ profiles
//!
//! A closed table mapping genre names to an ordered list of peaking bands.
//! The band order is the cascade order of the EQ stage.

use serde::Serialize;

/// One peaking EQ band
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EqBand {
    pub frequency_hz: f64,
    pub gain_db: f64,
    pub q: f64,
}

impl EqBand {
    pub const MIN_FREQ: f64 = 20.0;
    pub const MAX_FREQ: f64 = 20000.0;
    pub const MAX_GAIN_DB: f64 = 20.0;
    pub const MIN_Q: f64 = 0.1;
    pub const MAX_Q: f64 = 10.0;

    pub const fn new(frequency_hz: f64, gain_db: f64, q: f64) -> Self {
        Self {
            frequency_hz,
            gain_db,
            q,
        }
    }

    /// Band with every parameter clamped into its usable range
    pub fn clamped(&self) -> Self {
        Self {
            frequency_hz: self.frequency_hz.clamp(Self::MIN_FREQ, Self::MAX_FREQ),
            gain_db: self.gain_db.clamp(-Self::MAX_GAIN_DB, Self::MAX_GAIN_DB),
            q: self.q.clamp(Self::MIN_Q, Self::MAX_Q),
        }
    }
}

/// Named, ordered band list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenreProfile {
    pub name: &'static str,
    pub bands: &'static [EqBand],
}

const fn band(frequency_hz: f64, gain_db: f64, q: f64) -> EqBand {
    EqBand::new(frequency_hz, gain_db, q)
}

const PROFILES: [GenreProfile; 7] = [
    GenreProfile {
        name: "rock",
        bands: &[
            band(80.0, 2.0, 1.5),
            band(1000.0, -1.0, 0.7),
            band(3000.0, 3.0, 1.2),
            band(10000.0, 2.0, 1.0),
        ],
    },
    GenreProfile {
        name: "rap",
        bands: &[
            band(60.0, 4.0, 1.8),
            band(200.0, -2.0, 0.8),
            band(2500.0, 2.0, 1.0),
            band(8000.0, 3.0, 1.5),
        ],
    },
    GenreProfile {
        name: "pop",
        bands: &[
            band(100.0, 1.0, 1.0),
            band(800.0, -1.0, 0.5),
            band(3000.0, 2.0, 1.0),
            band(12000.0, 2.0, 1.2),
        ],
    },
    GenreProfile {
        name: "punk",
        bands: &[
            band(100.0, 3.0, 1.2),
            band(500.0, -2.0, 0.8),
            band(2000.0, 4.0, 1.5),
            band(8000.0, 3.0, 1.0),
        ],
    },
    GenreProfile {
        name: "heavy metal",
        bands: &[
            band(80.0, 4.0, 1.8),
            band(400.0, -3.0, 0.7),
            band(2500.0, 5.0, 1.2),
            band(10000.0, 3.0, 1.0),
        ],
    },
    GenreProfile {
        name: "trap",
        bands: &[
            band(50.0, 6.0, 2.0),
            band(150.0, -1.0, 0.8),
            band(3000.0, 2.0, 1.0),
            band(12000.0, 4.0, 1.5),
        ],
    },
    GenreProfile {
        name: "acoustic",
        bands: &[
            band(100.0, 1.0, 0.8),
            band(1000.0, 0.0, 0.5),
            band(5000.0, 2.0, 1.0),
            band(15000.0, 1.0, 1.2),
        ],
    },
];

/// Index of the fallback profile in `PROFILES`
const FALLBACK: usize = 2;

/// Genre names as presented to users. Names without a dedicated
/// profile render with the pop curve.
pub const GENRE_CATALOGUE: [&str; 12] = [
    "Rock",
    "Rap",
    "Pop",
    "Punk",
    "Heavy Metal",
    "Emo Rap",
    "Emo Punk",
    "Gothic Rap",
    "Trap",
    "Benny Blanco Style",
    "Ed Sheeran Style",
    "Acoustic",
];

/// Static genre lookup
pub struct GenreProfileTable;

impl GenreProfileTable {
    /// Case-insensitive lookup; unknown names fall back to pop
    pub fn lookup(name: &str) -> GenreProfile {
        Self::find(name).unwrap_or_else(|| {
            log::debug!("no profile for genre '{}', using pop", name);
            PROFILES[FALLBACK]
        })
    }

    /// Whether `name` has a dedicated profile
    pub fn is_known(name: &str) -> bool {
        Self::find(name).is_some()
    }

    /// Names with a dedicated profile, in table order
    pub fn known_genres() -> impl Iterator<Item = &'static str> {
        PROFILES.iter().map(|p| p.name)
    }

    pub fn fallback() -> GenreProfile {
        PROFILES[FALLBACK]
    }

    fn find(name: &str) -> Option<GenreProfile> {
        let key = name.trim().to_lowercase();
        PROFILES.iter().find(|p| p.name == key).copied()
    }
}
