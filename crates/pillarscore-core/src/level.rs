//! Four-band maturity levels derived from a pillar percentage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse classification of a pillar percentage.
///
/// Bands are inclusive-low / exclusive-high; the top band is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Below 35%.
    Initial,
    /// 35% to 54%.
    Developing,
    /// 55% to 74%.
    Structured,
    /// 75% and above.
    Advanced,
}

impl Level {
    /// All levels, lowest band first.
    pub const ALL: [Level; 4] = [
        Level::Initial,
        Level::Developing,
        Level::Structured,
        Level::Advanced,
    ];

    /// The display label stored in score results.
    pub fn label(self) -> &'static str {
        match self {
            Level::Initial => "Inicial",
            Level::Developing => "Em Desenvolvimento",
            Level::Structured => "Estruturado",
            Level::Advanced => "Avançado",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inicial" | "initial" => Ok(Level::Initial),
            "em desenvolvimento" | "developing" => Ok(Level::Developing),
            "estruturado" | "structured" => Ok(Level::Structured),
            "avançado" | "avancado" | "advanced" => Ok(Level::Advanced),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Map a percentage onto its level band.
pub fn classify_level(percentage: u32) -> Level {
    match percentage {
        0..=34 => Level::Initial,
        35..=54 => Level::Developing,
        55..=74 => Level::Structured,
        _ => Level::Advanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(classify_level(0), Level::Initial);
        assert_eq!(classify_level(34), Level::Initial);
        assert_eq!(classify_level(35), Level::Developing);
        assert_eq!(classify_level(54), Level::Developing);
        assert_eq!(classify_level(55), Level::Structured);
        assert_eq!(classify_level(74), Level::Structured);
        assert_eq!(classify_level(75), Level::Advanced);
        assert_eq!(classify_level(100), Level::Advanced);
    }

    #[test]
    fn labels_are_portuguese() {
        assert_eq!(Level::Initial.to_string(), "Inicial");
        assert_eq!(Level::Developing.to_string(), "Em Desenvolvimento");
        assert_eq!(Level::Structured.to_string(), "Estruturado");
        assert_eq!(Level::Advanced.to_string(), "Avançado");
    }

    #[test]
    fn parse_accepts_both_languages() {
        assert_eq!("Avançado".parse::<Level>().unwrap(), Level::Advanced);
        assert_eq!("developing".parse::<Level>().unwrap(), Level::Developing);
        assert!("expert".parse::<Level>().is_err());
    }
}
