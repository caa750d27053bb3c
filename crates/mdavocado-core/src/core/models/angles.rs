use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleKind {
    Phi,
    Psi,
    Chi1,
    Chi2,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown angle kind: '{0}'")]
pub struct ParseAngleKindError(pub String);

impl AngleKind {
    pub fn family(self) -> AngleFamily {
        match self {
            AngleKind::Phi | AngleKind::Psi => AngleFamily::Backbone,
            AngleKind::Chi1 | AngleKind::Chi2 => AngleFamily::Sidechain,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AngleKind::Phi => "\u{3c6}",
            AngleKind::Psi => "\u{3c8}",
            AngleKind::Chi1 => "\u{3c7}1",
            AngleKind::Chi2 => "\u{3c7}2",
        }
    }
}

impl fmt::Display for AngleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AngleKind::Phi => "phi",
            AngleKind::Psi => "psi",
            AngleKind::Chi1 => "chi1",
            AngleKind::Chi2 => "chi2",
        };
        f.write_str(s)
    }
}

impl FromStr for AngleKind {
    type Err = ParseAngleKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phi" => Ok(AngleKind::Phi),
            "psi" => Ok(AngleKind::Psi),
            "chi1" => Ok(AngleKind::Chi1),
            "chi2" => Ok(AngleKind::Chi2),
            _ => Err(ParseAngleKindError(s.to_string())),
        }
    }
}

/// The pair of dihedrals tracked per residue.
///
/// Backbone pairs (phi/psi) live in `(-180, 180]`, side-chain pairs (chi1/chi2)
/// in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AngleFamily {
    Backbone,
    Sidechain,
}

impl AngleFamily {
    pub fn kinds(self) -> (AngleKind, AngleKind) {
        match self {
            AngleFamily::Backbone => (AngleKind::Phi, AngleKind::Psi),
            AngleFamily::Sidechain => (AngleKind::Chi1, AngleKind::Chi2),
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            AngleFamily::Backbone => Domain::new(-180.0, 180.0),
            AngleFamily::Sidechain => Domain::new(0.0, 360.0),
        }
    }
}

/// A closed interval of angle values in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub lo: f64,
    pub hi: f64,
}

impl Domain {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn span(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}
