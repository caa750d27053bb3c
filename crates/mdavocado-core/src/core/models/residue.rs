use super::angles::AngleKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const CHAIN_LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResidueError {
    #[error("Residue roster is empty")]
    EmptyRoster,
    #[error("Chain layout must contain at least one chain")]
    NoChains,
    #[error("{residues} residues cannot be split evenly into {chains} chains")]
    UnevenChains { residues: usize, chains: usize },
    #[error("Explicit chain lengths sum to {actual}, but the roster has {expected} residues")]
    ChainLengthMismatch { expected: usize, actual: usize },
    #[error("Chain {index} has zero residues")]
    EmptyChain { index: usize },
    #[error("{0} chains requested, but only 26 chain letters are available")]
    TooManyChains(usize),
    #[error("Residue serial {serial} is outside the roster range 1..={max}")]
    UnknownSerial { serial: usize, max: usize },
}

/// How residues of the roster are assigned to chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ChainLayout {
    /// Every chain has the same number of residues.
    Uniform { chains: usize },
    /// Chain lengths in roster order.
    Explicit { lengths: Vec<usize> },
}

/// A residue as it appears in labels: `PHE B 221`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueLabel {
    pub serial: usize,
    pub chain: char,
    pub name: String,
    pub number: usize,
}

impl fmt::Display for ResidueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.chain, self.number)
    }
}

/// One tracked dihedral of one residue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueIdentity {
    pub residue: ResidueLabel,
    pub kind: AngleKind,
}

impl fmt::Display for ResidueIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.residue, self.kind)
    }
}

/// Maps residue serial numbers (1-based, contiguous) to chain-aware labels.
#[derive(Debug, Clone)]
pub struct ResidueIndex {
    labels: Vec<ResidueLabel>,
}

impl ResidueIndex {
    pub fn new(names: &[String], layout: &ChainLayout) -> Result<Self, ResidueError> {
        if names.is_empty() {
            return Err(ResidueError::EmptyRoster);
        }

        let lengths = match layout {
            ChainLayout::Uniform { chains: 0 } => return Err(ResidueError::NoChains),
            ChainLayout::Uniform { chains } => {
                if names.len() % chains != 0 {
                    return Err(ResidueError::UnevenChains {
                        residues: names.len(),
                        chains: *chains,
                    });
                }
                vec![names.len() / chains; *chains]
            }
            ChainLayout::Explicit { lengths } => {
                if lengths.is_empty() {
                    return Err(ResidueError::NoChains);
                }
                if let Some(index) = lengths.iter().position(|&l| l == 0) {
                    return Err(ResidueError::EmptyChain { index });
                }
                let total: usize = lengths.iter().sum();
                if total != names.len() {
                    return Err(ResidueError::ChainLengthMismatch {
                        expected: names.len(),
                        actual: total,
                    });
                }
                lengths.clone()
            }
        };

        if lengths.len() > CHAIN_LETTERS.len() {
            return Err(ResidueError::TooManyChains(lengths.len()));
        }

        let mut labels = Vec::with_capacity(names.len());
        let mut serial = 1;
        for (chain_idx, &length) in lengths.iter().enumerate() {
            let chain = CHAIN_LETTERS[chain_idx] as char;
            for number in 1..=length {
                labels.push(ResidueLabel {
                    serial,
                    chain,
                    name: names[serial - 1].clone(),
                    number,
                });
                serial += 1;
            }
        }

        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, serial: usize) -> Result<&ResidueLabel, ResidueError> {
        serial
            .checked_sub(1)
            .and_then(|idx| self.labels.get(idx))
            .ok_or(ResidueError::UnknownSerial {
                serial,
                max: self.labels.len(),
            })
    }

    pub fn identity(&self, serial: usize, kind: AngleKind) -> Result<ResidueIdentity, ResidueError> {
        Ok(ResidueIdentity {
            residue: self.label(serial)?.clone(),
            kind,
        })
    }

    pub fn chain_count(&self) -> usize {
        self.labels.last().map_or(0, |l| {
            CHAIN_LETTERS
                .iter()
                .position(|&c| c as char == l.chain)
                .map_or(0, |p| p + 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: usize) -> Vec<String> {
        ["ALA", "GLY", "PHE", "SER"]
            .iter()
            .cycle()
            .take(n)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn uniform_layout_assigns_chains_positionally() {
        let index = ResidueIndex::new(&roster(6), &ChainLayout::Uniform { chains: 2 }).unwrap();
        assert_eq!(index.len(), 6);
        assert_eq!(index.chain_count(), 2);

        let third = index.label(3).unwrap();
        assert_eq!(third.chain, 'A');
        assert_eq!(third.number, 3);

        let fourth = index.label(4).unwrap();
        assert_eq!(fourth.chain, 'B');
        assert_eq!(fourth.number, 1);
        assert_eq!(fourth.to_string(), "SER B 1");
    }

    #[test]
    fn uniform_layout_rejects_uneven_chains() {
        let err = ResidueIndex::new(&roster(7), &ChainLayout::Uniform { chains: 2 }).unwrap_err();
        assert_eq!(
            err,
            ResidueError::UnevenChains {
                residues: 7,
                chains: 2
            }
        );
    }

    #[test]
    fn explicit_layout_supports_unequal_chains() {
        let layout = ChainLayout::Explicit {
            lengths: vec![2, 5],
        };
        let index = ResidueIndex::new(&roster(7), &layout).unwrap();
        assert_eq!(index.label(2).unwrap().chain, 'A');
        let last = index.label(7).unwrap();
        assert_eq!((last.chain, last.number), ('B', 5));
    }

    #[test]
    fn explicit_layout_must_cover_the_roster() {
        let layout = ChainLayout::Explicit {
            lengths: vec![2, 2],
        };
        assert_eq!(
            ResidueIndex::new(&roster(5), &layout).unwrap_err(),
            ResidueError::ChainLengthMismatch {
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn zero_chains_and_empty_rosters_are_rejected() {
        assert_eq!(
            ResidueIndex::new(&roster(4), &ChainLayout::Uniform { chains: 0 }).unwrap_err(),
            ResidueError::NoChains
        );
        assert_eq!(
            ResidueIndex::new(&[], &ChainLayout::Uniform { chains: 1 }).unwrap_err(),
            ResidueError::EmptyRoster
        );
    }

    #[test]
    fn too_many_chains_is_rejected() {
        let err = ResidueIndex::new(&roster(27), &ChainLayout::Uniform { chains: 27 }).unwrap_err();
        assert_eq!(err, ResidueError::TooManyChains(27));
    }

    #[test]
    fn unknown_serials_are_reported() {
        let index = ResidueIndex::new(&roster(3), &ChainLayout::Uniform { chains: 1 }).unwrap();
        assert!(matches!(
            index.label(0),
            Err(ResidueError::UnknownSerial { serial: 0, max: 3 })
        ));
        assert!(index.label(4).is_err());
        assert_eq!(
            index.identity(2, AngleKind::Psi).unwrap().to_string(),
            "GLY A 2 psi"
        );
    }
}
