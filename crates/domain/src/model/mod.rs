//! Value types shared by the monitor core and the binaries that host it.

use serde::Deserialize;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Chain families with a monitor implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CoinKind {
    #[strum(to_string = "eth", serialize = "ethereum")]
    Eth,
}

/// Network selector handed to the adapter alongside the node URL.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NetworkType {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

/// Connection identity of one node. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
    url: String,
    network: NetworkType,
}

impl NodeEndpoint {
    pub fn new(url: impl Into<String>, network: NetworkType) -> Self {
        Self {
            url: url.into(),
            network,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }
}

/// Current and network-highest heights exactly as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncStatus {
    #[serde(rename = "currentBlock")]
    pub current: String,
    #[serde(rename = "highestBlock")]
    pub highest: String,
}

impl SyncStatus {
    pub fn new(current: impl Into<String>, highest: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            highest: highest.into(),
        }
    }

    /// Parses both heights independently and returns `highest - current`.
    /// The result is negative when the node is ahead of its reference.
    pub fn difference(&self) -> Result<i64, BlockNumberError> {
        let current = parse_block_number(&self.current)?;
        let highest = parse_block_number(&self.highest)?;
        highest
            .checked_sub(current)
            .ok_or_else(|| BlockNumberError::OutOfRange {
                value: format!("{} - {}", self.highest, self.current),
            })
    }
}

/// Errors emitted when a node-reported height is not an integer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockNumberError {
    #[error("`{value}` is not a decimal or 0x-prefixed hex integer")]
    Invalid { value: String },
    #[error("`{value}` does not fit in a signed 64-bit integer")]
    OutOfRange { value: String },
}

/// Parses a block number using the node convention: `0x`/`0X` selects hex,
/// anything else is decimal. A single leading sign is accepted.
pub fn parse_block_number(raw: &str) -> Result<i64, BlockNumberError> {
    let invalid = || BlockNumberError::Invalid {
        value: raw.to_owned(),
    };

    let (negative, unsigned) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let (digits, radix) = match unsigned.get(..2) {
        Some("0x") | Some("0X") => (&unsigned[2..], 16),
        _ => (unsigned, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let out_of_range = || BlockNumberError::OutOfRange {
        value: raw.to_owned(),
    };
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| out_of_range())?;

    if negative {
        0i64.checked_sub_unsigned(magnitude).ok_or_else(out_of_range)
    } else {
        i64::try_from(magnitude).map_err(|_| out_of_range())
    }
}
