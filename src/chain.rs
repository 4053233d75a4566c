//! Network identifiers and per-chain token constants.

use std::{fmt, str::FromStr};

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// CAIP-2 namespace of EVM chains.
pub const CAIP2_PREFIX: &str = "eip155";

/// Canonical Seaport 1.6 deployment, identical on every supported chain.
pub const SEAPORT_V1_6: Address = address!("0x0000000000000068F116a894984e2DB1123eB395");

pub const ETHEREUM_MAINNET: u64 = 1;
pub const ETHEREUM_SEPOLIA: u64 = 11155111;
pub const BASE_MAINNET: u64 = 8453;
pub const BASE_SEPOLIA: u64 = 84532;
pub const OPTIMISM_MAINNET: u64 = 10;
pub const OPTIMISM_SEPOLIA: u64 = 11155420;
pub const DOMA_TESTNET: u64 = 97476;

/// OP-stack predeploy of the wrapped native token.
const OP_STACK_WETH: Address = address!("0x4200000000000000000000000000000000000006");

/// Returns the canonical wrapped-native-currency contract of the chain,
/// or `None` if the chain is not known.
pub fn wrapped_native_address(chain_id: u64) -> Option<Address> {
    match chain_id {
        ETHEREUM_MAINNET => Some(address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
        ETHEREUM_SEPOLIA => Some(address!("0x7b79995e5f793A07Bc00c21412e50Ecae098E7f9")),
        BASE_MAINNET | BASE_SEPOLIA | OPTIMISM_MAINNET | OPTIMISM_SEPOLIA => Some(OP_STACK_WETH),
        DOMA_TESTNET => Some(address!("0x6f898cd313dcee4d28a87f675bd93c471868b0ac")),
        _ => None,
    }
}

/// Chain identifier in CAIP-2 form, e.g. `eip155:97476`.
///
/// Only the `eip155` namespace is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Caip2ChainId(u64);

impl Caip2ChainId {
    pub fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    /// Numeric EIP-155 chain id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Failure to parse a CAIP-2 chain identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainIdError {
    #[error("invalid chain id namespace: {0}")]
    Namespace(String),

    #[error("invalid chain id reference: {0}")]
    Reference(String),
}

impl FromStr for Caip2ChainId {
    type Err = ChainIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, reference) = s
            .split_once(':')
            .ok_or_else(|| ChainIdError::Namespace(s.to_string()))?;
        if prefix != CAIP2_PREFIX {
            return Err(ChainIdError::Namespace(prefix.to_string()));
        }
        reference
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ChainIdError::Reference(reference.to_string()))
    }
}

impl TryFrom<String> for Caip2ChainId {
    type Error = ChainIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Caip2ChainId> for String {
    fn from(value: Caip2ChainId) -> Self {
        value.to_string()
    }
}

impl From<u64> for Caip2ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Caip2ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", CAIP2_PREFIX, self.0)
    }
}

/// Parses CAIP-2 chain identifier into the numeric chain id.
pub fn parse_chain_id(network: &str) -> Result<u64, ChainIdError> {
    network.parse::<Caip2ChainId>().map(|c| c.id())
}
