/*
[INPUT]:  Connector results and signing outcomes
[OUTPUT]: Account, signature and clock types used by the auth flow
[POS]:    Data layer - value objects for wallet sessions
[UPDATE]: When account or signature data changes shape
*/

use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// EIP-155 chain identifier
pub type ChainId = u64;

/// BNB Smart Chain testnet
pub const BSC_TESTNET_CHAIN_ID: ChainId = 97;

/// Account reported by a connector right after it connects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedAccount {
    pub address: Address,
    /// `None` when the wallet does not report a chain
    pub chain_id: Option<ChainId>,
}

/// A live wallet session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub chain_id: ChainId,
    pub connected_at: DateTime<Utc>,
}

impl Account {
    pub fn new(address: Address, chain_id: ChainId) -> Self {
        Self {
            address,
            chain_id,
            connected_at: Utc::now(),
        }
    }

    /// EIP-55 checksummed address
    pub fn checksum_address(&self) -> String {
        self.address.to_checksum(None)
    }
}

/// Outcome of one successful signing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResult {
    pub message_text: String,
    /// 0x-prefixed hex
    pub signature_hex: String,
    pub address: Address,
    pub signed_at: DateTime<Utc>,
}

/// Time source for `Issued At`
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Clock that always returns the same instant
pub fn fixed_clock(instant: DateTime<Utc>) -> Clock {
    Arc::new(move || instant)
}
