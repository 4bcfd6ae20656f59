use sha2::{Digest, Sha256};

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
pub const PUBLIC_HORIZON_URL: &str = "https://horizon.stellar.org";
pub const TESTNET_FRIENDBOT_URL: &str = "https://friendbot.stellar.org";

/// Which ledger network transactions are signed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Test,
    Public,
}

impl Network {
    pub fn from_live_flag(live: bool) -> Self {
        if live {
            Network::Public
        } else {
            Network::Test
        }
    }

    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Test => TESTNET_PASSPHRASE,
            Network::Public => PUBLIC_PASSPHRASE,
        }
    }

    /// SHA-256 of the passphrase; prefixes every signature payload
    pub fn network_id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase().as_bytes()).into()
    }

    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Test => TESTNET_HORIZON_URL,
            Network::Public => PUBLIC_HORIZON_URL,
        }
    }

    /// The faucet only exists on the test network
    pub fn friendbot_url(&self) -> Option<&'static str> {
        match self {
            Network::Test => Some(TESTNET_FRIENDBOT_URL),
            Network::Public => None,
        }
    }
}
