//! Identifier of the configured blockchain data provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[default]
    Blockfrost,
    Tangocrypto,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blockfrost => "blockfrost",
            Self::Tangocrypto => "tangocrypto",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blockfrost" => Ok(Self::Blockfrost),
            "tangocrypto" => Ok(Self::Tangocrypto),
            other => Err(TypesError::UnknownProvider(other.to_string())),
        }
    }
}
