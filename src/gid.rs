//! Product references: the backend speaks numeric ids, the host speaks
//! `gid://shopify/Product/<id>`.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

const GID_PREFIX: &str = "gid://shopify/Product/";
const MAP_KEY_PREFIX: &str = "product_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(u64);

impl ProductId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Accepts a GID, a bare number or a `product_<n>` map key. For GIDs only
    /// the last `/` segment is used.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let trimmed = raw.trim();
        let tail = trimmed.rsplit('/').next().unwrap_or(trimmed);
        let tail = tail.strip_prefix(MAP_KEY_PREFIX).unwrap_or(tail);
        tail.parse::<u64>()
            .map(ProductId)
            .map_err(|_| ApiError::InvalidProductRef(raw.to_string()))
    }

    pub fn to_gid(self) -> String {
        format!("{GID_PREFIX}{}", self.0)
    }

    /// Key used by the backend in the coming-soon config map.
    pub fn map_key(self) -> String {
        format!("{MAP_KEY_PREFIX}{}", self.0)
    }

    pub fn admin_url(self, shop_domain: &str) -> String {
        format!("https://{}/admin/products/{}", shop_domain, self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductId::parse(s)
    }
}

impl Serialize for ProductId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(ProductId(n)),
            Raw::Text(s) => ProductId::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}
