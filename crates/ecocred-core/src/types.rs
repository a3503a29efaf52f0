use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Credit or native amount in 18-decimal base units.
pub type Amount = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

pub type ActionId = u64;
pub type BadgeId = u64;
pub type ListingId = u64;
pub type StakeId = u64;
pub type RetirementId = u64;
pub type ProposalId = u64;

// ── Address ───────────────────────────────────────────────────────────────────

/// 20-byte account identifier. The all-zero address is the null address.
///
/// Serialized as `0x`-prefixed hex in human-readable formats (JSON) and as raw
/// bytes in binary formats (bincode).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Deterministic address: first 20 bytes of BLAKE3(`seed`).
    pub fn derive(seed: &[u8]) -> Self {
        let hash = blake3::hash(seed);
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&hash.as_bytes()[..20]);
        Self(arr)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..10])
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            Ok(Address(<[u8; 20]>::deserialize(deserializer)?))
        }
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// 32-byte transaction identifier: BLAKE3 of the ledger sequence number and
/// the bincode-encoded transaction. Hex in JSON, raw bytes in bincode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            TxId::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            Ok(TxId(<[u8; 32]>::deserialize(deserializer)?))
        }
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

// ── Module ────────────────────────────────────────────────────────────────────

/// A ledger subsystem. Each module acts under its own principal address when
/// it holds custody or calls into another module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Module {
    Ledger,
    Badges,
    Verification,
    Marketplace,
    Staking,
    Retirement,
    AccessControl,
    Governance,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Ledger,
        Module::Badges,
        Module::Verification,
        Module::Marketplace,
        Module::Staking,
        Module::Retirement,
        Module::AccessControl,
        Module::Governance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Module::Ledger => "ledger",
            Module::Badges => "badges",
            Module::Verification => "verification",
            Module::Marketplace => "marketplace",
            Module::Staking => "staking",
            Module::Retirement => "retirement",
            Module::AccessControl => "access",
            Module::Governance => "governance",
        }
    }

    /// Principal address: `Address::derive("ecocred.module.<name>")`.
    pub fn address(&self) -> Address {
        Address::derive(format!("ecocred.module.{}", self.name()).as_bytes())
    }

    /// The module whose principal is `address`, if any.
    pub fn of_address(address: &Address) -> Option<Module> {
        Module::ALL.into_iter().find(|m| m.address() == *address)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown module: {s}"))
    }
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// Single role per address; granting a role replaces the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    None,
    Admin,
    Verifier,
    Moderator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::None => "none",
            Role::Admin => "admin",
            Role::Verifier => "verifier",
            Role::Moderator => "moderator",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Role::None),
            "admin" => Ok(Role::Admin),
            "verifier" => Ok(Role::Verifier),
            "moderator" => Ok(Role::Moderator),
            other => Err(format!("malformed role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_round_trip_accepts_missing_prefix() {
        let a = Address::derive(b"company");
        assert_eq!(Address::from_hex(&a.to_hex()).unwrap(), a);
        assert_eq!(Address::from_hex(&a.to_hex()[2..]).unwrap(), a);
        assert!(Address::from_hex("0x1234").is_err());
    }

    #[test]
    fn address_json_is_hex_and_bincode_is_raw() {
        let a = Address::derive(b"json");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{}\"", a.to_hex()));
        let bytes = bincode::serialize(&a).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(bincode::deserialize::<Address>(&bytes).unwrap(), a);
    }

    #[test]
    fn module_principals_are_distinct_and_non_null() {
        let mut seen = std::collections::HashSet::new();
        for m in Module::ALL {
            assert!(!m.address().is_zero());
            assert!(seen.insert(m.address()), "duplicate principal for {m}");
            assert_eq!(m.name().parse::<Module>().unwrap(), m);
            assert_eq!(Module::of_address(&m.address()), Some(m));
        }
        assert_eq!(Module::of_address(&Address::derive(b"someone")), None);
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert_eq!("Verifier".parse::<Role>().unwrap(), Role::Verifier);
        assert!("auditor".parse::<Role>().is_err());
    }
}
