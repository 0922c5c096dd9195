use {
    crate::{StdError, StdResult},
    serde::{de, ser},
    std::{
        fmt::{self, Debug, Display},
        str::FromStr,
    },
};

/// An account identity on the ledger.
///
/// Identities are 32-byte values whose canonical text form is the base-58
/// encoding of the raw bytes, with no prefix or checksum. The text form is
/// what appears in logs and is used as the lookup key wherever a string key
/// is required.
///
/// An identity is validated during deserialization: if deserializing doesn't
/// throw an error, the value is a well-formed 32-byte key. It is therefore
/// safe to use `Pubkey`s directly in JSON messages.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pubkey([u8; Self::LENGTH]);

impl Pubkey {
    pub const DEFAULT: Self = Self([0; Self::LENGTH]);
    pub const LENGTH: usize = 32;

    pub const fn from_array(array: [u8; Self::LENGTH]) -> Self {
        Self(array)
    }

    pub const fn into_array(self) -> [u8; Self::LENGTH] {
        self.0
    }

    /// Whether this is the all-zero sentinel that stands for "no key".
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// Generate a mock identity for use in testing.
    pub const fn mock(index: u8) -> Self {
        let mut bytes = [0; Self::LENGTH];
        bytes[Self::LENGTH - 1] = index;
        Self(bytes)
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; Self::LENGTH]> for Pubkey {
    fn from(array: [u8; Self::LENGTH]) -> Self {
        Self(array)
    }
}

impl TryFrom<&[u8]> for Pubkey {
    type Error = StdError;

    fn try_from(slice: &[u8]) -> StdResult<Self> {
        slice
            .try_into()
            .map(Self)
            .map_err(|_| StdError::IncorrectLength {
                expect: Self::LENGTH,
                found: slice.len(),
            })
    }
}

impl FromStr for Pubkey {
    type Err = StdError;

    fn from_str(s: &str) -> StdResult<Self> {
        let mut bytes = [0; Self::LENGTH];
        let len = bs58::decode(s)
            .onto(&mut bytes)
            .map_err(|err| StdError::Parse {
                ty: "Pubkey",
                input: s.to_string(),
                reason: err.to_string(),
            })?;

        if len != Self::LENGTH {
            return Err(StdError::IncorrectLength {
                expect: Self::LENGTH,
                found: len,
            });
        }

        Ok(Self(bytes))
    }
}

impl Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&bs58::encode(&self.0).into_string())
    }
}

impl Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl ser::Serialize for Pubkey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> de::Deserialize<'de> for Pubkey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_str(PubkeyVisitor)
    }
}

struct PubkeyVisitor;

impl de::Visitor<'_> for PubkeyVisitor {
    type Value = Pubkey;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a base-58 encoded 32-byte key")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Pubkey::from_str(v).map_err(E::custom)
    }
}

// ----------------------------------- tests -----------------------------------
