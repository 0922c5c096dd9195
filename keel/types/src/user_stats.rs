use {
    crate::{user_account_address, user_stats_address, Pubkey, StdError, StdResult},
    sha2::{Digest, Sha256},
};

/// Byte range of the account discriminator in a statistics account payload.
pub const DISCRIMINATOR_RANGE: (usize, usize) = (0, 8);

/// Byte range of the owning authority identity.
pub const AUTHORITY_RANGE: (usize, usize) = (8, 40);

/// Byte range of the referrer identity. All zeroes means no referrer.
pub const REFERRER_RANGE: (usize, usize) = (40, 72);

/// Offset of the referral role bitflags byte.
pub const REFERRAL_ROLE_OFFSET: usize = 72;

/// Role flag: this authority was referred by someone.
pub const ROLE_REFERRED: u8 = 1;

/// Role flag: this authority has referred someone.
pub const ROLE_REFERRER: u8 = 1 << 1;

/// The 8-byte discriminator identifying a statistics account, the first 8
/// bytes of `sha256("account:UserStats")`.
pub fn user_stats_discriminator() -> [u8; 8] {
    let digest = Sha256::digest(b"account:UserStats");
    digest[..8].try_into().unwrap()
}

/// Decode the owning authority from a statistics account payload.
pub fn decode_authority(data: &[u8]) -> StdResult<Pubkey> {
    decode_key(data, AUTHORITY_RANGE)
}

/// Decode the referrer identity from a statistics account payload. The
/// all-zero default key is returned as-is; collapsing it to "no referrer" is
/// the caller's concern.
pub fn decode_referrer(data: &[u8]) -> StdResult<Pubkey> {
    decode_key(data, REFERRER_RANGE)
}

fn decode_key(data: &[u8], (start, end): (usize, usize)) -> StdResult<Pubkey> {
    data.get(start..end)
        .ok_or(StdError::OutOfRange {
            start,
            end,
            len: data.len(),
        })?
        .try_into()
}

/// The derived addresses of a referrer, computed from the referrer's own
/// authority identity and the controlling program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferrerInfo {
    /// The referrer's primary user account, always at sub-index 0.
    pub referrer: Pubkey,
    /// The referrer's statistics account.
    pub referrer_stats: Pubkey,
}

impl ReferrerInfo {
    pub fn derive(program: Pubkey, referrer_authority: Pubkey) -> Self {
        Self {
            referrer: user_account_address(program, referrer_authority, 0),
            referrer_stats: user_stats_address(program, referrer_authority),
        }
    }
}

/// The resolved referral state of an authority.
///
/// Absence is not represented here; an authority that was never resolved is
/// simply absent from whatever map stores these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralStatus {
    /// Resolved: the authority has no referrer.
    NotReferred,
    /// Resolved: the authority was referred, by the derived accounts within.
    Referred(ReferrerInfo),
}

impl ReferralStatus {
    /// Build a status from a decoded referrer identity, collapsing the
    /// all-zero sentinel to `NotReferred`. Derived addresses are never
    /// computed for the sentinel.
    pub fn from_referrer(program: Pubkey, referrer_authority: Pubkey) -> Self {
        if referrer_authority.is_default() {
            Self::NotReferred
        } else {
            Self::Referred(ReferrerInfo::derive(program, referrer_authority))
        }
    }

    pub fn referrer_info(&self) -> Option<ReferrerInfo> {
        match self {
            Self::NotReferred => None,
            Self::Referred(info) => Some(*info),
        }
    }
}

// ----------------------------------- tests -----------------------------------
