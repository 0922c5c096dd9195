use {
    crate::{user_stats_discriminator, REFERRAL_ROLE_OFFSET, ROLE_REFERRED, ROLE_REFERRER},
    serde::{Deserialize, Serialize},
};

/// A server-evaluated predicate over an account's payload.
///
/// Predicates in a scan request are AND-composed by the server; a single
/// disjunctive pattern match is expressed with [`AccountFilter::MemcmpAny`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountFilter {
    /// Payload is exactly this many bytes long.
    DataSize(u64),
    /// Payload bytes at `offset` equal `bytes`.
    Memcmp { offset: usize, bytes: Vec<u8> },
    /// Payload bytes at `offset` equal any one of `patterns`.
    MemcmpAny {
        offset: usize,
        patterns: Vec<Vec<u8>>,
    },
}

impl AccountFilter {
    /// Evaluate the predicate against a full account payload. This is what
    /// the server does; it lives here so tests and mocks agree with it.
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            Self::DataSize(size) => data.len() as u64 == *size,
            Self::Memcmp { offset, bytes } => {
                data.get(*offset..*offset + bytes.len()) == Some(bytes.as_slice())
            },
            Self::MemcmpAny { offset, patterns } => patterns.iter().any(|pattern| {
                data.get(*offset..*offset + pattern.len()) == Some(pattern.as_slice())
            }),
        }
    }
}

/// Matches every statistics account of the program.
pub fn user_stats_filter() -> AccountFilter {
    AccountFilter::Memcmp {
        offset: 0,
        bytes: user_stats_discriminator().to_vec(),
    }
}

/// Matches statistics accounts whose authority was referred.
pub fn referred_filter() -> AccountFilter {
    AccountFilter::MemcmpAny {
        offset: REFERRAL_ROLE_OFFSET,
        patterns: vec![
            vec![ROLE_REFERRED],
            vec![ROLE_REFERRED | ROLE_REFERRER],
        ],
    }
}

/// Matches statistics accounts whose authority was referred, or has referred
/// someone else. Broader than [`referred_filter`]: it also catches pure
/// referrers, whose own record still needs an entry.
pub fn referred_or_referrer_filter() -> AccountFilter {
    AccountFilter::MemcmpAny {
        offset: REFERRAL_ROLE_OFFSET,
        patterns: vec![
            vec![ROLE_REFERRED],
            vec![ROLE_REFERRER],
            vec![ROLE_REFERRED | ROLE_REFERRER],
        ],
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    fn payload_with_role(role: u8) -> Vec<u8> {
        let mut data = vec![0; 96];
        data[..8].copy_from_slice(&user_stats_discriminator());
        data[REFERRAL_ROLE_OFFSET] = role;
        data
    }

    #[test_case(0,                            false, false ; "no role")]
    #[test_case(ROLE_REFERRED,                true,  true  ; "referred")]
    #[test_case(ROLE_REFERRER,                false, true  ; "referrer")]
    #[test_case(ROLE_REFERRED | ROLE_REFERRER, true,  true ; "both")]
    fn role_filters(role: u8, referred: bool, referred_or_referrer: bool) {
        let data = payload_with_role(role);

        assert!(user_stats_filter().matches(&data));
        assert_eq!(referred_filter().matches(&data), referred);
        assert_eq!(
            referred_or_referrer_filter().matches(&data),
            referred_or_referrer
        );
    }

    #[test]
    fn memcmp_out_of_bounds_never_matches() {
        let filter = AccountFilter::Memcmp {
            offset: 100,
            bytes: vec![1],
        };
        assert!(!filter.matches(&[0; 8]));
    }

    #[test]
    fn data_size() {
        assert!(AccountFilter::DataSize(8).matches(&[0; 8]));
        assert!(!AccountFilter::DataSize(8).matches(&[0; 9]));
    }
}
