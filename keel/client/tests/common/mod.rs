use {
    async_trait::async_trait,
    keel_client::{AccountClient, Error, KeyedAccount, ProgramAccountsRequest},
    keel_types::{
        user_stats_address, user_stats_discriminator, AccountFilter, Commitment, Pubkey,
        REFERRAL_ROLE_OFFSET,
    },
    std::{
        collections::BTreeMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Once, RwLock,
        },
        time::Duration,
    },
    tracing_subscriber::{EnvFilter, FmtSubscriber},
};

pub const STATS_ACCOUNT_SIZE: usize = 96;

static TRACING: Once = Once::new();

#[allow(dead_code)]
pub fn setup_tracing_subscriber(level: tracing::Level) {
    TRACING.call_once(|| {
        let filter = EnvFilter::new(level.to_string());

        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("failed to set global tracing subscriber");
    });
}

/// An in-memory ledger holding full account payloads, answering reads the
/// way the real endpoint does: filters evaluated against the full payload,
/// slices applied to the response only.
#[derive(Clone, Default)]
pub struct MockLedger {
    accounts: Arc<RwLock<BTreeMap<Pubkey, Vec<u8>>>>,
    /// Fail any bulk scan whose filter list contains this predicate.
    fail_scans_with: Arc<RwLock<Option<AccountFilter>>>,
    /// Simulated network latency per call.
    delay: Option<Duration>,
    pub account_reads: Arc<AtomicUsize>,
    pub program_scans: Arc<AtomicUsize>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    /// Insert a statistics account for `authority` at its derived address.
    pub fn insert_user_stats(&self, program: Pubkey, authority: Pubkey, referrer: Pubkey, role: u8) {
        let mut data = vec![0; STATS_ACCOUNT_SIZE];
        data[..8].copy_from_slice(&user_stats_discriminator());
        data[8..40].copy_from_slice(authority.as_ref());
        data[40..72].copy_from_slice(referrer.as_ref());
        data[REFERRAL_ROLE_OFFSET] = role;

        self.accounts
            .write()
            .unwrap()
            .insert(user_stats_address(program, authority), data);
    }

    /// Insert a malformed (truncated) account at the authority's stats
    /// address.
    #[allow(dead_code)]
    pub fn insert_truncated(&self, program: Pubkey, authority: Pubkey, len: usize) {
        self.accounts
            .write()
            .unwrap()
            .insert(user_stats_address(program, authority), vec![0; len]);
    }

    #[allow(dead_code)]
    pub fn fail_scans_with(&self, filter: AccountFilter) {
        *self.fail_scans_with.write().unwrap() = Some(filter);
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AccountClient for MockLedger {
    type Error = Error;

    async fn get_account_info(
        &self,
        address: Pubkey,
        _commitment: Commitment,
    ) -> Result<Option<Vec<u8>>, Error> {
        self.account_reads.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        Ok(self.accounts.read().unwrap().get(&address).cloned())
    }

    async fn get_program_accounts(
        &self,
        request: ProgramAccountsRequest,
    ) -> Result<Vec<KeyedAccount>, Error> {
        self.program_scans.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(poisoned) = self.fail_scans_with.read().unwrap().as_ref() {
            if request.filters.contains(poisoned) {
                return Err(Error::Rpc {
                    code: -32005,
                    message: "node is behind".to_string(),
                });
            }
        }

        let accounts = self
            .accounts
            .read()
            .unwrap()
            .iter()
            .filter(|(_, data)| request.filters.iter().all(|filter| filter.matches(data)))
            .map(|(address, data)| {
                let data = match request.data_slice {
                    Some(slice) => data
                        .get(slice.offset..slice.offset + slice.length)
                        .unwrap_or_default()
                        .to_vec(),
                    None => data.clone(),
                };

                KeyedAccount {
                    address: *address,
                    data,
                }
            })
            .collect();

        Ok(accounts)
    }
}

/// A deterministic identity from an index, distinct for every `n`.
pub fn pubkey(n: u32) -> Pubkey {
    let mut bytes = [0; Pubkey::LENGTH];
    bytes[..4].copy_from_slice(&n.to_le_bytes());
    bytes[4] = 0xab; // keep clear of the all-zero sentinel and of `Pubkey::mock`
    Pubkey::from_array(bytes)
}
