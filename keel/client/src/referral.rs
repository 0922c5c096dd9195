use {
    crate::{AccountClient, DataSlice, Error, KeyedAccount, ProgramAccountsRequest},
    futures::{
        future::{BoxFuture, Shared},
        FutureExt,
    },
    keel_types::{
        decode_authority, decode_referrer, referred_filter, referred_or_referrer_filter,
        user_stats_address, user_stats_filter, AccountFilter, Commitment, Pubkey, ReferralStatus,
        ReferrerInfo, AUTHORITY_RANGE,
    },
    std::{
        collections::HashMap,
        future::Future,
        sync::{Arc, Mutex, RwLock},
        time::Duration,
    },
    tracing::{debug, warn},
};

/// Tuning knobs for [`ReferralMap`].
#[derive(Debug, Clone)]
pub struct ReferralMapConfig {
    /// Run the three bulk scans of a [`sync`](ReferralMap::sync) concurrently
    /// rather than one after another.
    pub parallel_sync: bool,
    /// Upper bound on each individual remote call. `None` waits forever,
    /// which also hangs every caller sharing an in-flight sync; prefer a
    /// bound.
    pub rpc_timeout: Option<Duration>,
    /// How many scan records to decode and store per batch. The cache yields
    /// to the scheduler between batches.
    pub sync_batch_size: usize,
}

impl Default for ReferralMapConfig {
    fn default() -> Self {
        Self {
            parallel_sync: true,
            rpc_timeout: Some(Duration::from_secs(30)),
            sync_batch_size: 1000,
        }
    }
}

/// The outcome of one of the three scans within a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan completed and applied this many records.
    Ok(usize),
    /// The scan failed; the entries it would have written are missing or
    /// stale until the next sync.
    Failed(String),
    /// The scan was not attempted.
    Skipped,
}

impl ScanOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// What a [`ReferralMap::sync`] did. A sync never fails as a whole; each
/// scan's outcome is reported here instead, so callers can tell a complete
/// refresh from a partial one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The baseline existence scan over every statistics account.
    pub all: ScanOutcome,
    /// The scan for accounts that record a referral.
    pub referred: ScanOutcome,
    /// The broader scan that also catches accounts of referrers themselves.
    pub referred_or_referrer: ScanOutcome,
}

impl SyncReport {
    pub fn skipped() -> Self {
        Self {
            all: ScanOutcome::Skipped,
            referred: ScanOutcome::Skipped,
            referred_or_referrer: ScanOutcome::Skipped,
        }
    }

    /// Whether all three scans completed.
    pub fn is_complete(&self) -> bool {
        self.all.is_ok() && self.referred.is_ok() && self.referred_or_referrer.is_ok()
    }
}

/// A read-through, eventually-consistent cache mapping an authority identity
/// to its referral state.
///
/// Point lookups consult the in-memory map; a wholly absent entry can be
/// resolved with a single-account remote read ([`must_get`](Self::must_get)).
/// The map is rebuilt or extended by [`sync`](Self::sync), which reconciles
/// three filtered bulk scans into one view:
///
/// - the baseline scan records every known statistics account as
///   "not referred", but never overwrites anything;
/// - the two referrer scans decode the actual referrer field and always
///   overwrite, since they are the more specific source.
///
/// Cloning is cheap and clones share the same map.
pub struct ReferralMap<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for ReferralMap<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<C> {
    client: C,
    program: Pubkey,
    commitment: Commitment,
    config: ReferralMapConfig,
    entries: RwLock<HashMap<Pubkey, ReferralStatus>>,
    // At most one sync is in flight; concurrent callers await this same
    // future. Taken and reset under the mutex, never held across an await.
    in_flight: Mutex<Option<Shared<BoxFuture<'static, SyncReport>>>>,
}

impl<C> ReferralMap<C>
where
    C: AccountClient + 'static,
{
    pub fn new(client: C, program: Pubkey, commitment: Commitment) -> Self {
        Self::new_with_config(client, program, commitment, ReferralMapConfig::default())
    }

    pub fn new_with_config(
        client: C,
        program: Pubkey,
        commitment: Commitment,
        config: ReferralMapConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                program,
                commitment,
                config,
                entries: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Idempotent bootstrap: populate the map with one full sync, unless it
    /// already holds entries.
    pub async fn subscribe(&self) -> SyncReport {
        if !self.is_empty() {
            return SyncReport::skipped();
        }

        self.sync().await
    }

    /// Drop every entry. The client connection is owned by the caller and is
    /// left alone.
    pub fn unsubscribe(&self) {
        self.inner.entries.write().unwrap().clear();
    }

    /// Whether the authority has been resolved, with or without a referrer.
    pub fn has(&self, authority: &Pubkey) -> bool {
        self.inner.entries.read().unwrap().contains_key(authority)
    }

    /// The authority's referrer accounts, if it was resolved *and* has a
    /// referrer. `None` means either "resolved, no referrer" or "never
    /// resolved"; use [`has`](Self::has) or [`status`](Self::status) to tell
    /// the two apart.
    pub fn get(&self, authority: &Pubkey) -> Option<ReferrerInfo> {
        self.inner
            .entries
            .read()
            .unwrap()
            .get(authority)
            .and_then(ReferralStatus::referrer_info)
    }

    /// The full tri-state: `None` if never resolved, otherwise the stored
    /// [`ReferralStatus`].
    pub fn status(&self, authority: &Pubkey) -> Option<ReferralStatus> {
        self.inner.entries.read().unwrap().get(authority).copied()
    }

    pub fn size(&self) -> usize {
        self.inner.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().unwrap().is_empty()
    }

    /// Store a resolved status directly, overwriting any prior entry.
    pub fn insert(&self, authority: Pubkey, status: ReferralStatus) {
        self.inner.entries.write().unwrap().insert(authority, status);
    }

    /// Record the authority's referral state. With `Some(status)`, stores it
    /// directly. With `None`, reads the authority's statistics account from
    /// the ledger, decodes the referrer field, and stores the result; a
    /// missing account or malformed payload is an error and nothing is
    /// stored.
    pub async fn add_referrer_info(
        &self,
        authority: Pubkey,
        info: Option<ReferralStatus>,
    ) -> Result<(), Error> {
        let status = match info {
            Some(status) => status,
            None => self.inner.fetch_status(authority).await?,
        };

        self.insert(authority, status);

        Ok(())
    }

    /// Read-through lookup: resolve the authority remotely if it is absent,
    /// then return [`get`](Self::get). Never silently answers `None` for an
    /// authority that was simply never looked at.
    pub async fn must_get(&self, authority: Pubkey) -> Result<Option<ReferrerInfo>, Error> {
        if !self.has(&authority) {
            self.add_referrer_info(authority, None).await?;
        }

        Ok(self.get(&authority))
    }

    /// Refresh the map from the ledger with the three-scan protocol.
    ///
    /// Single-flight: if a sync is already running, await its result instead
    /// of starting another. Never fails; per-scan failures are logged and
    /// reported in the returned [`SyncReport`].
    pub async fn sync(&self) -> SyncReport {
        let shared = {
            let mut in_flight = self.inner.in_flight.lock().unwrap();

            match in_flight.as_ref() {
                Some(shared) => shared.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let shared = async move {
                        let report = inner.run_sync().await;
                        // Release the guard before resolving, so the next
                        // caller triggers a fresh round trip.
                        *inner.in_flight.lock().unwrap() = None;
                        report
                    }
                    .boxed()
                    .shared();

                    *in_flight = Some(shared.clone());
                    shared
                },
            }
        };

        shared.await
    }
}

impl<C> Inner<C>
where
    C: AccountClient,
{
    async fn fetch_status(&self, authority: Pubkey) -> Result<ReferralStatus, Error> {
        let stats_address = user_stats_address(self.program, authority);

        let data = bounded(
            self.config.rpc_timeout,
            self.client.get_account_info(stats_address, self.commitment),
        )
        .await?
        .ok_or(Error::AccountNotFound {
            address: stats_address,
        })?;

        let referrer = decode_referrer(&data)?;

        Ok(ReferralStatus::from_referrer(self.program, referrer))
    }

    async fn run_sync(&self) -> SyncReport {
        let (all, referred, referred_or_referrer) = if self.config.parallel_sync {
            tokio::join!(
                self.sync_all(),
                self.sync_referrer(referred_filter()),
                self.sync_referrer(referred_or_referrer_filter()),
            )
        } else {
            (
                self.sync_all().await,
                self.sync_referrer(referred_filter()).await,
                self.sync_referrer(referred_or_referrer_filter()).await,
            )
        };

        let report = SyncReport {
            all: scan_outcome("all", all),
            referred: scan_outcome("referred", referred),
            referred_or_referrer: scan_outcome("referred_or_referrer", referred_or_referrer),
        };

        debug!(
            complete = report.is_complete(),
            size = self.entries.read().unwrap().len(),
            "sync finished"
        );

        report
    }

    /// Baseline scan: every statistics account of the program, fetching only
    /// the 32-byte authority field. Writes only absent keys, so it can never
    /// clobber what a referrer scan has resolved.
    async fn sync_all(&self) -> Result<usize, Error> {
        let accounts = bounded(
            self.config.rpc_timeout,
            self.client.get_program_accounts(ProgramAccountsRequest {
                program: self.program,
                commitment: self.commitment,
                filters: vec![user_stats_filter()],
                data_slice: Some(DataSlice {
                    offset: AUTHORITY_RANGE.0,
                    length: Pubkey::LENGTH,
                }),
                with_context: false,
            }),
        )
        .await?;

        let authorities = accounts
            .iter()
            .map(|account| Pubkey::try_from(account.data.as_slice()))
            .collect::<Result<Vec<_>, _>>()?;

        let count = authorities.len();

        let mut entries = self.entries.write().unwrap();
        for authority in authorities {
            entries.entry(authority).or_insert(ReferralStatus::NotReferred);
        }

        Ok(count)
    }

    /// Referrer scan: accounts matching `filter`, fetching the first 72
    /// bytes (authority + referrer). Decodes and stores in batches, always
    /// overwriting, yielding to the scheduler between batches.
    async fn sync_referrer(&self, filter: AccountFilter) -> Result<usize, Error> {
        let accounts = bounded(
            self.config.rpc_timeout,
            self.client.get_program_accounts(ProgramAccountsRequest {
                program: self.program,
                commitment: self.commitment,
                filters: vec![user_stats_filter(), filter],
                data_slice: Some(DataSlice {
                    offset: 0,
                    length: 72,
                }),
                with_context: false,
            }),
        )
        .await?;

        let total = accounts.len();

        for batch in accounts.chunks(self.config.sync_batch_size) {
            let decoded = futures::future::join_all(
                batch.iter().map(|account| self.decode_record(account)),
            )
            .await;

            {
                let mut entries = self.entries.write().unwrap();
                for result in decoded {
                    let (authority, status) = result?;
                    entries.insert(authority, status);
                }
            }

            tokio::task::yield_now().await;
        }

        Ok(total)
    }

    async fn decode_record(
        &self,
        account: &KeyedAccount,
    ) -> Result<(Pubkey, ReferralStatus), Error> {
        let authority = decode_authority(&account.data)?;
        let referrer = decode_referrer(&account.data)?;

        Ok((authority, ReferralStatus::from_referrer(self.program, referrer)))
    }
}

fn scan_outcome(scan: &'static str, result: Result<usize, Error>) -> ScanOutcome {
    match result {
        Ok(count) => {
            debug!(scan, count, "scan applied");
            ScanOutcome::Ok(count)
        },
        Err(err) => {
            warn!(scan, error = %err, "scan failed, cache may be partially refreshed");
            ScanOutcome::Failed(err.to_string())
        },
    }
}

async fn bounded<F, T, E>(timeout: Option<Duration>, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, E>>,
    E: Into<Error>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res.map_err(Into::into),
            Err(_) => Err(Error::Timeout { elapsed: limit }),
        },
        None => fut.await.map_err(Into::into),
    }
}
