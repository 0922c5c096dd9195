use {
    crate::Error,
    async_trait::async_trait,
    keel_types::{AccountFilter, Commitment, Pubkey},
    serde::{Deserialize, Serialize},
    std::fmt::Display,
};

/// A byte range of the account payload to return in place of the full data.
/// A zero `length` returns no payload at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSlice {
    pub offset: usize,
    pub length: usize,
}

/// A filtered bulk scan over every account owned by a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramAccountsRequest {
    pub program: Pubkey,
    pub commitment: Commitment,
    /// Server-evaluated predicates, AND-composed.
    pub filters: Vec<AccountFilter>,
    pub data_slice: Option<DataSlice>,
    /// Whether the server should wrap the result in its read context
    /// (ledger height at which the scan was evaluated).
    pub with_context: bool,
}

/// One account returned by a bulk scan: its address plus the (possibly
/// sliced) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedAccount {
    pub address: Pubkey,
    pub data: Vec<u8>,
}

/// Read access to accounts on the ledger.
#[async_trait]
pub trait AccountClient: Send + Sync {
    type Error: Into<Error> + Display + Send;

    /// Fetch a single account's payload. `None` if no account exists at the
    /// address.
    async fn get_account_info(
        &self,
        address: Pubkey,
        commitment: Commitment,
    ) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Scan all accounts of a program matching the request's filters.
    async fn get_program_accounts(
        &self,
        request: ProgramAccountsRequest,
    ) -> Result<Vec<KeyedAccount>, Self::Error>;
}
