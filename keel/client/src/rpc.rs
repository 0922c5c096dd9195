use {
    crate::{AccountClient, DataSlice, Error, KeyedAccount, ProgramAccountsRequest},
    async_trait::async_trait,
    data_encoding::BASE64,
    keel_types::{AccountFilter, Commitment, Pubkey},
    serde::{de::DeserializeOwned, Deserialize, Serialize},
    serde_json::json,
    url::Url,
};

/// JSON-RPC 2.0 client for the ledger's HTTP read endpoint.
pub struct RpcClient {
    inner: reqwest::Client,
    endpoint: Url,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        Ok(Self {
            inner: reqwest::Client::new(),
            endpoint: endpoint.parse()?,
        })
    }

    async fn request<P, R>(&self, method: &str, params: P) -> Result<R, Error>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let res: RpcResponse<R> = self
            .inner
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = res.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        res.result
            .ok_or_else(|| Error::malformed_response("neither result nor error present"))
    }
}

#[async_trait]
impl AccountClient for RpcClient {
    type Error = Error;

    async fn get_account_info(
        &self,
        address: Pubkey,
        commitment: Commitment,
    ) -> Result<Option<Vec<u8>>, Error> {
        let res: WithContext<Option<RpcAccount>> = self
            .request("getAccountInfo", json!([address, {
                "commitment": commitment,
                "encoding": "base64",
            }]))
            .await?;

        res.value.map(|account| account.decode_data()).transpose()
    }

    async fn get_program_accounts(
        &self,
        request: ProgramAccountsRequest,
    ) -> Result<Vec<KeyedAccount>, Error> {
        let params = program_accounts_params(&request);

        let accounts = if request.with_context {
            self.request::<_, WithContext<Vec<RpcKeyedAccount>>>("getProgramAccounts", params)
                .await?
                .value
        } else {
            self.request("getProgramAccounts", params).await?
        };

        accounts
            .into_iter()
            .map(|keyed| {
                Ok(KeyedAccount {
                    address: keyed.pubkey,
                    data: keyed.account.decode_data()?,
                })
            })
            .collect()
    }
}

/// Build the JSON-RPC parameter list for a `getProgramAccounts` call. Kept
/// separate from the trait impl so wire-shape tests can exercise it without
/// a server.
pub fn program_accounts_params(request: &ProgramAccountsRequest) -> serde_json::Value {
    json!([request.program, ProgramAccountsOptions {
        commitment: request.commitment,
        encoding: "base64",
        filters: &request.filters,
        data_slice: request.data_slice,
        with_context: request.with_context,
    }])
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgramAccountsOptions<'a> {
    commitment: Commitment,
    encoding: &'static str,
    filters: &'a [AccountFilter],
    #[serde(skip_serializing_if = "Option::is_none")]
    data_slice: Option<DataSlice>,
    with_context: bool,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<R> {
    value: R,
}

#[derive(Deserialize)]
struct RpcKeyedAccount {
    pubkey: Pubkey,
    account: RpcAccount,
}

#[derive(Deserialize)]
struct RpcAccount {
    /// The payload and its encoding, e.g. `["c29tZSBieXRlcw==", "base64"]`.
    data: (String, String),
}

impl RpcAccount {
    fn decode_data(self) -> Result<Vec<u8>, Error> {
        let (payload, encoding) = self.data;

        if encoding != "base64" {
            return Err(Error::malformed_response(format!(
                "unsupported account data encoding: {encoding}"
            )));
        }

        BASE64
            .decode(payload.as_bytes())
            .map_err(Error::malformed_response)
    }
}
