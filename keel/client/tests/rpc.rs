use {
    keel_client::{program_accounts_params, DataSlice, ProgramAccountsRequest},
    keel_types::{referred_filter, user_stats_filter, Commitment, Pubkey},
    serde_json::json,
};

#[test]
fn program_accounts_wire_shape() {
    let program = Pubkey::mock(1);

    let params = program_accounts_params(&ProgramAccountsRequest {
        program,
        commitment: Commitment::Confirmed,
        filters: vec![user_stats_filter(), referred_filter()],
        data_slice: Some(DataSlice {
            offset: 0,
            length: 72,
        }),
        with_context: false,
    });

    let expected_filters = serde_json::to_value([user_stats_filter(), referred_filter()]).unwrap();

    assert_eq!(params, json!([program.to_string(), {
        "commitment": "confirmed",
        "encoding": "base64",
        "filters": expected_filters,
        "dataSlice": { "offset": 0, "length": 72 },
        "withContext": false,
    }]));
}

#[test]
fn data_slice_is_omitted_when_absent() {
    let params = program_accounts_params(&ProgramAccountsRequest {
        program: Pubkey::mock(1),
        commitment: Commitment::Finalized,
        filters: vec![],
        data_slice: None,
        with_context: true,
    });

    let options = &params[1];
    assert!(options.get("dataSlice").is_none());
    assert_eq!(options["commitment"], "finalized");
    assert_eq!(options["withContext"], true);
}
