use ethers::{
    contract::{abigen, ContractError},
    providers::Middleware,
    types::{Address, TransactionReceipt, H256, U256},
    utils::{format_units, parse_units, ParseUnits},
};
use log::{debug, info, warn};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;

abigen!(
    Erc20,
    r#"[
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);

#[derive(Error, Debug, PartialEq)]
pub enum Erc20Error {
    #[error("Token Not Exist")]
    TokenNotExist,

    #[error("Not a valid address")]
    InvalidAddress,

    #[error("Spender is not a smart contract")]
    NotAContract,

    #[error("Invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("No account connected")]
    NoAccount,

    #[error("Transaction {0:?} was dropped")]
    Dropped(H256),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

fn contract_err<M: Middleware>(err: ContractError<M>) -> Erc20Error {
    Erc20Error::Contract(err.to_string())
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpenderInfo {
    pub address: Address,
    pub allowance: U256,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApprovalOutcome {
    /// `false` when the transaction was mined but reverted
    pub status: bool,
    pub tx_hash: H256,
    pub allowance: U256,
}

pub fn parse_address(address: &str) -> Option<Address> {
    let address = address.trim();
    let hex = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X"))?;
    if hex.len() != 40 {
        return None;
    }
    Address::from_str(hex).ok()
}

/// Decimal token amount to its on-chain integer, without going through floats.
/// Amounts finer than the token's smallest unit are rejected, never rounded.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, Erc20Error> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let fraction = fraction.trim_end_matches('0');
    // U256 holds 77 full decimal digits
    let too_large = whole.trim_start_matches('0').len() + decimals as usize > 77;
    if amount.is_empty() || fraction.len() > decimals as usize || too_large {
        return Err(Erc20Error::InvalidAmount(amount.to_string()));
    }
    match parse_units(amount, decimals as u32) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        _ => Err(Erc20Error::InvalidAmount(amount.to_string())),
    }
}

/// On-chain integer to a human readable amount, trailing zeros removed
pub fn format_amount(raw: U256, decimals: u8) -> String {
    match format_units(raw, decimals as u32) {
        Ok(formatted) if formatted.contains('.') => {
            formatted.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        Ok(formatted) => formatted,
        Err(_) => raw.to_string(),
    }
}

/// Reads symbol and decimals of the token at `address`
pub async fn load_token<M: Middleware + 'static>(
    client: Arc<M>,
    address: &str,
) -> Result<Token, Erc20Error> {
    let address = parse_address(address).ok_or(Erc20Error::TokenNotExist)?;
    let contract = Erc20::new(address, client);
    let symbol = contract.symbol().call().await.map_err(contract_err)?;
    let decimals = contract.decimals().call().await.map_err(contract_err)?;
    debug!("Loaded token {symbol} at {address:?} with {decimals} decimals");
    Ok(Token { address, symbol, decimals })
}

/// Checks that `spender` is a contract and reads how much of `token` it may
/// move on behalf of `owner`
pub async fn load_spender<M: Middleware + 'static>(
    client: Arc<M>,
    token: &Token,
    owner: Option<Address>,
    spender: &str,
) -> Result<SpenderInfo, Erc20Error> {
    let spender = parse_address(spender).ok_or(Erc20Error::InvalidAddress)?;
    let code = client
        .get_code(spender, None)
        .await
        .map_err(|e| Erc20Error::Provider(e.to_string()))?;
    if code.is_empty() {
        return Err(Erc20Error::NotAContract);
    }
    let owner = owner.ok_or(Erc20Error::NoAccount)?;
    let contract = Erc20::new(token.address, client);
    let allowance = contract.allowance(owner, spender).call().await.map_err(contract_err)?;
    Ok(SpenderInfo { address: spender, allowance })
}

/// Sends `approve(spender, amount)` from `owner` and waits for it to be mined
pub async fn approve<M: Middleware + 'static>(
    client: Arc<M>,
    token: &Token,
    owner: Option<Address>,
    spender: Address,
    amount: &str,
) -> Result<ApprovalOutcome, Erc20Error> {
    let owner = owner.ok_or(Erc20Error::NoAccount)?;
    let amount = parse_amount(amount, token.decimals)?;
    let contract = Erc20::new(token.address, client);

    let call = contract.approve(spender, amount).from(owner);
    let pending = call.send().await.map_err(contract_err)?;
    let tx_hash = pending.tx_hash();
    info!("Approval {tx_hash:?} sent, awaiting confirmation");

    let receipt = pending.await.map_err(|e| Erc20Error::Provider(e.to_string()))?;
    settle(&contract, owner, spender, tx_hash, receipt).await
}

/// Turns the receipt of an approval into its outcome and reads the allowance
/// left afterwards. A reverted transaction is an outcome, not an error.
async fn settle<M: Middleware + 'static>(
    contract: &Erc20<M>,
    owner: Address,
    spender: Address,
    tx_hash: H256,
    receipt: Option<TransactionReceipt>,
) -> Result<ApprovalOutcome, Erc20Error> {
    let receipt = receipt.ok_or(Erc20Error::Dropped(tx_hash))?;
    let status = receipt.status.map(|s| s.as_u64() == 1).unwrap_or(false);
    if !status {
        warn!("Approval {tx_hash:?} reverted");
    }

    let allowance = contract.allowance(owner, spender).call().await.map_err(contract_err)?;
    Ok(ApprovalOutcome { status, tx_hash, allowance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        abi::{encode, Token as AbiToken},
        providers::{MockProvider, Provider},
        types::Bytes,
    };
    use futures::executor::block_on;

    const TOKEN: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
    const SPENDER: &str = "0xBE565E3eEFcfd58920FfB5048292f67F431356eF";

    fn token() -> Token {
        Token { address: parse_address(TOKEN).unwrap(), symbol: "USDT".into(), decimals: 6 }
    }

    #[test]
    fn addresses_need_prefix_and_length() {
        assert!(parse_address(TOKEN).is_some());
        assert!(parse_address(&TOKEN.to_lowercase()).is_some());
        assert!(parse_address(" 0xBE565E3eEFcfd58920FfB5048292f67F431356eF ").is_some());
        assert!(parse_address("BE565E3eEFcfd58920FfB5048292f67F431356eF").is_none());
        assert!(parse_address("0xBE565E3eEFcfd58920FfB5048292f67F431356").is_none());
        assert!(parse_address("0xZZ565E3eEFcfd58920FfB5048292f67F431356eF").is_none());
        assert!(parse_address("").is_none());
    }

    #[test]
    fn amounts_are_exact() {
        assert_eq!(parse_amount("1.5", 6), Ok(U256::from(1_500_000u64)));
        assert_eq!(parse_amount("0", 18), Ok(U256::zero()));
        assert_eq!(
            parse_amount("0.1", 18),
            Ok(U256::from_dec_str("100000000000000000").unwrap())
        );
        assert_eq!(
            parse_amount("12345678901234567890", 18),
            Ok(U256::from_dec_str("12345678901234567890000000000000000000").unwrap())
        );
    }

    #[test]
    fn bad_amounts_are_rejected() {
        assert_eq!(parse_amount("", 6), Err(Erc20Error::InvalidAmount("".into())));
        assert!(parse_amount("abc", 6).is_err());
        assert!(parse_amount("-1", 6).is_err());
        assert_eq!(
            parse_amount("1.0000009", 6),
            Err(Erc20Error::InvalidAmount("1.0000009".into()))
        );
        assert_eq!(
            parse_amount("0.0000001", 6),
            Err(Erc20Error::InvalidAmount("0.0000001".into()))
        );
        assert!(parse_amount("0.5", 0).is_err());
        assert!(parse_amount(&"9".repeat(70), 18).is_err());
    }

    #[test]
    fn trailing_zeros_past_decimals_are_exact() {
        assert_eq!(parse_amount("1.50000000", 6), Ok(U256::from(1_500_000u64)));
        assert_eq!(parse_amount("7.", 2), Ok(U256::from(700u64)));
    }

    #[test]
    fn formatting_drops_trailing_zeros() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::zero(), 6), "0");
        assert_eq!(format_amount(U256::from(42u64), 0), "42");
        assert_eq!(format_amount(U256::from(1u64), 18), "0.000000000000000001");
    }

    #[test]
    fn invalid_token_address() {
        let (provider, _mock) = Provider::mocked();
        let err = block_on(load_token(Arc::new(provider), "0x1234")).unwrap_err();
        assert_eq!(err, Erc20Error::TokenNotExist);
    }

    #[test]
    fn token_metadata_is_read() {
        let (provider, mock) = Provider::mocked();
        // mocked responses are served last in, first out
        mock.push::<Bytes, _>(Bytes::from(encode(&[AbiToken::Uint(U256::from(6u64))]))).unwrap();
        mock.push::<Bytes, _>(Bytes::from(encode(&[AbiToken::String("USDT".into())]))).unwrap();

        let loaded = block_on(load_token(Arc::new(provider), TOKEN)).unwrap();
        assert_eq!(loaded, token());
    }

    #[test]
    fn spender_without_code_is_not_a_contract() {
        let (provider, mock) = Provider::mocked();
        mock.push::<Bytes, _>(Bytes::default()).unwrap();

        let err = block_on(load_spender(
            Arc::new(provider),
            &token(),
            Some(Address::zero()),
            SPENDER,
        ))
        .unwrap_err();
        assert_eq!(err, Erc20Error::NotAContract);
    }

    #[test]
    fn spender_allowance_is_read() {
        let (provider, mock) = Provider::mocked();
        mock.push::<Bytes, _>(Bytes::from(encode(&[AbiToken::Uint(U256::from(2_500_000u64))])))
            .unwrap();
        mock.push::<Bytes, _>(Bytes::from(vec![0x60, 0x80])).unwrap();

        let info =
            block_on(load_spender(Arc::new(provider), &token(), Some(Address::zero()), SPENDER))
                .unwrap();
        assert_eq!(info.address, parse_address(SPENDER).unwrap());
        assert_eq!(format_amount(info.allowance, 6), "2.5");
    }

    #[test]
    fn invalid_spender_address() {
        let (provider, _mock) = Provider::mocked();
        let err =
            block_on(load_spender(Arc::new(provider), &token(), None, "spender")).unwrap_err();
        assert_eq!(err, Erc20Error::InvalidAddress);
    }

    #[test]
    fn approve_needs_an_account_and_a_valid_amount() {
        let (provider, _mock) = Provider::mocked();
        let client = Arc::new(provider);
        let spender = parse_address(SPENDER).unwrap();

        let err = block_on(approve(client.clone(), &token(), None, spender, "1")).unwrap_err();
        assert_eq!(err, Erc20Error::NoAccount);

        let err = block_on(approve(client, &token(), Some(Address::zero()), spender, "one"))
            .unwrap_err();
        assert_eq!(err, Erc20Error::InvalidAmount("one".into()));
    }

    fn receipt(status: Option<u64>) -> Option<TransactionReceipt> {
        Some(TransactionReceipt {
            transaction_hash: H256::repeat_byte(0xab),
            status: status.map(Into::into),
            ..Default::default()
        })
    }

    fn settle_with(
        receipt: Option<TransactionReceipt>,
        allowance: u64,
    ) -> Result<ApprovalOutcome, Erc20Error> {
        let (provider, mock) = Provider::mocked();
        mock.push::<Bytes, _>(Bytes::from(encode(&[AbiToken::Uint(U256::from(allowance))])))
            .unwrap();
        let contract = Erc20::new(token().address, Arc::new(provider));
        block_on(settle(
            &contract,
            Address::zero(),
            parse_address(SPENDER).unwrap(),
            H256::repeat_byte(0xab),
            receipt,
        ))
    }

    #[test]
    fn mined_approval_rereads_allowance() {
        let outcome = settle_with(receipt(Some(1)), 3_000_000).unwrap();
        assert!(outcome.status);
        assert_eq!(outcome.tx_hash, H256::repeat_byte(0xab));
        assert_eq!(format_amount(outcome.allowance, 6), "3");
    }

    #[test]
    fn reverted_approval_is_a_failed_outcome() {
        let outcome = settle_with(receipt(Some(0)), 2_500_000).unwrap();
        assert!(!outcome.status);
        assert_eq!(format_amount(outcome.allowance, 6), "2.5");
    }

    #[test]
    fn receipt_without_status_counts_as_failed() {
        assert!(!settle_with(receipt(None), 0).unwrap().status);
    }

    #[test]
    fn dropped_approval_is_an_error() {
        let err = settle_with(None, 0).unwrap_err();
        assert_eq!(err, Erc20Error::Dropped(H256::repeat_byte(0xab)));
    }
}
