//! Uniswap V2 style router calldata
//!
//! Amounts are base units; slippage minimums and paths are chosen by the caller.

use ethers::abi::Token;
use ethers::types::{Address, U256};

/// swapExactTokensForTokens(uint256,uint256,address[],address,uint256)
pub const SWAP_EXACT_TOKENS_FOR_TOKENS_SELECTOR: [u8; 4] = [0x38, 0xed, 0x17, 0x39];

/// addLiquidity(address,address,uint256,uint256,uint256,uint256,address,uint256)
pub const ADD_LIQUIDITY_SELECTOR: [u8; 4] = [0xe8, 0xe3, 0x37, 0x00];

/// removeLiquidity(address,address,uint256,uint256,uint256,address,uint256)
pub const REMOVE_LIQUIDITY_SELECTOR: [u8; 4] = [0xba, 0xa2, 0xab, 0xde];

/// Default validity window for router deadlines
pub const DEFAULT_DEADLINE_SECS: i64 = 20 * 60;

#[derive(Debug, Clone)]
pub struct SwapParams {
    pub amount_in: U256,
    pub amount_out_min: U256,
    /// Token path, input first; must have at least two entries
    pub path: Vec<Address>,
    pub recipient: Address,
    pub deadline: U256,
}

#[derive(Debug, Clone)]
pub struct AddLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub recipient: Address,
    pub deadline: U256,
}

#[derive(Debug, Clone)]
pub struct RemoveLiquidityParams {
    /// LP token of the pair; approved to the router before removal
    pub pair: Address,
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub recipient: Address,
    pub deadline: U256,
}

/// Unix deadline `secs_from_now` seconds ahead
pub fn deadline_from_now(secs_from_now: i64) -> U256 {
    let ts = chrono::Utc::now().timestamp() + secs_from_now;
    U256::from(ts.max(0) as u64)
}

fn with_selector(selector: [u8; 4], tokens: &[Token]) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend_from_slice(&ethers::abi::encode(tokens));
    data
}

pub fn encode_swap_exact_tokens_for_tokens(params: &SwapParams) -> Result<Vec<u8>, String> {
    if params.path.len() < 2 {
        return Err(format!(
            "Swap path needs at least 2 tokens, got {}",
            params.path.len()
        ));
    }
    let path = params.path.iter().map(|a| Token::Address(*a)).collect();
    Ok(with_selector(
        SWAP_EXACT_TOKENS_FOR_TOKENS_SELECTOR,
        &[
            Token::Uint(params.amount_in),
            Token::Uint(params.amount_out_min),
            Token::Array(path),
            Token::Address(params.recipient),
            Token::Uint(params.deadline),
        ],
    ))
}

pub fn encode_add_liquidity(params: &AddLiquidityParams) -> Vec<u8> {
    with_selector(
        ADD_LIQUIDITY_SELECTOR,
        &[
            Token::Address(params.token_a),
            Token::Address(params.token_b),
            Token::Uint(params.amount_a_desired),
            Token::Uint(params.amount_b_desired),
            Token::Uint(params.amount_a_min),
            Token::Uint(params.amount_b_min),
            Token::Address(params.recipient),
            Token::Uint(params.deadline),
        ],
    )
}

pub fn encode_remove_liquidity(params: &RemoveLiquidityParams) -> Vec<u8> {
    with_selector(
        REMOVE_LIQUIDITY_SELECTOR,
        &[
            Token::Address(params.token_a),
            Token::Address(params.token_b),
            Token::Uint(params.liquidity),
            Token::Uint(params.amount_a_min),
            Token::Uint(params.amount_b_min),
            Token::Address(params.recipient),
            Token::Uint(params.deadline),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::ParamType;
    use ethers::utils::keccak256;

    #[test]
    fn test_selectors() {
        assert_eq!(
            SWAP_EXACT_TOKENS_FOR_TOKENS_SELECTOR,
            keccak256(b"swapExactTokensForTokens(uint256,uint256,address[],address,uint256)")[0..4]
        );
        assert_eq!(
            ADD_LIQUIDITY_SELECTOR,
            keccak256(b"addLiquidity(address,address,uint256,uint256,uint256,uint256,address,uint256)")[0..4]
        );
        assert_eq!(
            REMOVE_LIQUIDITY_SELECTOR,
            keccak256(b"removeLiquidity(address,address,uint256,uint256,uint256,address,uint256)")[0..4]
        );
    }

    #[test]
    fn test_swap_path_too_short() {
        let params = SwapParams {
            amount_in: U256::from(1),
            amount_out_min: U256::zero(),
            path: vec![Address::repeat_byte(1)],
            recipient: Address::repeat_byte(9),
            deadline: U256::from(1),
        };
        assert!(encode_swap_exact_tokens_for_tokens(&params).is_err());
    }

    #[test]
    fn test_swap_encoding_decodes_back() {
        let params = SwapParams {
            amount_in: U256::from(5_000_000u64),
            amount_out_min: U256::from(42u64),
            path: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            recipient: Address::repeat_byte(9),
            deadline: U256::from(1_700_000_000u64),
        };
        let data = encode_swap_exact_tokens_for_tokens(&params).unwrap();
        let tokens = ethers::abi::decode(
            &[
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Array(Box::new(ParamType::Address)),
                ParamType::Address,
                ParamType::Uint(256),
            ],
            &data[4..],
        )
        .unwrap();
        assert_eq!(tokens[0], Token::Uint(params.amount_in));
        assert_eq!(
            tokens[2],
            Token::Array(vec![
                Token::Address(Address::repeat_byte(1)),
                Token::Address(Address::repeat_byte(2)),
            ])
        );
        assert_eq!(tokens[3], Token::Address(params.recipient));
    }

    #[test]
    fn test_deadline_in_future() {
        let now = chrono::Utc::now().timestamp() as u64;
        assert!(deadline_from_now(DEFAULT_DEADLINE_SECS) > U256::from(now));
    }
}
