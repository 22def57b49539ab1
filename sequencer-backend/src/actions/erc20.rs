//! ERC20 ABI encoding/decoding helpers
//!
//! Manual ABI encoding for the token calls the action functions make.

use ethers::abi::{AbiDecode, Token};
use ethers::types::{Address, U256};

/// Function selector for transfer(address,uint256)
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Function selector for approve(address,uint256)
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// Function selector for allowance(address,address)
pub const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// Function selector for balanceOf(address)
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

fn with_selector(selector: [u8; 4], tokens: &[Token]) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend_from_slice(&ethers::abi::encode(tokens));
    data
}

/// Encode a transfer(address,uint256) call
pub fn encode_transfer(to: Address, amount: U256) -> Vec<u8> {
    with_selector(TRANSFER_SELECTOR, &[Token::Address(to), Token::Uint(amount)])
}

/// Encode an approve(address,uint256) call
pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
    with_selector(APPROVE_SELECTOR, &[Token::Address(spender), Token::Uint(amount)])
}

/// Encode an allowance(address,address) call
pub fn encode_allowance(owner: Address, spender: Address) -> Vec<u8> {
    with_selector(ALLOWANCE_SELECTOR, &[Token::Address(owner), Token::Address(spender)])
}

/// Encode a balanceOf(address) call
pub fn encode_balance_of(address: Address) -> Vec<u8> {
    with_selector(BALANCE_OF_SELECTOR, &[Token::Address(address)])
}

/// Decode a single uint256 return word
pub fn decode_uint256(data: &[u8]) -> Result<U256, String> {
    if data.len() < 32 {
        return Err(format!("uint256 response too short: {} bytes", data.len()));
    }
    U256::decode(&data[..32]).map_err(|e| format!("Failed to decode uint256: {}", e))
}
