//! Generic contract call encoding from JSON arguments

use ethers::abi::{Abi, Function, ParamType, Token};
use ethers::types::{Address, I256, U256};
use serde_json::{json, Value};

/// Parse a JSON ABI array (as exported by solc or block explorers)
pub fn parse_abi(abi_json: &str) -> Result<Abi, String> {
    serde_json::from_str(abi_json).map_err(|e| format!("Failed to parse ABI: {}", e))
}

pub fn find_function<'a>(abi: &'a Abi, name: &str) -> Result<&'a Function, String> {
    abi.function(name)
        .map_err(|_| format!("Function '{}' not found in ABI", name))
}

/// Parse a decimal or 0x-prefixed hex integer
pub fn parse_u256(s: &str) -> Result<U256, String> {
    let s = s.trim();
    if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        U256::from_str_radix(hex_str, 16).map_err(|e| format!("Invalid hex integer '{}': {}", s, e))
    } else {
        U256::from_dec_str(s).map_err(|e| format!("Invalid integer '{}': {}", s, e))
    }
}

fn number_string(value: &Value, what: &str) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(format!("Expected string or number for {}, got {:?}", what, value)),
    }
}

fn hex_bytes(value: &Value, what: &str) -> Result<Vec<u8>, String> {
    let s = value
        .as_str()
        .ok_or_else(|| format!("Expected hex string for {}, got {:?}", what, value))?;
    let hex_str = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(hex_str).map_err(|e| format!("Invalid hex for {}: {}", what, e))
}

fn array_tokens(value: &Value, inner: &ParamType) -> Result<Vec<Token>, String> {
    let arr = value
        .as_array()
        .ok_or_else(|| format!("Expected array, got {:?}", value))?;
    arr.iter().map(|v| value_to_token(v, inner)).collect()
}

/// Convert a JSON value to an ABI token of the given type
pub fn value_to_token(value: &Value, param_type: &ParamType) -> Result<Token, String> {
    match param_type {
        ParamType::Address => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("Expected string for address, got {:?}", value))?;
            let addr: Address = s.parse().map_err(|_| format!("Invalid address: {}", s))?;
            Ok(Token::Address(addr))
        }
        ParamType::Uint(bits) => {
            let s = number_string(value, &format!("uint{}", bits))?;
            Ok(Token::Uint(parse_u256(&s)?))
        }
        ParamType::Int(bits) => {
            let s = number_string(value, &format!("int{}", bits))?;
            let n: I256 = s.parse().map_err(|_| format!("Invalid int{}: {}", bits, s))?;
            Ok(Token::Int(n.into_raw()))
        }
        ParamType::Bool => value
            .as_bool()
            .map(Token::Bool)
            .ok_or_else(|| format!("Expected boolean, got {:?}", value)),
        ParamType::String => value
            .as_str()
            .map(|s| Token::String(s.to_string()))
            .ok_or_else(|| format!("Expected string, got {:?}", value)),
        ParamType::Bytes => Ok(Token::Bytes(hex_bytes(value, "bytes")?)),
        ParamType::FixedBytes(size) => {
            let bytes = hex_bytes(value, &format!("bytes{}", size))?;
            if bytes.len() != *size {
                return Err(format!("Expected {} bytes, got {}", size, bytes.len()));
            }
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Array(inner) => Ok(Token::Array(array_tokens(value, inner)?)),
        ParamType::FixedArray(inner, size) => {
            let tokens = array_tokens(value, inner)?;
            if tokens.len() != *size {
                return Err(format!("Fixed array expects {} elements, got {}", size, tokens.len()));
            }
            Ok(Token::FixedArray(tokens))
        }
        ParamType::Tuple(types) => {
            let arr = value
                .as_array()
                .ok_or_else(|| format!("Expected array for tuple, got {:?}", value))?;
            if arr.len() != types.len() {
                return Err(format!("Tuple expects {} elements, got {}", types.len(), arr.len()));
            }
            let tokens: Result<Vec<Token>, String> = arr
                .iter()
                .zip(types.iter())
                .map(|(v, t)| value_to_token(v, t))
                .collect();
            Ok(Token::Tuple(tokens?))
        }
    }
}

/// Encode calldata for `function` from positional JSON arguments
pub fn encode_call(function: &Function, params: &[Value]) -> Result<Vec<u8>, String> {
    if params.len() != function.inputs.len() {
        return Err(format!(
            "Function '{}' expects {} parameters, got {}. Expected: {:?}",
            function.name,
            function.inputs.len(),
            params.len(),
            function
                .inputs
                .iter()
                .map(|i| format!("{}: {}", i.name, i.kind))
                .collect::<Vec<_>>()
        ));
    }

    let tokens: Vec<Token> = params
        .iter()
        .zip(function.inputs.iter())
        .map(|(value, input)| value_to_token(value, &input.kind))
        .collect::<Result<_, _>>()?;

    function
        .encode_input(&tokens)
        .map_err(|e| format!("Failed to encode function call: {}", e))
}

pub fn token_to_value(token: &Token) -> Value {
    match token {
        Token::Address(a) => json!(format!("{:?}", a)),
        Token::Uint(n) => json!(n.to_string()),
        Token::Int(n) => json!(I256::from_raw(*n).to_string()),
        Token::Bool(b) => json!(b),
        Token::String(s) => json!(s),
        Token::Bytes(b) | Token::FixedBytes(b) => json!(format!("0x{}", hex::encode(b))),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_value).collect())
        }
    }
}

/// Decode return data; a single output is unwrapped, several become an array
pub fn decode_return(function: &Function, data: &[u8]) -> Result<Value, String> {
    let tokens = function
        .decode_output(data)
        .map_err(|e| format!("Failed to decode return value: {}", e))?;

    let mut values: Vec<Value> = tokens.iter().map(token_to_value).collect();
    if values.len() == 1 {
        Ok(values.remove(0))
    } else {
        Ok(Value::Array(values))
    }
}
