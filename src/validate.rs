// src/validate.rs
//! Field-level request validation.
//!
//! Handlers pull raw JSON values out of the request and run them through a
//! [`Validator`], which records every bad field instead of stopping at the
//! first one. Required accessors hand back a zero value on failure; the
//! caller must call [`Validator::finish`] before using any of them.

use ethers::types::{Address, Bytes, U256};
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldError};
use crate::types::UserOperation;

/// Which user operation fields a route insists on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOpFields {
    /// Only `sender` is required; everything else defaults to zero/empty.
    Sponsorship,
    /// `sender`, `nonce` and `signature` are required.
    Submission,
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn address(&mut self, field: &str, value: Option<&Value>, message: &str) -> Address {
        match value.and_then(Value::as_str).and_then(parse_address) {
            Some(address) => address,
            None => {
                self.push(field, message);
                Address::zero()
            }
        }
    }

    pub fn uint(&mut self, field: &str, value: Option<&Value>, message: &str) -> U256 {
        match value.and_then(parse_uint) {
            Some(n) => n,
            None => {
                self.push(field, message);
                U256::zero()
            }
        }
    }

    /// Absent and `null` are both treated as "not supplied".
    pub fn optional_uint(&mut self, field: &str, value: Option<&Value>, message: &str) -> Option<U256> {
        match value {
            None | Some(Value::Null) => None,
            Some(v) => match parse_uint(v) {
                Some(n) => Some(n),
                None => {
                    self.push(field, message);
                    None
                }
            },
        }
    }

    pub fn optional_u64(&mut self, field: &str, value: Option<&Value>, message: &str) -> Option<u64> {
        let n = self.optional_uint(field, value, message)?;
        if n > U256::from(u64::MAX) {
            self.push(field, message);
            return None;
        }
        Some(n.as_u64())
    }

    pub fn hex(&mut self, field: &str, value: Option<&Value>, message: &str) -> Bytes {
        match value.and_then(Value::as_str).and_then(parse_hex) {
            Some(bytes) => bytes,
            None => {
                self.push(field, message);
                Bytes::default()
            }
        }
    }

    pub fn optional_hex(&mut self, field: &str, value: Option<&Value>, message: &str) -> Option<Bytes> {
        match value {
            None | Some(Value::Null) => None,
            Some(v) => match v.as_str().and_then(parse_hex) {
                Some(bytes) => Some(bytes),
                None => {
                    self.push(field, message);
                    None
                }
            },
        }
    }

    pub fn object<'a>(
        &mut self,
        field: &str,
        value: Option<&'a Value>,
        message: &str,
    ) -> Option<&'a Map<String, Value>> {
        let object = value.and_then(Value::as_object);
        if object.is_none() {
            self.push(field, message);
        }
        object
    }

    /// Reads a `userOp` object out of a request body. Missing optional fields
    /// fall back to zero or the empty byte string.
    pub fn user_operation(&mut self, value: Option<&Value>, fields: UserOpFields) -> UserOperation {
        let Some(op) = self.object("userOp", value, "userOp must be an object") else {
            return UserOperation::default();
        };

        let sender = self.address("userOp.sender", op.get("sender"), "Invalid sender");
        let (nonce, signature) = match fields {
            UserOpFields::Sponsorship => (
                self.optional_uint("userOp.nonce", op.get("nonce"), "Invalid nonce")
                    .unwrap_or_default(),
                self.optional_hex("userOp.signature", op.get("signature"), "Invalid signature")
                    .unwrap_or_default(),
            ),
            UserOpFields::Submission => (
                self.uint("userOp.nonce", op.get("nonce"), "Invalid nonce"),
                self.hex("userOp.signature", op.get("signature"), "Invalid signature"),
            ),
        };

        let mut gas = |name: &str| {
            self.optional_uint(
                &format!("userOp.{name}"),
                op.get(name),
                &format!("{name} must be numeric"),
            )
            .unwrap_or_default()
        };
        let call_gas_limit = gas("callGasLimit");
        let verification_gas_limit = gas("verificationGasLimit");
        let pre_verification_gas = gas("preVerificationGas");
        let max_fee_per_gas = gas("maxFeePerGas");
        let max_priority_fee_per_gas = gas("maxPriorityFeePerGas");

        let mut bytes = |name: &str| {
            self.optional_hex(
                &format!("userOp.{name}"),
                op.get(name),
                &format!("Invalid {name}"),
            )
            .unwrap_or_default()
        };
        let init_code = bytes("initCode");
        let call_data = bytes("callData");
        let paymaster_and_data = bytes("paymasterAndData");

        UserOperation {
            sender,
            nonce,
            init_code,
            call_data,
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            paymaster_and_data,
            signature,
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// `0x` followed by exactly 40 hex digits, any case.
pub fn parse_address(s: &str) -> Option<Address> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    digits.parse().ok()
}

/// Non-negative integer given as a JSON number, a decimal string or a
/// `0x`-prefixed hex string.
pub fn parse_uint(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => {
            let s = s.trim();
            if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                if digits.is_empty() {
                    return None;
                }
                U256::from_str_radix(digits, 16).ok()
            } else if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                U256::from_dec_str(s).ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Hex bytes with an optional `0x` prefix and an even number of digits.
/// A bare `0x` is the empty byte string.
pub fn parse_hex(s: &str) -> Option<Bytes> {
    if s.is_empty() {
        return None;
    }
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    hex::decode(digits).ok().map(Bytes::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn addresses_require_prefix_and_length() {
        assert!(parse_address("0x1111111111111111111111111111111111111111").is_some());
        assert!(parse_address("0xB84032Dc53A9d87cA283aE10a1DACFBb648E83Ef").is_some());
        assert!(parse_address("1111111111111111111111111111111111111111").is_none());
        assert!(parse_address("0x11111111111111111111111111111111111111").is_none());
        assert!(parse_address("0x111111111111111111111111111111111111111g").is_none());
    }

    #[test]
    fn uints_accept_numbers_and_strings() {
        assert_eq!(parse_uint(&json!(7)), Some(U256::from(7)));
        assert_eq!(parse_uint(&json!("42")), Some(U256::from(42)));
        assert_eq!(parse_uint(&json!("0x2a")), Some(U256::from(42)));
        assert_eq!(parse_uint(&json!(-1)), None);
        assert_eq!(parse_uint(&json!(1.5)), None);
        assert_eq!(parse_uint(&json!("1.5")), None);
        assert_eq!(parse_uint(&json!("abc")), None);
        assert_eq!(parse_uint(&json!("")), None);
        assert_eq!(parse_uint(&json!(true)), None);
    }

    #[test]
    fn hex_strings() {
        assert_eq!(parse_hex("0xdeadbeef").unwrap().as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(parse_hex("deadbeef").unwrap().len(), 4);
        assert!(parse_hex("0x").unwrap().is_empty());
        assert!(parse_hex("").is_none());
        assert!(parse_hex("0xabc").is_none());
        assert!(parse_hex("not-hex").is_none());
    }

    #[test]
    fn collects_every_bad_field() {
        let body = json!({
            "userOp": {
                "sender": "0x1234",
                "nonce": "one",
                "signature": "zz"
            }
        });

        let mut v = Validator::default();
        v.user_operation(body.get("userOp"), UserOpFields::Submission);
        let err = v.finish().unwrap_err();

        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["userOp.sender", "userOp.nonce", "userOp.signature"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sponsorship_defaults_missing_fields() {
        let body = json!({
            "userOp": {
                "sender": "0x1111111111111111111111111111111111111111",
                "callData": "0x01",
                "callGasLimit": 100000
            }
        });

        let mut v = Validator::default();
        let op = v.user_operation(body.get("userOp"), UserOpFields::Sponsorship);
        v.finish().unwrap();

        assert_eq!(op.nonce, U256::zero());
        assert!(op.init_code.is_empty());
        assert!(op.signature.is_empty());
        assert_eq!(op.call_gas_limit, U256::from(100_000));
        assert_eq!(op.call_data.as_ref(), &[0x01]);
    }

    #[test]
    fn user_op_must_be_an_object() {
        let mut v = Validator::default();
        v.user_operation(Some(&json!("nope")), UserOpFields::Sponsorship);
        assert!(matches!(v.finish(), Err(ApiError::Validation(e)) if e[0].field == "userOp"));
    }
}
