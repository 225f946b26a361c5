//! Deterministic names for generated classes and parameters.

use sha2::{Digest, Sha256};

/// Prefix of every generated class name.
pub const CLASS_PREFIX: &str = "Rtc";

const HASH_CHARS: usize = 12;

/// Name of the class generated for the contract `contract_name`.
///
/// The same contract name always maps to the same class name.
pub fn class_name_for(contract_name: &str) -> String {
    let digest = Sha256::digest(contract_name.as_bytes());
    let hash = hex::encode(digest);
    format!("{}{}", CLASS_PREFIX, &hash[..HASH_CHARS])
}

/// Positional parameter name: `par0`, `par1`, ...
pub fn param_name(index: usize) -> String {
    format!("par{}", index)
}
