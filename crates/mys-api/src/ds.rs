//! DS request signatures.
//!
//! The provider rejects signed requests unless the `DS` header carries
//! `"<t>,<r>,<md5>"`, where `t` is the current unix time in seconds, `r` a
//! random nonce and the hash covers a shared salt plus those two values:
//!
//! ```text
//! standard: md5("salt=<salt>&t=<t>&r=<r>&b=<body>&q=<query>")   r in 100000..=999999
//! sign-in:  md5("salt=<salt>&t=<t>&r=<r>")                       r = 6 chars of [a-z0-9]
//! ```
//!
//! Tokens are generated per request and never reused.

use rand::seq::SliceRandom;
use rand::{RngExt, rng};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::server::ServerFamily;

/// Salt for standard requests against domestic servers
pub const DOMESTIC_SALT: &str = "xV8v4Qu54lUKrEYFZkJhB8cuOh9Asafs";

/// Salt for standard requests against overseas servers
pub const OVERSEAS_SALT: &str = "okr4obncj8bw5a65hbnn5oo6ixjc3l9w";

/// Salt for sign-in grade requests
pub const SIGN_IN_SALT: &str = "jEpJb9rRARU2rXDA9qYbZ3selxkuct9a";

const NONCE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const NONCE_LEN: usize = 6;

fn standard_salt(family: ServerFamily) -> &'static str {
    match family {
        ServerFamily::Domestic => DOMESTIC_SALT,
        ServerFamily::Overseas => OVERSEAS_SALT,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn digest(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Compose a standard token from explicit time and nonce
pub fn standard_with(family: ServerFamily, t: u64, r: u32, query: &str, body: &str) -> String {
    let salt = standard_salt(family);
    let hash = digest(&format!("salt={salt}&t={t}&r={r}&b={body}&q={query}"));
    format!("{t},{r},{hash}")
}

/// Compose a sign-in token from explicit time and nonce
pub fn sign_in_with(t: u64, r: &str) -> String {
    let hash = digest(&format!("salt={SIGN_IN_SALT}&t={t}&r={r}"));
    format!("{t},{r},{hash}")
}

/// Fresh token for a standard request
pub fn standard(family: ServerFamily, query: &str, body: &str) -> String {
    let r = rng().random_range(100_000..=999_999);
    standard_with(family, unix_now(), r, query, body)
}

/// Fresh token for a sign-in grade request
pub fn sign_in() -> String {
    let mut alphabet = NONCE_ALPHABET.to_vec();
    alphabet.shuffle(&mut rng());
    let nonce: String = alphabet
        .into_iter()
        .take(NONCE_LEN)
        .map(char::from)
        .collect();
    sign_in_with(unix_now(), &nonce)
}
