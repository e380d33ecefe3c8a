//! Request signing for authenticated Last.fm methods.
//!
//! The signature is the MD5 digest of every parameter key immediately followed
//! by its value, in ascending key order, with the shared secret appended. The
//! digest is carried under [`API_SIG_KEY`], which is never part of its own input.

use crate::ParameterSet;

/// Reserved parameter key that carries the request signature.
pub const API_SIG_KEY: &str = "api_sig";

/// Compute the signature of `params` with the API shared `secret`.
///
/// Any existing [`API_SIG_KEY`] entry is skipped, so re-signing a signed set
/// yields the same digest.
///
/// # Examples
///
/// ```rust
/// use lastfm_scrobble::{signer, ParameterSet};
///
/// let params: ParameterSet = [("method", "auth.getToken"), ("api_key", "K")]
///     .into_iter()
///     .collect();
///
/// let signature = signer::sign(&params, "secret");
/// assert_eq!(signature.len(), 32);
/// assert_eq!(signature, signer::sign(&params, "secret"));
/// ```
pub fn sign(params: &ParameterSet, secret: &str) -> String {
    let mut base = String::new();
    for (key, value) in params.iter().filter(|(key, _)| *key != API_SIG_KEY) {
        base.push_str(key);
        base.push_str(value);
    }
    base.push_str(secret);

    md5_hex(&base)
}

/// Sign `params` in place, storing the digest under [`API_SIG_KEY`].
pub fn apply_signature(params: &mut ParameterSet, secret: &str) {
    let signature = sign(params, secret);
    params.set(API_SIG_KEY, signature);
}

/// Lowercase hex MD5 digest of the UTF-8 bytes of `text`.
pub fn md5_hex(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}
