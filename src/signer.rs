//! Request signing.
//!
//! The canonical string is the API path followed by every parameter in
//! ascending key order, written as `key` + `value` with no separators.
//! The `sign` key itself is never part of it. The MAC over that string,
//! keyed with the app secret, is rendered as uppercase hex.
//!
//! ```
//! use lazada_rs::signer::{canonicalize, HmacSigner, RequestSigner};
//! use lazada_rs::{ParameterSet, SignMethod};
//!
//! let params = ParameterSet::from([("b", "2"), ("a", "1")]);
//! assert_eq!(canonicalize("/seller/get", &params), "/seller/geta1b2");
//!
//! let signer = HmacSigner::new("secret", SignMethod::HmacSha256);
//! let sign = signer.sign("/seller/get", &params);
//! assert_eq!(sign.len(), 64);
//! ```

use crate::params::{ParamValue, ParameterSet, SIGN, SIGN_METHOD};
use crate::types::*;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// Computes the `sign` field for a parameter set
pub trait RequestSigner: Send + Sync {
    /// Value written into the `sign_method` protocol field
    fn sign_method(&self) -> &str;

    /// Signature over `path` and every parameter except `sign`
    fn sign(&self, path: &str, params: &ParameterSet) -> String;
}

/// Build the canonical string that gets signed
pub fn canonicalize(path: &str, params: &ParameterSet) -> String {
    let mut canonical = String::with_capacity(path.len() + params.len() * 16);
    canonical.push_str(path);
    for (key, value) in params.iter().filter(|(key, _)| key.as_str() != SIGN) {
        canonical.push_str(key);
        canonical.push_str(&value.to_string());
    }
    canonical
}

/// HMAC signer keyed with the app secret
#[derive(Clone)]
pub struct HmacSigner {
    secret: SecureAppSecret,
    method: SignMethod,
}

impl HmacSigner {
    pub fn new(secret: impl Into<String>, method: SignMethod) -> Self {
        Self {
            secret: SecureAppSecret::new(secret),
            method,
        }
    }

    pub(crate) fn from_secret(secret: SecureAppSecret, method: SignMethod) -> Self {
        Self { secret, method }
    }

    fn mac_hex(&self, message: &[u8]) -> String {
        let bytes = match self.method {
            SignMethod::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
                    .expect("HMAC can take key of any size");
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            SignMethod::HmacSha1 => {
                let mut mac = HmacSha1::new_from_slice(self.secret.as_bytes())
                    .expect("HMAC can take key of any size");
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        };
        hex::encode_upper(bytes)
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("secret", &self.secret)
            .field("method", &self.method)
            .finish()
    }
}

impl RequestSigner for HmacSigner {
    fn sign_method(&self) -> &str {
        self.method.tag()
    }

    fn sign(&self, path: &str, params: &ParameterSet) -> String {
        self.mac_hex(canonicalize(path, params).as_bytes())
    }
}

/// Parameter set produced by the assembler, not yet signed
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedParameters {
    pub(crate) params: ParameterSet,
}

impl UnsignedParameters {
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Timestamp the assembler stamped on this set
    pub fn timestamp(&self) -> Option<u64> {
        match self.params.get(crate::params::TIMESTAMP) {
            Some(ParamValue::Unsigned(ts)) => Some(*ts),
            _ => None,
        }
    }

    /// Attach the signature. The result cannot be modified further.
    pub fn sign(self, path: &str, signer: &dyn RequestSigner) -> ApiResult<SignedParameters> {
        let declared = self.params.get(SIGN_METHOD).map(ToString::to_string);
        if declared.as_deref() != Some(signer.sign_method()) {
            return Err(crate::configuration_error!(format!(
                "sign_method {:?} does not match signer '{}'",
                declared,
                signer.sign_method()
            )));
        }

        let signature = signer.sign(path, &self.params);
        let mut params = self.params;
        params.insert(SIGN, signature);
        Ok(SignedParameters { params })
    }
}

/// Parameter set with its `sign` field attached. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SignedParameters {
    params: ParameterSet,
}

impl SignedParameters {
    pub fn signature(&self) -> &str {
        match self.params.get(SIGN) {
            Some(ParamValue::Text(sign)) => sign,
            _ => "",
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `application/x-www-form-urlencoded` rendering for GET requests
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, &value.to_string());
        }
        serializer.finish()
    }

    /// JSON object rendering for POST bodies
    pub fn to_json_body(&self) -> ApiResult<Vec<u8>> {
        serde_json::to_vec(&self.params)
            .map_err(|e| ApiError::configuration_error(format!("failed to serialize parameters: {}", e), None))
    }
}
