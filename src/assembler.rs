//! Request assembly.
//!
//! Merges caller parameters with the protocol fields (`app_key`, `timestamp`,
//! `sign_method`) into an unsigned set. Callers may never supply a protocol
//! key; a collision fails the call before anything is sent.

use crate::clock::Clock;
use crate::params::{ParameterSet, ACCESS_TOKEN, APP_KEY, SIGN_METHOD, TIMESTAMP};
use crate::signer::UnsignedParameters;
use crate::types::*;
use crate::utils::StringValidator;
use std::sync::Arc;

/// Builds unsigned parameter sets for one client configuration
#[derive(Clone)]
pub struct RequestAssembler {
    app_key: String,
    sign_method: String,
    clock: Arc<dyn Clock>,
}

impl RequestAssembler {
    pub fn new(app_key: impl Into<String>, sign_method: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            app_key: app_key.into(),
            sign_method: sign_method.into(),
            clock,
        }
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Merge protocol fields into `domain_params`, stamping the current time
    pub fn assemble(
        &self,
        path: &str,
        domain_params: ParameterSet,
        method: HttpMethod,
    ) -> ApiResult<UnsignedParameters> {
        self.assemble_at(path, domain_params, method, self.clock.now_millis())
    }

    /// Same as [`assemble`](Self::assemble) with an explicit timestamp
    pub fn assemble_at(
        &self,
        path: &str,
        domain_params: ParameterSet,
        method: HttpMethod,
        timestamp_ms: u64,
    ) -> ApiResult<UnsignedParameters> {
        validate_path(path)?;

        if let Some(key) = domain_params.reserved_key() {
            return Err(crate::configuration_error!(format!(
                "parameter '{}' is reserved for the protocol and cannot be supplied by callers",
                key
            )));
        }

        let mut params = domain_params;
        params.insert(APP_KEY, self.app_key.as_str());
        params.insert(TIMESTAMP, timestamp_ms);
        params.insert(SIGN_METHOD, self.sign_method.as_str());

        tracing::trace!(path, %method, params = params.len(), "assembled request parameters");
        Ok(UnsignedParameters { params })
    }

    /// Assemble a call made on behalf of a seller, adding `access_token`
    pub fn assemble_with_token(
        &self,
        path: &str,
        access_token: &str,
        domain_params: ParameterSet,
        method: HttpMethod,
    ) -> ApiResult<UnsignedParameters> {
        let token = StringValidator::not_empty(access_token, "access_token")?;
        let mut unsigned = self.assemble(path, domain_params, method)?;
        unsigned.params.insert(ACCESS_TOKEN, token);
        Ok(unsigned)
    }
}

fn validate_path(path: &str) -> ApiResult<()> {
    let path = StringValidator::not_empty(path, "path")?;
    if !path.starts_with('/') {
        return Err(ApiError::simple_configuration_error(format!(
            "path must start with '/', got '{}'",
            path
        )));
    }
    if path.contains('?') || path.contains('#') {
        return Err(ApiError::simple_configuration_error(format!(
            "path must not carry a query or fragment, got '{}'",
            path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::params::{ParamValue, SIGN};

    fn assembler(clock: FixedClock) -> RequestAssembler {
        RequestAssembler::new("123456", "sha256", Arc::new(clock))
    }

    #[test]
    fn adds_protocol_fields() {
        let unsigned = assembler(FixedClock::new(1_700_000_000_000))
            .assemble("/seller/get", ParameterSet::new(), HttpMethod::Get)
            .unwrap();

        let params = unsigned.params();
        assert_eq!(params.get(APP_KEY), Some(&ParamValue::Text("123456".into())));
        assert_eq!(params.get(SIGN_METHOD), Some(&ParamValue::Text("sha256".into())));
        assert_eq!(unsigned.timestamp(), Some(1_700_000_000_000));
        assert!(!params.contains_key(SIGN));
    }

    #[test]
    fn timestamp_is_read_per_call() {
        let clock = FixedClock::new(1_000);
        let assembler = assembler(clock.clone());

        let first = assembler.assemble("/p", ParameterSet::new(), HttpMethod::Get).unwrap();
        clock.advance(250);
        let second = assembler.assemble("/p", ParameterSet::new(), HttpMethod::Get).unwrap();

        assert_eq!(first.timestamp(), Some(1_000));
        assert_eq!(second.timestamp(), Some(1_250));
    }

    #[test]
    fn rejects_every_reserved_key() {
        let assembler = assembler(FixedClock::new(1));
        for key in ["app_key", "timestamp", "sign_method", "sign", "access_token"] {
            let params = ParameterSet::new().with(key, "caller");
            let err = assembler.assemble("/p", params, HttpMethod::Post).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigurationError, "key {}", key);
            assert!(err.message().contains(key));
        }
    }

    #[test]
    fn rejects_bad_paths() {
        let assembler = assembler(FixedClock::new(1));
        for path in ["", "seller/get", "/seller/get?x=1"] {
            let err = assembler.assemble(path, ParameterSet::new(), HttpMethod::Get).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigurationError, "path {:?}", path);
        }
    }

    #[test]
    fn access_token_is_added_after_collision_check() {
        let unsigned = assembler(FixedClock::new(1))
            .assemble_with_token("/orders/get", "tok", ParameterSet::new(), HttpMethod::Get)
            .unwrap();
        assert_eq!(unsigned.params().get(ACCESS_TOKEN), Some(&ParamValue::Text("tok".into())));
    }
}
