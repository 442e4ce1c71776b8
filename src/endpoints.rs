//! Convenience wrappers for common operations.
//!
//! These only choose the path, method and parameters. Payloads come back
//! untouched as [`ApiResponse`]; interpreting them is up to the caller.

use crate::client::Lazada;
use crate::dispatch::ApiResponse;
use crate::params::ParameterSet;
use crate::types::*;
use crate::utils::StringValidator;

pub const SELLER_GET: &str = "/seller/get";
pub const ORDERS_GET: &str = "/orders/get";

/// Filters for `/orders/get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub status: String,
    /// ISO 8601 timestamp, e.g. `2024-01-31T09:00:00+08:00`
    pub created_after: Option<String>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            status: "pending".to_string(),
            created_after: None,
        }
    }
}

impl OrderQuery {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            created_after: None,
        }
    }

    pub fn created_after(mut self, timestamp: impl Into<String>) -> Self {
        self.created_after = Some(timestamp.into());
        self
    }

    pub fn to_params(&self) -> ApiResult<ParameterSet> {
        let status = StringValidator::not_empty(self.status.as_str(), "status")?;
        let mut params = ParameterSet::new().with("status", status);
        params.insert_opt("created_after", self.created_after.as_deref());
        Ok(params)
    }
}

impl Lazada {
    /// `GET /seller/get`
    pub async fn get_seller_info(&self) -> ApiResult<ApiResponse> {
        self.call(SELLER_GET, ParameterSet::new(), HttpMethod::Get).await
    }

    /// `GET /orders/get`
    pub async fn get_orders(&self, query: &OrderQuery) -> ApiResult<ApiResponse> {
        self.call(ORDERS_GET, query.to_params()?, HttpMethod::Get).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn default_query_is_pending_without_date() {
        let params = OrderQuery::default().to_params().unwrap();
        assert_eq!(params.get("status"), Some(&ParamValue::Text("pending".into())));
        assert!(!params.contains_key("created_after"));
    }

    #[test]
    fn created_after_is_included_when_set() {
        let params = OrderQuery::new("shipped")
            .created_after("2024-01-31T09:00:00+08:00")
            .to_params()
            .unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(
            params.get("created_after"),
            Some(&ParamValue::Text("2024-01-31T09:00:00+08:00".into()))
        );
    }

    #[test]
    fn empty_status_is_rejected() {
        let err = OrderQuery::new("").to_params().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }
}
