//! # lazada-rs: a signed-request client for the Lazada Open Platform
//!
//! Every call goes through the same three steps:
//!
//! - **Assemble**: caller parameters are merged with the protocol fields
//!   (`app_key`, `timestamp`, `sign_method`). Callers cannot supply those keys.
//! - **Sign**: the path and the key-sorted parameters are concatenated and
//!   MAC'd with the app secret; the result is attached as `sign`.
//! - **Dispatch**: GET sends the parameters as a query string, POST as a JSON
//!   body. Exactly one HTTP exchange happens, and the outcome is classified
//!   into an [`ApiResponse`] or an [`ApiError`] with an [`ErrorKind`].
//!
//! ## Basic Usage
//!
//! ```no_run
//! use lazada_rs::{from_env, HttpMethod, ParameterSet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads LAZADA_APP_KEY / LAZADA_APP_SECRET
//!     let lazada = from_env()?;
//!
//!     let params = ParameterSet::new().with("status", "pending");
//!     match lazada.call("/orders/get", params, HttpMethod::Get).await {
//!         Ok(response) => println!("{}", response.payload),
//!         Err(err) => eprintln!("{} failed: {}", err.kind(), err),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod params;
pub mod clock;
pub mod config;
pub mod assembler;
pub mod signer;
pub mod dispatch;
pub mod client;
pub mod endpoints;
pub mod generation;
pub mod utils;

// Re-export core components
pub use client::Lazada;
pub use types::{ApiError, ApiResult, ErrorKind, HttpMethod, SecureAppSecret, SignMethod, sanitize_error_message};
pub use params::{ParamValue, ParameterSet};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ClientConfig, ClientConfigBuilder, Region, TlsConfig};
pub use assembler::RequestAssembler;
pub use signer::{HmacSigner, RequestSigner, SignedParameters, UnsignedParameters};
pub use dispatch::{ApiResponse, OutgoingRequest, RawResponse, ReqwestTransport, Transport};
pub use endpoints::OrderQuery;
pub use generation::{TitleGenerator, TitleRequest};

pub mod prelude {
    //! Convenient imports for commonly used types and functions
    pub use crate::{
        from_env, new_client, ApiError, ApiResponse, ApiResult, ClientConfig, ErrorKind, HttpMethod,
        Lazada, OrderQuery, ParameterSet, Region, SignMethod,
    };
}

// Entry point functions
pub fn new_client(app_key: impl Into<String>, app_secret: impl Into<String>) -> ApiResult<Lazada> {
    Lazada::new(app_key, app_secret)
}

pub fn from_env() -> ApiResult<Lazada> {
    Lazada::from_config(ClientConfig::from_env()?)
}
