// Core Client Implementation

use crate::assembler::RequestAssembler;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::dispatch::{map_response, ApiResponse, OutgoingRequest, ReqwestTransport, Transport};
use crate::params::ParameterSet;
use crate::signer::{HmacSigner, RequestSigner, SignedParameters, UnsignedParameters};
use crate::types::*;
use futures::future::{self, Either};
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

/// Signed-request client for the Lazada Open Platform.
///
/// Cheap to clone; clones share configuration, signer, transport and clock.
/// Nothing is mutated after construction, so one client can serve any
/// number of concurrent calls.
#[derive(Clone)]
pub struct Lazada {
    config: Arc<ClientConfig>,
    assembler: RequestAssembler,
    signer: Arc<dyn RequestSigner>,
    transport: Arc<dyn Transport>,
}

impl Lazada {
    /// Create a client with the default gateway and HMAC-SHA256 signing
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> ApiResult<Self> {
        Self::from_config(ClientConfig::builder(app_key, app_secret).build()?)
    }

    /// Create a client backed by `reqwest`
    pub fn from_config(config: ClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client that sends through a caller-supplied transport
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        let signer = HmacSigner::from_secret(config.app_secret().clone(), config.sign_method());
        let assembler = RequestAssembler::new(
            config.app_key(),
            signer.sign_method(),
            Arc::new(SystemClock::new()),
        );

        Self {
            config: Arc::new(config),
            assembler,
            signer: Arc::new(signer),
            transport: Arc::new(transport),
        }
    }

    /// Replace the signer. The `sign_method` tag follows the new signer.
    pub fn with_signer(mut self, signer: impl RequestSigner + 'static) -> Self {
        self.assembler = RequestAssembler::new(
            self.config.app_key(),
            signer.sign_method(),
            self.assembler_clock(),
        );
        self.signer = Arc::new(signer);
        self
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.assembler = RequestAssembler::new(
            self.config.app_key(),
            self.signer.sign_method(),
            Arc::new(clock),
        );
        self
    }

    fn assembler_clock(&self) -> Arc<dyn Clock> {
        self.assembler.clock()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    pub fn assembler(&self) -> &RequestAssembler {
        &self.assembler
    }

    /// Assemble, sign and send one request.
    ///
    /// Every failure comes back as an `ApiError`; nothing panics and no
    /// transport error escapes unclassified.
    pub async fn call(
        &self,
        path: &str,
        params: ParameterSet,
        method: HttpMethod,
    ) -> ApiResult<ApiResponse> {
        let span = tracing::debug_span!("lazada_call", path, %method);
        async move {
            let unsigned = self.assembler.assemble(path, params, method)?;
            self.sign_and_send(path, unsigned, method).await
        }
        .instrument(span)
        .await
    }

    /// Like [`call`](Self::call), on behalf of a seller holding `access_token`
    pub async fn call_with_token(
        &self,
        path: &str,
        access_token: &str,
        params: ParameterSet,
        method: HttpMethod,
    ) -> ApiResult<ApiResponse> {
        let span = tracing::debug_span!("lazada_call", path, %method, authorized = true);
        async move {
            let unsigned = self.assembler.assemble_with_token(path, access_token, params, method)?;
            self.sign_and_send(path, unsigned, method).await
        }
        .instrument(span)
        .await
    }

    /// Like [`call`](Self::call), abandoned as soon as `cancel` resolves.
    ///
    /// The in-flight transport future is dropped, which aborts the HTTP
    /// request, and the call returns `ApiError::Cancelled`.
    pub async fn call_cancellable<C>(
        &self,
        path: &str,
        params: ParameterSet,
        method: HttpMethod,
        cancel: C,
    ) -> ApiResult<ApiResponse>
    where
        C: Future<Output = ()> + Send,
    {
        let call = Box::pin(self.call(path, params, method));
        let cancel = Box::pin(cancel);

        match future::select(call, cancel).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _abandoned)) => {
                tracing::debug!(path, %method, "call cancelled before completion");
                Err(ApiError::cancelled(format!("{} {} was cancelled", method, path)))
            }
        }
    }

    /// Sign an assembled set and dispatch it once
    pub async fn sign_and_send(
        &self,
        path: &str,
        unsigned: UnsignedParameters,
        method: HttpMethod,
    ) -> ApiResult<ApiResponse> {
        let signed = self.sign(path, unsigned)?;
        let request = OutgoingRequest::build(&self.config.endpoint(path), method, &signed)?;

        tracing::debug!(url = request.redacted_url(), %method, "dispatching request");
        let raw = self.transport.execute(request).await?;
        tracing::debug!(status = raw.status, bytes = raw.body.len(), "received response");

        map_response(raw)
    }

    /// Attach the signature without sending
    pub fn sign(&self, path: &str, unsigned: UnsignedParameters) -> ApiResult<SignedParameters> {
        unsigned.sign(path, self.signer.as_ref())
    }
}

impl std::fmt::Debug for Lazada {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazada")
            .field("config", &self.config)
            .field("sign_method", &self.signer.sign_method())
            .finish_non_exhaustive()
    }
}
