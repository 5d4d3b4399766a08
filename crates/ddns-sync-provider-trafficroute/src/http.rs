//! Signed request helper

use chrono::Utc;
use ddns_sync_core::{Error, Result, transport};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::sign::canonical_query;
use crate::types::TrafficRouteResponse;
use crate::{CONTENT_TYPE, PROVIDER, TRAFFIC_ROUTE_VERSION, TrafficRouteProvider};

impl TrafficRouteProvider {
    /// Sign and send one OpenAPI action, returning the decoded envelope
    ///
    /// `Action` and `Version` always travel in the query string; `params`
    /// are appended to it. `payload` is the JSON body (empty for GET).
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        action: &str,
        params: &[(&str, &str)],
        payload: String,
    ) -> Result<TrafficRouteResponse<T>> {
        let mut query_params = vec![("Action", action), ("Version", TRAFFIC_ROUTE_VERSION)];
        query_params.extend_from_slice(params);
        let query = canonical_query(&query_params);

        let signed = self.signer.sign(
            method.as_str(),
            &self.host,
            &query,
            &payload,
            Utc::now().timestamp(),
        )?;

        let request = self
            .client
            .request(method, format!("{}/?{}", self.endpoint, query))
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Date", signed.x_date)
            .header("X-Content-Sha256", signed.content_sha256)
            .header("Authorization", signed.authorization)
            .body(payload);

        let raw = transport::execute(PROVIDER, action, request).await?;
        let response: TrafficRouteResponse<T> = transport::decode(PROVIDER, &raw)?;

        if let Some(error) = response.api_error() {
            tracing::warn!(
                provider = PROVIDER,
                action,
                request_id = %response.metadata.request_id,
                code = %error.code,
                "TrafficRoute returned an error: {}",
                error.message
            );
        }

        Ok(response)
    }

    /// Like [`call`](Self::call), for reads: vendor errors and a missing
    /// `Result` become errors
    pub(crate) async fn read<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response: TrafficRouteResponse<T> =
            self.call(Method::GET, action, params, String::new()).await?;
        into_result(action, response)
    }
}

fn into_result<T>(action: &str, response: TrafficRouteResponse<T>) -> Result<T> {
    if let Some(error) = response.api_error() {
        return Err(Error::vendor(
            PROVIDER,
            error.code.clone(),
            error.message.clone(),
        ));
    }
    if !response.metadata.action.is_empty() && response.metadata.action != action {
        tracing::debug!(
            provider = PROVIDER,
            expected = action,
            actual = %response.metadata.action,
            "response metadata names a different action"
        );
    }
    response
        .result
        .ok_or_else(|| Error::decode(PROVIDER, format!("{action} response has no Result")))
}
