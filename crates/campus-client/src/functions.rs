//! Remote procedure invocation.

use campus_core::RemoteError;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use crate::http::BackendClient;

impl BackendClient {
    /// Calls the procedure `name` with a JSON body.
    ///
    /// A success status whose body carries an `error` field is still a failure.
    #[instrument(skip(self, body))]
    pub async fn invoke<B, R>(&self, name: &str, body: &B) -> Result<R, RemoteError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, &self.config().function_url(name))
            .json(body);
        let value: Value = self.send_json(request).await?;
        decode_result(value)
    }
}

fn decode_result<R: DeserializeOwned>(value: Value) -> Result<R, RemoteError> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(RemoteError::Rejected {
            status: 200,
            message: message.to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
}
