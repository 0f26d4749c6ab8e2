use crate::domain_model::*;
use crate::domain_port::*;
use serde_json::Value;
use std::time::Duration;

/// [`HttpTransport`] over a reqwest client rooted at the API base URL.
///
/// The cookie store holds the refresh cookie set at login, which is what the
/// refresh endpoint authenticates with. The client timeout bounds every call,
/// the refresh call included.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn try_new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_error)?;

        Ok(ApiResponse::new(status, decode_body(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_base_url_and_path() {
        let transport =
            ReqwestTransport::try_new("http://localhost:3000/api/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(transport.url("/trips"), "http://localhost:3000/api/trips");
        assert_eq!(transport.url("trips/1"), "http://localhost:3000/api/trips/1");
    }

    #[test]
    fn decodes_json_text_and_empty_bodies() {
        assert_eq!(decode_body(String::new()), Value::Null);
        assert_eq!(decode_body(r#"{"a":1}"#.into()), json!({ "a": 1 }));
        assert_eq!(
            decode_body("Bad Gateway".into()),
            Value::String("Bad Gateway".into())
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let transport =
            ReqwestTransport::try_new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = transport.execute(&ApiRequest::get("/trips")).await;
        assert!(result.is_err());
    }
}
