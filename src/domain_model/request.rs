use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(UnknownMethod(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub uuid::Uuid);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An outgoing call, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub id: RequestId,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Set once the request has been replayed after a token refresh.
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: RequestId(uuid::Uuid::new_v4()),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove_header(&name);
        self.headers.push((name, value.into()));
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }
}

/// A response as seen by the pipeline. Empty bodies decode to `Value::Null`,
/// non-JSON bodies to `Value::String`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }

    /// Decodes the `data` envelope when present, the whole body otherwise.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self.body.get("data") {
            Some(data) => serde_json::from_value(data.clone()),
            None => self.json(),
        }
    }
}

/// The user-relevant parts of an error body.
///
/// Accepts the shapes the API produces: `message` as a string or a list of
/// strings, `errors` as a list or as an object of field -> string(s).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePayload {
    pub message: Option<String>,
    pub errors: Vec<String>,
}

impl FailurePayload {
    pub fn from_body(body: &Value) -> Self {
        let message = body.get("message").and_then(|value| {
            let joined = collect_strings(value).join(", ");
            if joined.is_empty() { None } else { Some(joined) }
        });
        let errors = body.get("errors").map(collect_strings).unwrap_or_default();

        Self { message, errors }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            errors: Vec::new(),
        }
    }
}

fn collect_strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { Vec::new() } else { vec![s.to_owned()] }
        }
        Value::Array(items) => items.iter().flat_map(collect_strings).collect(),
        Value::Object(fields) => fields.values().flat_map(collect_strings).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headers_are_replaced_case_insensitively() {
        let mut request = ApiRequest::get("/trips").with_header("authorization", "Bearer T1");
        request.set_header(AUTHORIZATION, "Bearer T2");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer T2"));

        request.remove_header(AUTHORIZATION);
        assert_eq!(request.header(AUTHORIZATION), None);
    }

    #[test]
    fn method_parses_any_case() {
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("TRACE".parse::<Method>().is_err());
        assert!(!Method::Get.is_mutation());
        assert!(Method::Delete.is_mutation());
    }

    #[test]
    fn failure_payload_accepts_nest_style_bodies() {
        let single = FailurePayload::from_body(&json!({
            "statusCode": 404,
            "message": "Trip not found",
            "error": "Not Found"
        }));
        assert_eq!(single.message.as_deref(), Some("Trip not found"));
        assert!(single.errors.is_empty());

        let validation = FailurePayload::from_body(&json!({
            "statusCode": 400,
            "message": ["title should not be empty", "startDate must be a date"]
        }));
        assert_eq!(
            validation.message.as_deref(),
            Some("title should not be empty, startDate must be a date")
        );

        let keyed = FailurePayload::from_body(&json!({
            "errors": { "email": ["is taken"], "name": "too short" }
        }));
        assert_eq!(keyed.message, None);
        assert_eq!(keyed.errors, vec!["is taken".to_owned(), "too short".to_owned()]);
    }

    #[test]
    fn failure_payload_ignores_blank_and_non_json() {
        assert_eq!(
            FailurePayload::from_body(&json!({ "message": "  " })),
            FailurePayload::default()
        );
        assert_eq!(
            FailurePayload::from_body(&Value::String("<html>bad gateway</html>".into())),
            FailurePayload::default()
        );
    }

    #[test]
    fn response_data_unwraps_envelope() {
        let response = ApiResponse::new(200, json!({ "message": "ok", "data": [1, 2, 3] }));
        assert!(response.is_success());
        assert_eq!(response.message(), Some("ok"));
        assert_eq!(response.data::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
    }
}
