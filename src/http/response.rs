//! Response types and metadata.

use std::future::Future;
use std::time::Instant;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult, ErrorReport};
use crate::http::request::{
    RequestContext, RETRY_AFTER, X_CACHE_STATUS, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING,
    X_RATELIMIT_RESET,
};

/// A response exactly as received.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as JSON, `Null` when empty or not JSON.
    pub fn json_body(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// `message` field of a JSON error body.
    pub fn server_message(&self) -> Option<String> {
        self.json_body()
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// `details`, or failing that `errors`, of a JSON error body.
    pub fn server_details(&self) -> Option<Value> {
        let body = self.json_body();
        body.get("details")
            .or_else(|| body.get("errors"))
            .filter(|v| !v.is_null())
            .cloned()
    }

    pub fn is_cache_hit(&self) -> bool {
        self.header(X_CACHE_STATUS)
            .map(|v| v.eq_ignore_ascii_case("HIT"))
            .unwrap_or(false)
    }
}

/// Metadata attached to every successful response.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub request_id: String,
    pub duration_ms: u64,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    pub fn new(ctx: &RequestContext, raw: &RawResponse) -> Self {
        Self {
            request_id: ctx.request_id().to_string(),
            duration_ms: ctx.elapsed().as_millis() as u64,
            cached: raw.is_cache_hit(),
            timestamp: Utc::now(),
        }
    }
}

/// Rate-limit headers as the server reported them.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
    pub retry_after: Option<u64>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let number = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };
        Self {
            limit: number(X_RATELIMIT_LIMIT),
            remaining: number(X_RATELIMIT_REMAINING),
            reset: number(X_RATELIMIT_RESET),
            retry_after: number(RETRY_AFTER),
        }
    }
}

/// A successful response with its decoded payload.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
    pub meta: ResponseMeta,
    pub rate_limit: RateLimitInfo,
}

impl ApiResponse<Bytes> {
    pub(crate) fn from_raw(ctx: &RequestContext, raw: RawResponse) -> Self {
        Self {
            status: raw.status.as_u16(),
            meta: ResponseMeta::new(ctx, &raw),
            rate_limit: RateLimitInfo::from_headers(&raw.headers),
            data: raw.body,
        }
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<ApiResponse<T>> {
        let parsed = if self.data.is_empty() {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&self.data)
        };
        let data = parsed.map_err(|source| ApiError::Decode {
            request_id: self.meta.request_id.clone(),
            source,
        })?;
        Ok(ApiResponse {
            status: self.status,
            data,
            meta: self.meta,
            rate_limit: self.rate_limit,
        })
    }
}

impl<T> ApiResponse<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            data: f(self.data),
            meta: self.meta,
            rate_limit: self.rate_limit,
        }
    }

    pub fn is_cached(&self) -> bool {
        self.meta.cached
    }
}

/// Outcome of a timed call.
#[derive(Debug)]
pub struct Measured<T> {
    pub duration_ms: u64,
    pub result: Result<ApiResponse<T>, ErrorReport>,
}

impl<T> Measured<T> {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn cached(&self) -> bool {
        self.result.as_ref().map(|r| r.meta.cached).unwrap_or(false)
    }
}

/// Time an API call end to end, converting failures to reports.
pub async fn measure<T, F>(call: F) -> Measured<T>
where
    F: Future<Output = ApiResult<ApiResponse<T>>>,
{
    let start = Instant::now();
    let result = call.await.map_err(|e| e.report());
    Measured {
        duration_ms: start.elapsed().as_millis() as u64,
        result,
    }
}
