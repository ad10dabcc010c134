//! HTTP 覆盖范围目录客户端
//!
//! GET {base_url}/campuses/{id}、{base_url}/towns/{id}；id 必须是整数。
//! 404 视为未知地点；其他非 2xx、超时、连接失败一律视为服务不可用。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{CoverageDirectory, DirectoryError, ResolvedLocation};
use crate::model::LocationKind;

pub struct HttpCoverageDirectory {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationDto {
    name: String,
    #[serde(default)]
    institution_id: Option<serde_json::Value>,
    #[serde(default)]
    department_id: Option<serde_json::Value>,
}

fn value_to_id(v: serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl HttpCoverageDirectory {
    /// 客户端构建失败时报错，不退回到无超时的默认客户端
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DirectoryError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn url(&self, kind: LocationKind, id: &str) -> String {
        let segment = match kind {
            LocationKind::Campus => "campuses",
            LocationKind::Town => "towns",
        };
        format!("{}/{}/{}", self.base_url, segment, id)
    }

    async fn fetch(&self, kind: LocationKind, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        let id = id.trim();
        if id.parse::<i64>().is_err() {
            return Err(DirectoryError::MalformedId {
                kind,
                id: id.to_string(),
            });
        }

        let mut req = self.client.get(self.url(kind, id));
        if let Some(ref token) = self.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(kind = %kind, id, "Coverage lookup failed: {}", e);
            DirectoryError::Unavailable(format!("Request failed: {}", e))
        })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(DirectoryError::Unavailable(format!("HTTP {}", resp.status())));
        }

        let dto: LocationDto = resp
            .json()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("Invalid response: {}", e)))?;
        let parent = match kind {
            LocationKind::Campus => dto.institution_id,
            LocationKind::Town => dto.department_id,
        };
        Ok(Some(ResolvedLocation {
            id: id.to_string(),
            kind,
            name: dto.name,
            parent_id: parent.and_then(value_to_id),
        }))
    }
}

#[async_trait]
impl CoverageDirectory for HttpCoverageDirectory {
    async fn get_campus(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        self.fetch(LocationKind::Campus, id).await
    }

    async fn get_town(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        self.fetch(LocationKind::Town, id).await
    }
}
