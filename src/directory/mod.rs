//! 覆盖范围目录：校区 / 乡镇的 id → 名称解析
//!
//! - **HttpCoverageDirectory**: 调用外部覆盖范围服务
//! - **StaticCoverageDirectory**: 内存表（配置文件或测试）

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::MenuError;
use crate::model::{Coverage, LocationKind};

pub mod fixed;
pub mod http;

pub use fixed::StaticCoverageDirectory;
pub use http::HttpCoverageDirectory;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("{} with ID {id} not found", kind_label(.kind))]
    NotFound { kind: LocationKind, id: String },

    #[error("Invalid {} ID format: {id}", .kind.as_str())]
    MalformedId { kind: LocationKind, id: String },

    #[error("Coverage service unavailable: {0}")]
    Unavailable(String),
}

fn kind_label(kind: &LocationKind) -> &'static str {
    match kind {
        LocationKind::Campus => "Campus",
        LocationKind::Town => "Town",
    }
}

impl From<DirectoryError> for MenuError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound { .. } => MenuError::NotFound(e.to_string()),
            DirectoryError::MalformedId { .. } => MenuError::Validation(e.to_string()),
            DirectoryError::Unavailable(msg) => MenuError::ServiceUnavailable(msg),
        }
    }
}

/// 请求侧的地点引用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationRef {
    #[serde(alias = "location_id")]
    pub id: String,
    #[serde(alias = "location_type")]
    pub kind: LocationKind,
}

impl LocationRef {
    pub fn campus(id: impl Into<String>) -> Self {
        Self { id: id.into(), kind: LocationKind::Campus }
    }

    pub fn town(id: impl Into<String>) -> Self {
        Self { id: id.into(), kind: LocationKind::Town }
    }
}

/// 目录返回的地点；parent_id 对校区是所属学校，对乡镇是所属省份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub id: String,
    pub kind: LocationKind,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl ResolvedLocation {
    pub fn into_coverage(self) -> Coverage {
        Coverage {
            location_id: self.id,
            location_type: self.kind,
            location_name: self.name,
        }
    }
}

/// 覆盖范围目录；未知 id 返回 Ok(None)，传输失败返回 Unavailable
#[async_trait]
pub trait CoverageDirectory: Send + Sync {
    async fn get_campus(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError>;

    async fn get_town(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError>;

    async fn lookup(&self, location: &LocationRef) -> Result<Option<ResolvedLocation>, DirectoryError> {
        match location.kind {
            LocationKind::Campus => self.get_campus(&location.id).await,
            LocationKind::Town => self.get_town(&location.id).await,
        }
    }
}

/// 并发解析全部地点，任一失败即整体失败（未知地点 → NotFound）
pub async fn resolve_all(
    directory: &dyn CoverageDirectory,
    locations: &[LocationRef],
) -> Result<Vec<Coverage>, DirectoryError> {
    let lookups = locations.iter().map(|loc| async move {
        match directory.lookup(loc).await? {
            Some(found) => Ok(found.into_coverage()),
            None => Err(DirectoryError::NotFound {
                kind: loc.kind,
                id: loc.id.clone(),
            }),
        }
    });
    try_join_all(lookups).await
}
