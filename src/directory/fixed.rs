//! 静态目录：来自配置 [[coverage.locations]] 或测试构造

use std::collections::HashMap;

use async_trait::async_trait;

use super::{CoverageDirectory, DirectoryError, ResolvedLocation};
use crate::config::StaticLocation;
use crate::model::LocationKind;

#[derive(Debug, Default, Clone)]
pub struct StaticCoverageDirectory {
    locations: HashMap<(LocationKind, String), String>,
}

impl StaticCoverageDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, kind: LocationKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.locations.insert((kind, id.into()), name.into());
        self
    }

    /// 从配置构造；类型无法识别的条目跳过并告警
    pub fn from_config(entries: &[StaticLocation]) -> Self {
        let mut dir = Self::new();
        for entry in entries {
            match entry.kind.parse::<LocationKind>() {
                Ok(kind) => {
                    dir.locations.insert((kind, entry.id.clone()), entry.name.clone());
                }
                Err(e) => tracing::warn!(id = %entry.id, "Skipping static location: {}", e),
            }
        }
        dir
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn find(&self, kind: LocationKind, id: &str) -> Option<ResolvedLocation> {
        self.locations
            .get(&(kind, id.to_string()))
            .map(|name| ResolvedLocation {
                id: id.to_string(),
                kind,
                name: name.clone(),
                parent_id: None,
            })
    }
}

#[async_trait]
impl CoverageDirectory for StaticCoverageDirectory {
    async fn get_campus(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        Ok(self.find(LocationKind::Campus, id))
    }

    async fn get_town(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        Ok(self.find(LocationKind::Town, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_skips_unknown_kind() {
        let dir = StaticCoverageDirectory::from_config(&[
            StaticLocation { id: "1".into(), kind: "campus".into(), name: "Sede Norte".into() },
            StaticLocation { id: "2".into(), kind: "region".into(), name: "Caribe".into() },
        ]);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get_campus("1").await.unwrap().unwrap().name, "Sede Norte");
        assert!(dir.get_town("1").await.unwrap().is_none());
    }
}
