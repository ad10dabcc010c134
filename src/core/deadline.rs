//! 协作方调用的超时包装
//!
//! 在超时内等待 future；超时转为 ServiceUnavailable，内部错误经 `Into<MenuError>` 转换。

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use super::MenuError;

pub async fn within<T, E, F>(limit: Duration, what: &str, fut: F) -> Result<T, MenuError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<MenuError>,
{
    match timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(call = what, timeout_ms = limit.as_millis() as u64, "collaborator timed out");
            Err(MenuError::ServiceUnavailable(format!(
                "{} timed out after {}ms",
                what,
                limit.as_millis()
            )))
        }
    }
}
