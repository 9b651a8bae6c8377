//! 调用方重试策略
//!
//! 规则同步层从不自动重试。前端在启动加载规则列表时按此策略退避重试，
//! 是否重试由调用方传入的 `is_retryable` 判定。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::RetryConfig;

/// 指数退避策略
///
/// 第 N 次重试前等待 `initial_delay * multiplier^N`，不超过 `max_delay`。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次执行）
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次重试前的等待时间，attempt 从 0 开始
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = scaled.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// 完整的退避序列，长度等于 `max_retries`
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }
}

/// 按策略执行异步操作
///
/// 不可重试的错误立即返回；退避序列用尽后返回最后一次的错误。
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut schedule = policy.schedule();
    let mut retries: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    info!(operation = operation_name, retries, "重试后成功");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            warn!(operation = operation_name, error = %err, "不可重试的错误");
            return Err(err);
        }

        let Some(delay) = schedule.next() else {
            warn!(
                operation = operation_name,
                retries,
                error = %err,
                "重试次数已用尽"
            );
            return Err(err);
        };

        warn!(
            operation = operation_name,
            retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "调用失败，退避后重试"
        );
        tokio::time::sleep(delay).await;
        retries += 1;
    }
}
