//! 统一可观测性模块
//!
//! 客户端只输出结构化日志，不导出指标与分布式追踪。
//! 所有入口通过单一函数初始化日志，保证字段命名一致。

pub mod tracing;

pub use self::tracing::init_logging;
