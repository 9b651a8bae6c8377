//! 配置加载集成测试
//!
//! 环境变量覆盖会修改进程级状态，因此放在独立的测试二进制中。

use std::fs;

use console_shared::config::AppConfig;
use console_shared::retry::RetryPolicy;

#[test]
fn test_env_overrides_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("default.toml"),
        "[api]\nbase_url = \"http://from-file:5001\"\n\n[retry]\nmax_retries = 1\n",
    )
    .unwrap();

    // SAFETY: 本测试二进制中只有这一个测试读写环境变量
    unsafe {
        std::env::set_var("RULE_CONSOLE__API__BASE_URL", "http://from-env:5001");
        std::env::set_var("RULE_CONSOLE__RETRY__MAX_RETRIES", "7");
        std::env::set_var("RULE_CONSOLE__SYNC__GUARD_CONCURRENT_MUTATIONS", "true");
    }

    let config = AppConfig::load_from(dir.path(), "rule-console", "test").unwrap();

    unsafe {
        std::env::remove_var("RULE_CONSOLE__API__BASE_URL");
        std::env::remove_var("RULE_CONSOLE__RETRY__MAX_RETRIES");
        std::env::remove_var("RULE_CONSOLE__SYNC__GUARD_CONCURRENT_MUTATIONS");
    }

    assert_eq!(config.api.base_url, "http://from-env:5001");
    assert_eq!(config.retry.max_retries, 7);
    assert!(config.sync.guard_concurrent_mutations);

    let policy = RetryPolicy::from(&config.retry);
    assert_eq!(policy.max_retries, 7);
}
