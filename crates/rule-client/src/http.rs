//! 基于 reqwest 的远程规则服务客户端
//!
//! 封装对规则服务的 HTTP 调用，所有响应体先按文本读取，
//! 失败时原样保留在 `NetworkError::body` 中用于诊断。

use async_trait::async_trait;
use console_shared::config::ApiConfig;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::RuleApi;
use crate::error::{ClientError, NetworkError, Operation};
use crate::models::{EvaluationOutcome, EvaluationRequest, RuleEntity, RuleId};

// ========== 请求/响应类型 ==========

#[derive(Debug, Serialize)]
struct RuleStringBody<'a> {
    rule_string: &'a str,
}

#[derive(Debug, Serialize)]
struct CombineRulesBody<'a> {
    rule_ids: &'a [RuleId],
}

#[derive(Debug, Deserialize)]
struct ToggleStatusResponse {
    new_status: bool,
}

#[derive(Debug, Deserialize)]
struct CombineRulesResponse {
    combined_ast: Value,
}

/// 创建规则的响应
///
/// 服务端可能返回完整实体，也可能只返回确认信息 `{ "rule_id", "message" }`。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateRuleResponse {
    Entity(RuleEntity),
    Ack { rule_id: RuleId },
}

impl CreateRuleResponse {
    /// 确认形式下用服务端分配的 id、提交的文本和服务端默认状态（启用）组装实体
    fn into_entity(self, submitted: &str) -> RuleEntity {
        match self {
            Self::Entity(entity) => entity,
            Self::Ack { rule_id } => RuleEntity::new(rule_id, submitted, true),
        }
    }
}

// ========== 客户端 ==========

/// 远程规则服务 HTTP 客户端
#[derive(Clone)]
pub struct HttpRuleApi {
    client: Client,
    base_url: Url,
}

impl HttpRuleApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidConfig(format!("无效的 base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "base_url 不能作为请求根地址: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("创建 HTTP 客户端失败: {e}")))?;

        debug!(base_url = %base_url, "规则服务 HTTP 客户端已初始化");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 拼接请求地址，各路径段单独做百分号编码
    ///
    /// 空段和 `.`、`..` 会被 URL 规范化吞掉，直接拒绝。
    fn endpoint(&self, operation: Operation, segments: &[&str]) -> Result<Url, NetworkError> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(NetworkError::unroutable(
                operation,
                format!("路径段无法作为资源地址: {segment:?}"),
            ));
        }

        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn execute(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<Response, NetworkError> {
        let response = request
            .send()
            .await
            .map_err(|e| NetworkError::transport(operation, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(
                    operation = %operation,
                    status = status.as_u16(),
                    error = %e,
                    "读取错误响应体失败"
                );
                String::new()
            }
        };
        Err(NetworkError::http_status(operation, status.as_u16(), body))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, NetworkError> {
        let response = self.execute(operation, request).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::transport(operation, e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| NetworkError::decode(operation, status, e.to_string(), body))
    }
}

#[async_trait]
impl RuleApi for HttpRuleApi {
    async fn list_rules(&self) -> Result<Vec<RuleEntity>, NetworkError> {
        let url = self.endpoint(Operation::LoadRules, &["rules"])?;
        debug!(%url, "GET 规则列表");
        self.execute_json(Operation::LoadRules, self.client.get(url))
            .await
    }

    async fn create_rule(&self, rule_string: &str) -> Result<RuleEntity, NetworkError> {
        let url = self.endpoint(Operation::CreateRule, &["create_rule"])?;
        debug!(%url, "POST 创建规则");
        let response: CreateRuleResponse = self
            .execute_json(
                Operation::CreateRule,
                self.client.post(url).json(&RuleStringBody { rule_string }),
            )
            .await?;
        Ok(response.into_entity(rule_string))
    }

    async fn delete_rule(&self, rule_id: &RuleId) -> Result<(), NetworkError> {
        let url = self.endpoint(Operation::DeleteRule, &["rules", rule_id.as_str()])?;
        debug!(%url, "DELETE 规则");
        self.execute(Operation::DeleteRule, self.client.delete(url))
            .await?;
        Ok(())
    }

    async fn toggle_status(&self, rule_id: &RuleId) -> Result<bool, NetworkError> {
        let url = self.endpoint(
            Operation::ToggleStatus,
            &["rules", rule_id.as_str(), "toggle_status"],
        )?;
        debug!(%url, "PATCH 切换规则状态");
        let response: ToggleStatusResponse = self
            .execute_json(Operation::ToggleStatus, self.client.patch(url))
            .await?;
        Ok(response.new_status)
    }

    async fn update_rule(&self, rule_id: &RuleId, rule_string: &str) -> Result<(), NetworkError> {
        let url = self.endpoint(Operation::UpdateRule, &["rules", rule_id.as_str(), "update"])?;
        debug!(%url, "PATCH 更新规则");
        self.execute(
            Operation::UpdateRule,
            self.client.patch(url).json(&RuleStringBody { rule_string }),
        )
        .await?;
        Ok(())
    }

    async fn evaluate_rule(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationOutcome, NetworkError> {
        let url = self.endpoint(Operation::EvaluateRule, &["evaluate_rule"])?;
        debug!(%url, rule_id = %request.rule_id, "POST 评估规则");
        self.execute_json(Operation::EvaluateRule, self.client.post(url).json(request))
            .await
    }

    async fn combine_rules(&self, rule_ids: &[RuleId]) -> Result<Value, NetworkError> {
        let url = self.endpoint(Operation::CombineRules, &["combine_rules"])?;
        debug!(%url, rule_count = rule_ids.len(), "POST 合并规则");
        let response: CombineRulesResponse = self
            .execute_json(
                Operation::CombineRules,
                self.client.post(url).json(&CombineRulesBody { rule_ids }),
            )
            .await?;
        Ok(response.combined_ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api(base_url: &str) -> HttpRuleApi {
        HttpRuleApi::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let api = api("http://192.168.1.10:5001/");
        assert_eq!(
            api.endpoint(Operation::ToggleStatus, &["rules", "abc", "toggle_status"])
                .unwrap()
                .as_str(),
            "http://192.168.1.10:5001/rules/abc/toggle_status"
        );
        assert_eq!(
            api.endpoint(Operation::DeleteRule, &["rules", "a/b c"])
                .unwrap()
                .as_str(),
            "http://192.168.1.10:5001/rules/a%2Fb%20c"
        );
        assert_eq!(
            api.endpoint(Operation::DeleteRule, &["rules", "..."])
                .unwrap()
                .as_str(),
            "http://192.168.1.10:5001/rules/..."
        );
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        let api = api("http://192.168.1.10:5001/");

        let err = api
            .endpoint(Operation::DeleteRule, &["rules", ".."])
            .unwrap_err();
        assert_eq!(err.operation, Operation::DeleteRule);
        assert!(!err.sent);
        assert!(!err.is_retryable());

        let err = api
            .endpoint(Operation::ToggleStatus, &["rules", ".", "toggle_status"])
            .unwrap_err();
        assert_eq!(err.operation, Operation::ToggleStatus);

        assert!(api.endpoint(Operation::UpdateRule, &["rules", "", "update"]).is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let api = api("https://rules.example.com/api/");
        assert_eq!(
            api.endpoint(Operation::EvaluateRule, &["evaluate_rule"])
                .unwrap()
                .as_str(),
            "https://rules.example.com/api/evaluate_rule"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpRuleApi::new(&ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));

        let result = HttpRuleApi::new(&ApiConfig {
            base_url: "mailto:rules@example.com".to_string(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_create_response_full_entity() {
        let response: CreateRuleResponse = serde_json::from_value(json!({
            "_id": "r1", "rule_string": "age > 18", "status": false
        }))
        .unwrap();
        assert_eq!(
            response.into_entity("age > 18"),
            RuleEntity::new("r1", "age > 18", false)
        );
    }

    #[test]
    fn test_create_response_ack_uses_server_id() {
        let response: CreateRuleResponse = serde_json::from_value(json!({
            "message": "Rule created", "rule_id": "652f1c"
        }))
        .unwrap();
        assert_eq!(
            response.into_entity("age > 18"),
            RuleEntity::new("652f1c", "age > 18", true)
        );
    }
}
