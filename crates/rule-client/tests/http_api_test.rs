//! HttpRuleApi 集成测试
//!
//! 使用 wiremock 模拟远程规则服务，验证每个接口的方法、路径、请求体与响应映射。

use console_shared::config::ApiConfig;
use rule_client::{EvaluationRequest, HttpRuleApi, Operation, RuleApi, RuleEntity, RuleId};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, HttpRuleApi) {
    let server = MockServer::start().await;
    let api = HttpRuleApi::new(&ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        connect_timeout_seconds: 2,
    })
    .unwrap();
    (server, api)
}

// ==================== 接口映射 ====================

#[tokio::test]
async fn test_list_rules() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "r1", "rule_string": "age > 18", "status": true, "ast": {}},
            {"_id": "r2", "rule_string": "salary < 5000", "status": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rules = api.list_rules().await.unwrap();

    assert_eq!(
        rules,
        vec![
            RuleEntity::new("r1", "age > 18", true),
            RuleEntity::new("r2", "salary < 5000", false),
        ]
    );
}

#[tokio::test]
async fn test_create_rule_full_entity() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/create_rule"))
        .and(body_json(json!({"rule_string": "age > 18"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "r1", "rule_string": "age > 18", "status": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = api.create_rule("age > 18").await.unwrap();
    assert_eq!(created, RuleEntity::new("r1", "age > 18", false));
}

#[tokio::test]
async fn test_create_rule_ack_form() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/create_rule"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Rule created successfully",
            "rule_id": "6530aa"
        })))
        .mount(&server)
        .await;

    let created = api.create_rule("department == 'Sales'").await.unwrap();
    assert_eq!(
        created,
        RuleEntity::new("6530aa", "department == 'Sales'", true)
    );
}

#[tokio::test]
async fn test_delete_rule() {
    let (server, api) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/rules/r1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Rule deleted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    api.delete_rule(&RuleId::from("r1")).await.unwrap();
}

#[tokio::test]
async fn test_delete_rule_empty_body() {
    let (server, api) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/rules/r1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert!(api.delete_rule(&RuleId::from("r1")).await.is_ok());
}

#[tokio::test]
async fn test_dot_rule_ids_never_reach_other_resources() {
    let (server, api) = setup().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"new_status": true})))
        .expect(0)
        .mount(&server)
        .await;

    let err = api.delete_rule(&RuleId::from("..")).await.unwrap_err();
    assert_eq!(err.operation, Operation::DeleteRule);
    assert!(!err.sent);

    let err = api.toggle_status(&RuleId::from(".")).await.unwrap_err();
    assert_eq!(err.operation, Operation::ToggleStatus);
    assert!(!err.is_retryable());

    assert!(api.update_rule(&RuleId::from(".."), "age > 1").await.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_toggle_status() {
    let (server, api) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/rules/r1/toggle_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"new_status": true})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(api.toggle_status(&RuleId::from("r1")).await.unwrap());
}

#[tokio::test]
async fn test_update_rule() {
    let (server, api) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/rules/r1/update"))
        .and(body_json(json!({"rule_string": "age >= 21"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Rule updated"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    api.update_rule(&RuleId::from("r1"), "age >= 21")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_evaluate_rule() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/evaluate_rule"))
        .and(body_json(json!({"rule_id": "r1", "user_data": {"age": 20}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "received_data": {"rule_id": "r1", "user_data": {"age": 20}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = api
        .evaluate_rule(&EvaluationRequest {
            rule_id: RuleId::from("r1"),
            user_data: json!({"age": 20}),
        })
        .await
        .unwrap();

    assert!(outcome.result);
    assert!(outcome.detail("received_data").is_some());
}

#[tokio::test]
async fn test_combine_rules() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/combine_rules"))
        .and(body_json(json!({"rule_ids": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "combined_ast": {"type": "operator", "value": "AND"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ast = api
        .combine_rules(&[RuleId::from("a"), RuleId::from("b")])
        .await
        .unwrap();
    assert_eq!(ast, json!({"type": "operator", "value": "AND"}));
}

#[tokio::test]
async fn test_path_id_is_encoded() {
    let (server, api) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/rules/a%20b/toggle_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"new_status": false})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!api.toggle_status(&RuleId::from("a b")).await.unwrap());
}

// ==================== 错误映射 ====================

#[tokio::test]
async fn test_non_success_preserves_body() {
    let (server, api) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/rules/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Rule not found"})),
        )
        .mount(&server)
        .await;

    let err = api
        .delete_rule(&RuleId::from("missing"))
        .await
        .unwrap_err();

    assert_eq!(err.operation, Operation::DeleteRule);
    assert_eq!(err.status, Some(404));
    assert!(err.body.as_deref().unwrap().contains("Rule not found"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/evaluate_rule"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Error evaluating rule"))
        .mount(&server)
        .await;

    let err = api
        .evaluate_rule(&EvaluationRequest {
            rule_id: RuleId::from("r1"),
            user_data: json!({}),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(500));
    assert_eq!(err.body.as_deref(), Some("Error evaluating rule"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unexpected_success_body_is_network_error() {
    let (server, api) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/rules/r1/toggle_status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let err = api.toggle_status(&RuleId::from("r1")).await.unwrap_err();

    assert_eq!(err.operation, Operation::ToggleStatus);
    assert_eq!(err.status, Some(200));
    assert_eq!(err.body.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // 绑定后立即释放端口，保证没有服务监听
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let api = HttpRuleApi::new(&ApiConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout_seconds: 2,
        connect_timeout_seconds: 1,
    })
    .unwrap();

    let err = api.list_rules().await.unwrap_err();
    assert_eq!(err.operation, Operation::LoadRules);
    assert!(err.status.is_none());
    assert!(err.is_retryable());
}
