//! 终端输出格式化

use rule_client::{ClientError, EvaluationOutcome, RuleEntity, RuleId, UserDataCodec};
use serde_json::Value;

pub fn status_label(status: bool) -> &'static str {
    if status { "启用" } else { "停用" }
}

/// 规则列表，正在编辑的规则以 `*` 标记
pub fn render_rules(rules: &[RuleEntity], editing: Option<&RuleId>) -> String {
    if rules.is_empty() {
        return "暂无规则".to_string();
    }

    let id_width = rules
        .iter()
        .map(|r| r.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max(2);

    let mut lines = Vec::with_capacity(rules.len() + 1);
    lines.push(format!("  {:<id_width$}  状态  规则", "ID"));
    for rule in rules {
        let marker = if editing == Some(&rule.id) { '*' } else { ' ' };
        lines.push(format!(
            "{marker} {:<id_width$}  {}  {}",
            rule.id.as_str(),
            status_label(rule.status),
            rule.rule_string
        ));
    }
    lines.join("\n")
}

/// 评估结果，附带服务端返回的其他字段
pub fn render_outcome(outcome: &EvaluationOutcome) -> String {
    let verdict = if outcome.result { "True" } else { "False" };
    if outcome.details.is_empty() {
        return format!("评估结果: {verdict}");
    }
    format!(
        "评估结果: {verdict}\n{}",
        UserDataCodec::render(&Value::Object(outcome.details.clone()))
    )
}

pub fn render_combined(ast: &Value) -> String {
    format!("合并后的 AST:\n{}", UserDataCodec::render(ast))
}

/// 单条错误提示
pub fn render_notice(err: &ClientError) -> String {
    format!("错误: {}", err.user_message())
}
