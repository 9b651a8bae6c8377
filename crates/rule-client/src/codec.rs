//! 用户数据编解码
//!
//! 把用户输入的自由文本解析为 JSON 值，解析失败时在发起任何网络请求之前拒绝。
//! 不校验结构：数字、字符串、数组、对象都原样转发，由远程评估器判断语义。

use serde_json::Value;

use crate::error::ValidationError;

pub struct UserDataCodec;

impl UserDataCodec {
    /// 解码用户数据
    ///
    /// 空白输入与语法错误走同一条路径，都返回 `InvalidFormat`。
    pub fn decode(text: &str) -> Result<Value, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::InvalidFormat {
                message: "输入为空".to_string(),
            });
        }

        serde_json::from_str(text).map_err(|e| ValidationError::InvalidFormat {
            message: e.to_string(),
        })
    }

    /// 格式化 JSON 值用于展示
    pub fn render(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}
