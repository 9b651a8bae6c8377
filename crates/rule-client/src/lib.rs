//! 规则同步与评估客户端
//!
//! 维护远程规则服务的本地镜像，提供：
//! - 规则集合的加载与"先确认、后应用"的增删改
//! - 单槽编辑会话
//! - 用户数据解码与规则评估
//! - 基于 reqwest 的远程服务实现

pub mod api;
pub mod codec;
pub mod edit_session;
pub mod error;
pub mod evaluation;
pub mod http;
pub mod inflight;
pub mod models;
pub mod store;

pub use api::RuleApi;
pub use codec::UserDataCodec;
pub use edit_session::{EditSession, EditState};
pub use error::{ClientError, NetworkError, Operation, Result, ValidationError};
pub use evaluation::EvaluationController;
pub use http::HttpRuleApi;
pub use inflight::{InFlightPermit, InFlightRegistry};
pub use models::{EvaluationOutcome, EvaluationRequest, RuleEntity, RuleId};
pub use store::{RuleSnapshot, RuleStore};
