//! 自动化工具箱公共模块
//!
//! 提供各组件共享的基础设施，包括：
//! - 连接参数、数据行与邮件模型
//! - 统一错误类型
//! - 环境变量配置与日志初始化
//! - 通用工具函数

pub mod config;
pub mod errors;
pub mod models;
pub mod telemetry;
pub mod utils;

pub use errors::{AppError, AppResult};
