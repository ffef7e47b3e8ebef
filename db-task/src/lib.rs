//! PostgreSQL 数据任务助手
//!
//! 每个操作都接收一份显式的 [`ConnectionParams`]，自行打开连接、执行并关闭，
//! 不保留任何跨调用的状态：
//! - [`load`]: 将数据行写入目标表（单事务，全部成功或全部回滚）
//! - [`extract`]: 执行查询并返回数据行
//! - [`execute`] / [`truncate`]: 执行语句、清空表
//! - [`dump_to_file`] / [`load_from_file`] / [`load_from_files`] / [`load_from_glob`]: 基于 COPY 的 CSV 导入导出
//!
//! [`ConnectionParams`]: common::models::ConnectionParams

mod codec;
mod connection;
mod copy;
mod errors;
mod extract;
mod load;
mod schema;

pub use copy::{
    dump_to_file, load_from_file, load_from_files, load_from_glob, CopySource, CsvOptions,
};
pub use extract::{execute, extract, truncate};
pub use load::load;
