//! 课程目录服务公共模块
//!
//! 提供配置加载、错误类型、请求 ID 中间件以及数据库连接缓存。

pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
