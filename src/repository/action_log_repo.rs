// ==========================================
// 货架陈列系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 所有陈列写入必须记录（含强制陈列）
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::ActionLogRepository;
