//! # dojang-progress - 学习进度与复习调度引擎
//!
//! Decides, per learner and per item, how well the item is mastered and when
//! it should come up again:
//!
//! - **Leitner scheduler** - five-box review of terminology with a hard reset
//!   on a miss
//! - **Sequence mastery** - movement patterns (good-run streak plus average
//!   accuracy) and step-sparring sequences (linear step completion)
//! - **Daily streak** - same-day idempotent, gap resets to one
//! - **Advancement** - terminology and pattern mastery gate the next rank
//!
//! ## 设计理念
//!
//! - 核心算法均为纯函数：输入记录 + 事件 + `now`，输出新记录
//! - 不读取系统时钟，测试可注入任意时间
//! - 持久化由调用方负责，[`engine::ProgressEngine`] 负责按记录串行化写入
//!
//! ## 模块结构
//!
//! - [`leitner`] - Leitner 复习调度
//! - [`sequence`] - 套路 / 对练掌握度
//! - [`streak`] - 连续学习天数
//! - [`advancement`] - 升级资格评估
//! - [`sanitize`] - 输入校验
//! - [`store`] - 存储接口与内存实现
//! - [`engine`] - 存储之上的事件入口
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::Utc;
//! use dojang_progress::{leitner, AtomicItemProgress, MasteryLevel};
//!
//! let now = Utc::now();
//! let record = AtomicItemProgress::new("learner-1", "charyot", now);
//! let record = leitner::record_answer(&record, true, 2.4, now).unwrap();
//! assert_eq!(record.leitner_box, 2);
//! assert_eq!(record.mastery_level, MasteryLevel::Learning);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod advancement;
pub mod config;
pub mod engine;
pub mod error;
pub mod leitner;
pub mod logging;
pub mod replay;
pub mod sanitize;
pub mod sequence;
pub mod store;
pub mod streak;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use error::{ProgressError, ProgressResult};

pub use advancement::evaluate;
pub use leitner::record_answer;
pub use sequence::{record_run, PatternPolicy, SequenceProgressPolicy, SparringPolicy};
pub use streak::record_activity;

pub use engine::{EngineError, EngineResult, ProgressEngine, SequenceSetup};
pub use store::{MemoryStore, ProgressStore, StoreError, StoreResult};
