//! 学习会话
//!
//! 按顺序翻看模块卡片，用户对每张卡片选择"认识"或"不认识"，
//! 会话结束时把不认识的卡片写回模块的进度列。

use serde::{Deserialize, Serialize};

use crate::storage::{
    CardRow, ModuleCards, ProgressSource, StorageError, StorageManager, StorageResult,
};

/// 学习会话
#[derive(Debug, Clone)]
pub struct StudySession {
    module_id: i64,
    cards: Vec<CardRow>,
    progress: ProgressSource,
    position: usize,
    unanswered: Vec<i64>,
}

/// 会话结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// 模块 ID
    pub module_id: i64,
    /// 本次会话的卡片总数
    pub total: usize,
    /// 不认识（或未作答）的卡片 ID，按出现顺序
    pub unanswered: Vec<i64>,
}

impl SessionSummary {
    /// 不认识的卡片数量
    pub fn unanswered_count(&self) -> usize {
        self.unanswered.len()
    }
}

impl StudySession {
    /// 用已加载的模块卡片创建会话
    pub fn new(module_id: i64, loaded: ModuleCards) -> Self {
        Self {
            module_id,
            cards: loaded.cards,
            progress: loaded.progress,
            position: 0,
            unanswered: Vec::new(),
        }
    }

    /// 从存储加载模块卡片并开始会话
    pub fn start(
        storage: &StorageManager,
        module_id: i64,
        is_random: bool,
        is_unanswered_only: bool,
    ) -> StorageResult<Self> {
        let loaded = storage.get_module_cards(module_id, is_random, is_unanswered_only)?;
        Ok(Self::new(module_id, loaded))
    }

    pub fn module_id(&self) -> i64 {
        self.module_id
    }

    /// 卡片集合是否来自进度退回
    pub fn is_fallback(&self) -> bool {
        self.progress == ProgressSource::Fallback
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    /// 剩余未翻看的卡片数
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.position
    }

    /// 当前卡片，会话结束后为 `None`
    pub fn current(&self) -> Option<&CardRow> {
        self.cards.get(self.position)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.cards.len()
    }

    /// 记录当前卡片的作答并前进到下一张
    pub fn answer(&mut self, knew_it: bool) -> StorageResult<()> {
        let card_id = self
            .current()
            .map(|card| card.id)
            .ok_or_else(|| StorageError::Validation("学习会话已结束".to_string()))?;

        if !knew_it {
            self.unanswered.push(card_id);
        }
        self.position += 1;

        Ok(())
    }

    /// 结束会话
    ///
    /// 尚未翻看的卡片计为不认识。
    pub fn finish(self) -> SessionSummary {
        let mut unanswered = self.unanswered;
        unanswered.extend(self.cards[self.position..].iter().map(|card| card.id));

        SessionSummary {
            module_id: self.module_id,
            total: self.cards.len(),
            unanswered,
        }
    }
}

impl StorageManager {
    /// 写回会话结果
    pub fn complete_session(&self, summary: &SessionSummary) -> StorageResult<()> {
        self.update_module_progress(summary.module_id, &summary.unanswered)?;
        tracing::info!(
            module_id = summary.module_id,
            total = summary.total,
            unanswered = summary.unanswered_count(),
            "study session completed"
        );
        Ok(())
    }
}
