// ==========================================
// 货架陈列系统 - 货架缓存
// ==========================================
// 职责: 按货架缓存网格视图与统计（TTL，默认 3600 秒）
// 红线: 每个写操作返回前同步调用 invalidate(shelf_id)
// 红线: 与失效并发的计算结果不得写入缓存（代际计数）
// 说明: 计算在缓存锁之外执行，读操作之间互不阻塞
// ==========================================

use crate::domain::types::ShelfId;
use crate::engine::grid::ShelfGrid;
use crate::engine::statistics::ShelfStatistics;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// 默认 TTL（秒）
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug)]
struct Timed<T> {
    value: Arc<T>,
    stored_at: Instant,
}

impl<T> Timed<T> {
    fn fresh(&self, ttl: Duration) -> Option<Arc<T>> {
        if self.stored_at.elapsed() < ttl {
            Some(self.value.clone())
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct ShelfEntry {
    grid: Option<Timed<ShelfGrid>>,
    stats: Option<Timed<ShelfStatistics>>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<ShelfId, ShelfEntry>,
    generations: HashMap<ShelfId, u64>,
}

impl CacheState {
    fn generation(&self, shelf_id: ShelfId) -> u64 {
        self.generations.get(&shelf_id).copied().unwrap_or(0)
    }
}

/// 缓存槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Grid,
    Stats,
}

impl Slot {
    fn as_str(&self) -> &'static str {
        match self {
            Slot::Grid => "grid",
            Slot::Stats => "stats",
        }
    }
}

// ==========================================
// ShelfCache
// ==========================================
pub struct ShelfCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl ShelfCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // 缓存状态只含可重建数据，锁中毒时直接接管
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 读取网格（未命中时调用 compute 生成并写入）
    pub fn get_grid<E, F>(&self, shelf_id: ShelfId, compute: F) -> Result<Arc<ShelfGrid>, E>
    where
        F: FnOnce() -> Result<ShelfGrid, E>,
    {
        self.get_or_compute(
            shelf_id,
            Slot::Grid,
            |entry| entry.grid.as_ref(),
            |entry, value| entry.grid = Some(value),
            compute,
        )
    }

    /// 读取统计（未命中时调用 compute 生成并写入）
    pub fn get_stats<E, F>(&self, shelf_id: ShelfId, compute: F) -> Result<Arc<ShelfStatistics>, E>
    where
        F: FnOnce() -> Result<ShelfStatistics, E>,
    {
        self.get_or_compute(
            shelf_id,
            Slot::Stats,
            |entry| entry.stats.as_ref(),
            |entry, value| entry.stats = Some(value),
            compute,
        )
    }

    fn get_or_compute<T, E, R, W, F>(
        &self,
        shelf_id: ShelfId,
        slot: Slot,
        read: R,
        write: W,
        compute: F,
    ) -> Result<Arc<T>, E>
    where
        R: Fn(&ShelfEntry) -> Option<&Timed<T>>,
        W: FnOnce(&mut ShelfEntry, Timed<T>),
        F: FnOnce() -> Result<T, E>,
    {
        let generation = {
            let state = self.lock();
            if let Some(hit) = state
                .entries
                .get(&shelf_id)
                .and_then(|entry| read(entry))
                .and_then(|timed| timed.fresh(self.ttl))
            {
                debug!(shelf_id, slot = slot.as_str(), "cache hit");
                return Ok(hit);
            }
            state.generation(shelf_id)
        };

        debug!(shelf_id, slot = slot.as_str(), "cache miss");
        let value = Arc::new(compute()?);

        let mut state = self.lock();
        if state.generation(shelf_id) == generation {
            write(
                state.entries.entry(shelf_id).or_default(),
                Timed {
                    value: value.clone(),
                    stored_at: Instant::now(),
                },
            );
        } else {
            debug!(shelf_id, slot = slot.as_str(), "cache store skipped: invalidated during compute");
        }
        Ok(value)
    }

    /// 失效货架的网格与统计
    pub fn invalidate(&self, shelf_id: ShelfId) {
        let mut state = self.lock();
        *state.generations.entry(shelf_id).or_insert(0) += 1;
        state.entries.remove(&shelf_id);
        debug!(shelf_id, "cache invalidated");
    }

    /// 清空全部缓存
    pub fn clear(&self) {
        let mut state = self.lock();
        let shelf_ids: Vec<ShelfId> = state.entries.keys().copied().collect();
        for shelf_id in shelf_ids {
            *state.generations.entry(shelf_id).or_insert(0) += 1;
        }
        state.entries.clear();
    }

    /// 是否存在未过期的缓存（网格或统计）
    pub fn is_cached(&self, shelf_id: ShelfId) -> bool {
        let state = self.lock();
        state.entries.get(&shelf_id).map_or(false, |entry| {
            entry.grid.as_ref().and_then(|t| t.fresh(self.ttl)).is_some()
                || entry.stats.as_ref().and_then(|t| t.fresh(self.ttl)).is_some()
        })
    }
}

impl Default for ShelfCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }
}
