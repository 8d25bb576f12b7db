// ==========================================
// 货架陈列系统 - 占用索引
// ==========================================
// 职责: (row, column) -> 所属陈列位 的权威映射
// 红线: 每个陈列位的占用单元集合 == 其矩形；一个单元最多一个所属陈列位
// 例外: 强制陈列造成的重叠单元记入 shadowed，不改变既有所属关系
// 可随时由陈列位集合或 placement_cell 记录完全重建
// ==========================================

use crate::domain::placement::{CellDiff, OccupancyRecord, Placement};
use crate::domain::types::{CellPos, CellRect, PlacementId};
use std::collections::{BTreeSet, HashMap};

// ==========================================
// OccupancyIndex
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupancyIndex {
    rows: u32,
    columns: u32,
    owners: HashMap<CellPos, PlacementId>,
    rects: HashMap<PlacementId, CellRect>,
    /// 强制陈列重叠：单元 -> 被遮挡的陈列位（按插入顺序）
    shadowed: HashMap<CellPos, Vec<PlacementId>>,
}

impl OccupancyIndex {
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            ..Default::default()
        }
    }

    /// 由陈列位集合重建（按 placement_id 升序插入，先到者为所属）
    pub fn rebuild<'a, I>(rows: u32, columns: u32, placements: I) -> Self
    where
        I: IntoIterator<Item = &'a Placement>,
    {
        let mut sorted: Vec<&Placement> = placements.into_iter().collect();
        sorted.sort_by_key(|p| p.placement_id);

        let mut index = Self::new(rows, columns);
        for p in sorted {
            index.insert_unchecked(p.placement_id, p.rect());
        }
        index
    }

    /// 由持久化的占用记录重建
    ///
    /// 矩形取每个陈列位记录的包围盒；记录缺失的单元不会被补齐
    pub fn from_records(rows: u32, columns: u32, records: &[OccupancyRecord]) -> Self {
        let mut bounds: HashMap<PlacementId, (u32, u32, u32, u32)> = HashMap::new();
        for rec in records {
            let entry = bounds
                .entry(rec.placement_id)
                .or_insert((rec.row, rec.column, rec.row, rec.column));
            entry.0 = entry.0.min(rec.row);
            entry.1 = entry.1.min(rec.column);
            entry.2 = entry.2.max(rec.row);
            entry.3 = entry.3.max(rec.column);
        }

        let mut sorted: Vec<OccupancyRecord> = records.to_vec();
        sorted.sort_by_key(|r| (r.placement_id, r.row, r.column));

        let mut index = Self::new(rows, columns);
        for (id, (r0, c0, r1, c1)) in bounds {
            index
                .rects
                .insert(id, CellRect::new(r0, c0, r1 - r0 + 1, c1 - c0 + 1));
        }
        for rec in sorted {
            index.claim(rec.placement_id, rec.pos());
        }
        index
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    // ==========================================
    // 点查询 / 范围查询
    // ==========================================

    pub fn owner_at(&self, pos: CellPos) -> Option<PlacementId> {
        self.owners.get(&pos).copied()
    }

    pub fn is_free(&self, pos: CellPos) -> bool {
        !self.owners.contains_key(&pos)
    }

    pub fn rect_of(&self, placement_id: PlacementId) -> Option<CellRect> {
        self.rects.get(&placement_id).copied()
    }

    pub fn contains_placement(&self, placement_id: PlacementId) -> bool {
        self.rects.contains_key(&placement_id)
    }

    /// 矩形内出现的全部陈列位（含被遮挡者），升序去重
    pub fn placements_in(&self, rect: CellRect) -> Vec<PlacementId> {
        let mut ids = BTreeSet::new();
        for pos in rect.cells() {
            if let Some(id) = self.owners.get(&pos) {
                ids.insert(*id);
            }
            if let Some(hidden) = self.shadowed.get(&pos) {
                ids.extend(hidden.iter().copied());
            }
        }
        ids.into_iter().collect()
    }

    /// 与矩形冲突的陈列位（忽略 ignore），升序去重
    pub fn conflicts(&self, rect: CellRect, ignore: Option<PlacementId>) -> Vec<PlacementId> {
        self.placements_in(rect)
            .into_iter()
            .filter(|id| Some(*id) != ignore)
            .collect()
    }

    /// 矩形内所有单元都空闲（忽略 ignore 自身的占用）
    pub fn is_rect_free(&self, rect: CellRect, ignore: Option<PlacementId>) -> bool {
        rect.cells().all(|pos| match self.owners.get(&pos) {
            None => true,
            Some(id) => Some(*id) == ignore && !self.is_shadowed_by_other(pos, ignore),
        })
    }

    fn is_shadowed_by_other(&self, pos: CellPos, ignore: Option<PlacementId>) -> bool {
        self.shadowed
            .get(&pos)
            .map_or(false, |ids| ids.iter().any(|id| Some(*id) != ignore))
    }

    /// 陈列位占用的单元（含被遮挡单元），行优先
    pub fn cells_of(&self, placement_id: PlacementId) -> Vec<CellPos> {
        match self.rects.get(&placement_id) {
            Some(rect) => rect.cells_within(self.rows, self.columns),
            None => Vec::new(),
        }
    }

    /// 已占用单元数（去重）
    pub fn occupied_count(&self) -> usize {
        self.owners.len()
    }

    pub fn placement_count(&self) -> usize {
        self.rects.len()
    }

    /// 存在强制陈列造成的重叠
    pub fn has_overlaps(&self) -> bool {
        self.shadowed.values().any(|ids| !ids.is_empty())
    }

    /// 全部占用记录（持久化用），按 (placement_id, row, column) 排序
    pub fn records(&self) -> Vec<OccupancyRecord> {
        let mut out: Vec<OccupancyRecord> = self
            .rects
            .keys()
            .flat_map(|id| {
                self.cells_of(*id).into_iter().map(move |pos| OccupancyRecord {
                    placement_id: *id,
                    row: pos.row,
                    column: pos.column,
                })
            })
            .collect();
        out.sort_by_key(|r| (r.placement_id, r.row, r.column));
        out
    }

    /// 单元所属记录（每个被占用单元恰好一条，与 placement_cell 表对应），按 (row, column) 排序
    pub fn owner_records(&self) -> Vec<OccupancyRecord> {
        let mut out: Vec<OccupancyRecord> = self
            .owners
            .iter()
            .map(|(pos, id)| OccupancyRecord {
                placement_id: *id,
                row: pos.row,
                column: pos.column,
            })
            .collect();
        out.sort_by_key(|r| (r.row, r.column));
        out
    }

    /// 相对于 after 状态的单元所属差异（持久化增量）
    pub fn diff(&self, after: &OccupancyIndex) -> CellDiff {
        let mut cleared: Vec<CellPos> = self
            .owners
            .keys()
            .filter(|pos| !after.owners.contains_key(pos))
            .copied()
            .collect();
        cleared.sort();

        let mut assigned: Vec<OccupancyRecord> = after
            .owners
            .iter()
            .filter(|(pos, id)| self.owners.get(pos) != Some(id))
            .map(|(pos, id)| OccupancyRecord {
                placement_id: *id,
                row: pos.row,
                column: pos.column,
            })
            .collect();
        assigned.sort_by_key(|r| (r.row, r.column));

        CellDiff { cleared, assigned }
    }

    /// 单个陈列位的占用记录
    pub fn records_of(&self, placement_id: PlacementId) -> Vec<OccupancyRecord> {
        self.cells_of(placement_id)
            .into_iter()
            .map(|pos| OccupancyRecord {
                placement_id,
                row: pos.row,
                column: pos.column,
            })
            .collect()
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 插入（全有或全无）：越界或任一单元被占用则不做任何修改
    pub fn insert(&mut self, placement_id: PlacementId, rect: CellRect) -> Result<(), Vec<PlacementId>> {
        if !rect.fits_within(self.rows, self.columns) {
            return Err(Vec::new());
        }
        let conflicts = self.conflicts(rect, Some(placement_id));
        if !conflicts.is_empty() {
            return Err(conflicts);
        }
        self.remove(placement_id);
        self.insert_unchecked(placement_id, rect);
        Ok(())
    }

    /// 不校验插入（强制陈列）：越界部分被裁剪，重叠单元记入 shadowed
    ///
    /// 返回与其他陈列位重叠的单元
    pub fn insert_unchecked(&mut self, placement_id: PlacementId, rect: CellRect) -> Vec<CellPos> {
        if self.rects.contains_key(&placement_id) {
            self.remove(placement_id);
        }
        self.rects.insert(placement_id, rect);

        let mut overlapped = Vec::new();
        for pos in rect.cells_within(self.rows, self.columns) {
            if self.claim(placement_id, pos) {
                overlapped.push(pos);
            }
        }
        overlapped
    }

    /// 占用单元；已被他人占用时记入 shadowed 并返回 true
    fn claim(&mut self, placement_id: PlacementId, pos: CellPos) -> bool {
        match self.owners.get(&pos) {
            None => {
                self.owners.insert(pos, placement_id);
                false
            }
            Some(owner) if *owner == placement_id => false,
            Some(_) => {
                let hidden = self.shadowed.entry(pos).or_default();
                if !hidden.contains(&placement_id) {
                    hidden.push(placement_id);
                }
                true
            }
        }
    }

    /// 移除陈列位的全部占用；被遮挡者按插入顺序接替
    pub fn remove(&mut self, placement_id: PlacementId) -> Option<CellRect> {
        let rect = self.rects.remove(&placement_id)?;

        for pos in rect.cells_within(self.rows, self.columns) {
            if self.owners.get(&pos) == Some(&placement_id) {
                self.owners.remove(&pos);
                if let Some(hidden) = self.shadowed.get_mut(&pos) {
                    if !hidden.is_empty() {
                        let next = hidden.remove(0);
                        self.owners.insert(pos, next);
                    }
                }
            } else if let Some(hidden) = self.shadowed.get_mut(&pos) {
                hidden.retain(|id| *id != placement_id);
            }

            if self.shadowed.get(&pos).map_or(false, |h| h.is_empty()) {
                self.shadowed.remove(&pos);
            }
        }

        Some(rect)
    }

    /// 清空
    pub fn clear(&mut self) {
        self.owners.clear();
        self.rects.clear();
        self.shadowed.clear();
    }
}
