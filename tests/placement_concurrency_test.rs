// ==========================================
// 陈列并发与不变量测试
// ==========================================
// 职责: 同一货架的并发写入互斥；随机操作序列下占用不重叠
// ==========================================


mod helpers;

#[cfg(test)]
mod placement_concurrency_test {
    use crate::helpers::test_data_builder::{ProductBuilder, ShelfBuilder};
    use crate::test_helpers::StoreTestEnv;
    use shelf_planogram::domain::types::{CellPos, PlacementId};
    use shelf_planogram::engine::{PlaceCommand, PlacementErrorKind};
    use std::collections::HashMap;
    use std::sync::{Arc, Barrier};
    use std::thread;

    /// 简单线性同余发生器（测试内可复现）
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn below(&mut self, bound: u64) -> u64 {
            self.next() % bound
        }
    }

    #[test]
    fn test_concurrent_place_same_cell_single_winner() {
        let env = StoreTestEnv::new();
        let shelf = ShelfBuilder::new("A棚").insert(&env.shelf_repo);
        let product = ProductBuilder::new("A").size(8.0, 12.0).insert(&env.product_repo);

        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));
        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let store = env.store.clone();
                let barrier = barrier.clone();
                let (shelf_id, product_id) = (shelf.shelf_id, product.product_id);
                thread::spawn(move || {
                    barrier.wait();
                    store.place(
                        &PlaceCommand::new(shelf_id, product_id, 2, 3).by(&format!("worker-{}", i)),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        for result in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(result.kind(), PlacementErrorKind::Overlap);
        }

        assert_eq!(env.store.placements(shelf.shelf_id).unwrap().len(), 1);
        assert!(env.store.verify_occupancy(shelf.shelf_id).unwrap());
    }

    #[test]
    fn test_concurrent_place_different_shelves_all_succeed() {
        let env = StoreTestEnv::new();
        let shelves: Vec<_> = (0..4)
            .map(|i| ShelfBuilder::new(&format!("棚{}", i)).insert(&env.shelf_repo))
            .collect();
        let product = ProductBuilder::new("A").size(8.0, 12.0).insert(&env.product_repo);

        let barrier = Arc::new(Barrier::new(shelves.len()));
        let handles: Vec<_> = shelves
            .iter()
            .map(|shelf| {
                let store = env.store.clone();
                let barrier = barrier.clone();
                let (shelf_id, product_id) = (shelf.shelf_id, product.product_id);
                thread::spawn(move || {
                    barrier.wait();
                    store.place(&PlaceCommand::new(shelf_id, product_id, 0, 0))
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        for shelf in &shelves {
            assert_eq!(env.store.placements(shelf.shelf_id).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_random_operation_sequence_never_overlaps() {
        let env = StoreTestEnv::new();
        let shelf = ShelfBuilder::new("A棚").insert(&env.shelf_repo);
        let products: Vec<_> = [(8.0, 12.0), (10.0, 12.0), (20.0, 45.0), (35.0, 45.0), (14.0, 70.0)]
            .iter()
            .enumerate()
            .map(|(i, (w, h))| {
                ProductBuilder::new(&format!("P{}", i))
                    .size(*w, *h)
                    .insert(&env.product_repo)
            })
            .collect();

        let mut rng = Lcg(20240601);
        let mut live: Vec<PlacementId> = Vec::new();

        for _ in 0..200 {
            match rng.below(10) {
                0..=5 => {
                    let product = &products[rng.below(products.len() as u64) as usize];
                    let cmd = PlaceCommand::new(
                        shelf.shelf_id,
                        product.product_id,
                        rng.below(6) as u32,
                        rng.below(8) as u32,
                    )
                    .faces(rng.below(3) as i64 + 1);
                    match env.store.place(&cmd) {
                        Ok(p) => live.push(p.placement_id),
                        Err(e) => assert!(matches!(
                            e.kind(),
                            PlacementErrorKind::Overlap | PlacementErrorKind::OutOfBounds
                        )),
                    }
                }
                6..=7 if !live.is_empty() => {
                    let idx = rng.below(live.len() as u64) as usize;
                    let id = live.swap_remove(idx);
                    env.store.remove(id, "rng").unwrap();
                }
                _ if !live.is_empty() => {
                    let id = live[rng.below(live.len() as u64) as usize];
                    let fc = rng.below(4) as i64 + 1;
                    if let Err(e) = env.store.update_face_count(id, fc, "rng") {
                        assert!(matches!(
                            e.kind(),
                            PlacementErrorKind::Overlap | PlacementErrorKind::OutOfBounds
                        ));
                    }
                }
                _ => {}
            }

            // 每个单元至多一个所属，且所属陈列位的矩形覆盖该单元
            let placements = env.store.placements(shelf.shelf_id).unwrap();
            let mut owners: HashMap<CellPos, PlacementId> = HashMap::new();
            for p in &placements {
                assert!(p.rect().fits_within(shelf.rows, shelf.columns));
                for cell in p.occupied_cells() {
                    assert!(owners.insert(cell, p.placement_id).is_none(), "cell {:?} 重叠", cell);
                }
            }
            let index = env.store.occupancy(shelf.shelf_id).unwrap();
            assert_eq!(index.occupied_count(), owners.len());
        }

        assert!(env.store.verify_occupancy(shelf.shelf_id).unwrap());
        let reopened = env.reopen_store();
        assert_eq!(
            reopened.occupancy(shelf.shelf_id).unwrap().owner_records(),
            env.store.occupancy(shelf.shelf_id).unwrap().owner_records()
        );
    }

    #[test]
    fn test_failed_place_never_changes_occupancy() {
        let env = StoreTestEnv::new();
        let shelf = ShelfBuilder::new("A棚").insert(&env.shelf_repo);
        let big = ProductBuilder::new("BIG").size(35.0, 45.0).insert(&env.product_repo);

        env.store
            .place(&PlaceCommand::new(shelf.shelf_id, big.product_id, 0, 0))
            .unwrap();
        let before = env.store.occupancy(shelf.shelf_id).unwrap().owner_records();

        for (row, column) in [(1, 1), (0, 2), (5, 7), (4, 6)] {
            let _ = env
                .store
                .place(&PlaceCommand::new(shelf.shelf_id, big.product_id, row, column));
            let after = env.store.occupancy(shelf.shelf_id).unwrap();
            // 成功的陈列只增加占用，不改变既有单元的所属
            for rec in &before {
                assert_eq!(after.owner_at(rec.pos()), Some(rec.placement_id));
            }
        }
        assert!(env.store.verify_occupancy(shelf.shelf_id).unwrap());
    }
}
