// ==========================================
// API 集成测试
// ==========================================
// 职责: 通过 AppState 组装的 PlanogramApi / ImportApi 验证完整调用链
// ==========================================

mod helpers;

#[cfg(test)]
mod api_test {
    use crate::helpers::api_test_helper::ApiTestEnv;
    use shelf_planogram::api::{ApiError, PlacementRequest};
    use shelf_planogram::domain::action_log::ActionType;
    use shelf_planogram::domain::product::{FaceCountBounds, Product};
    use shelf_planogram::domain::shelf::Shelf;
    use shelf_planogram::engine::PlacementErrorKind;
    use std::io::Write;

    fn request(shelf_id: i64, product_id: i64, row: u32, column: u32, face_count: i64) -> PlacementRequest {
        PlacementRequest {
            shelf_id,
            product_id,
            row,
            column,
            face_count,
            force: false,
        }
    }

    /// 标准货架 + 自社商品 + 竞品
    fn setup(env: &ApiTestEnv) -> (Shelf, Product, Product) {
        let api = &env.state.planogram_api;
        let shelf = api
            .create_shelf(Shelf::new("饮料棚", 120.0, 180.0, 60.0, 6, 8), "alice")
            .unwrap();

        let own_maker = api.create_maker("自社").unwrap();
        let rival_maker = api.create_maker("竞品厂商").unwrap();
        let own = api
            .create_product(
                Product::new("自社茶", "4900000000101", own_maker)
                    .with_size(Some(10.0), Some(12.0), Some(6.0))
                    .own(true),
            )
            .unwrap();
        let rival = api
            .create_product(
                Product::new("竞品水", "4900000000202", rival_maker)
                    .with_size(Some(8.0), Some(12.0), None),
            )
            .unwrap();
        (shelf, own, rival)
    }

    #[test]
    fn test_create_and_read_master_data() {
        let env = ApiTestEnv::new();
        let (shelf, own, _) = setup(&env);
        let api = &env.state.planogram_api;

        assert_eq!(shelf.created_by.as_deref(), Some("alice"));
        let loaded = api.get_shelf(shelf.shelf_id).unwrap();
        assert_eq!((loaded.rows, loaded.columns), (6, 8));
        assert_eq!(api.list_shelves().unwrap().len(), 1);

        let product = api.get_product(own.product_id).unwrap();
        assert!(product.is_own_product);
        assert_eq!(product.width, Some(10.0));

        let products = api.list_products().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].maker_name, "自社");

        // 同名厂商返回既有ID
        assert_eq!(api.create_maker("自社").unwrap(), own.maker_id);
    }

    #[test]
    fn test_invalid_master_data_rejected() {
        let env = ApiTestEnv::new();
        let api = &env.state.planogram_api;

        let err = api
            .create_shelf(Shelf::new("坏货架", 120.0, 180.0, 60.0, 0, 8), "alice")
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = api
            .create_shelf(Shelf::new("  ", 120.0, 180.0, 60.0, 6, 8), "alice")
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = api
            .create_shelf(Shelf::new("货架", 120.0, 180.0, 60.0, 6, 8), " ")
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let maker = api.create_maker("厂商").unwrap();
        let err = api
            .create_product(Product::new("商品", "X1", maker).with_size(Some(-1.0), Some(5.0), None))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let mut product = Product::new("商品", "X2", maker);
        product.face_count_bounds = Some(FaceCountBounds {
            min: Some(5),
            max: Some(2),
        });
        assert!(matches!(api.create_product(product), Err(ApiError::InvalidInput(_))));

        assert!(matches!(api.get_product(12345), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_place_update_remove_flow() {
        let env = ApiTestEnv::new();
        let (shelf, own, rival) = setup(&env);
        let api = &env.state.planogram_api;

        let p_own = api.place(&request(shelf.shelf_id, own.product_id, 0, 0, 3), "alice").unwrap();
        assert_eq!(p_own.span_columns, 2);
        let p_rival = api.place(&request(shelf.shelf_id, rival.product_id, 1, 0, 1), "bob").unwrap();

        let stats = api.get_stats(shelf.shelf_id).unwrap();
        assert_eq!(stats.occupied_cells, 3);
        assert_eq!(stats.occupancy_rate, 6.3);
        assert_eq!(stats.own_share, 75.0);

        let err = api
            .place(&request(shelf.shelf_id, rival.product_id, 0, 1, 1), "bob")
            .unwrap_err();
        assert_eq!(err.placement_kind(), Some(PlacementErrorKind::Overlap));

        let updated = api.update_face_count(p_own.placement_id, 1, "alice").unwrap();
        assert_eq!(updated.span_columns, 1);
        assert!(api.can_place(shelf.shelf_id, rival.product_id, 0, 1, 1).unwrap());
        assert!(!api.can_place(shelf.shelf_id, rival.product_id, 0, 1, 0).unwrap());

        api.remove_placement(p_rival.placement_id, "bob").unwrap();
        let placements = api.list_placements(shelf.shelf_id).unwrap();
        assert_eq!(placements.len(), 1);
        assert_eq!(api.get_placement(p_own.placement_id).unwrap().face_count, 1);
        assert!(matches!(
            api.get_placement(p_rival.placement_id),
            Err(ApiError::NotFound(_))
        ));

        let logs = api.list_action_logs(shelf.shelf_id, None).unwrap();
        assert_eq!(logs.len(), 4);
        assert_eq!(logs[0].parsed_action_type(), Some(ActionType::RemovePlacement));
        assert_eq!(logs[0].actor, "bob");
        assert_eq!(api.list_action_logs(shelf.shelf_id, Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_request_json_defaults() {
        let req: PlacementRequest =
            serde_json::from_str(r#"{"shelf_id": 1, "product_id": 2, "row": 0, "column": 3}"#).unwrap();
        assert_eq!(req.face_count, 1);
        assert!(!req.force);
        assert_eq!(req, request(1, 2, 0, 3, 1));
    }

    #[test]
    fn test_forced_request_and_grid() {
        let env = ApiTestEnv::new();
        let (shelf, own, rival) = setup(&env);
        let api = &env.state.planogram_api;

        let first = api.place(&request(shelf.shelf_id, rival.product_id, 0, 0, 1), "bob").unwrap();
        let mut forced = request(shelf.shelf_id, own.product_id, 0, 0, 3);
        forced.force = true;
        let second = api.place(&forced, "alice").unwrap();
        assert!(second.force_override);

        let grid = api.get_grid(shelf.shelf_id).unwrap();
        assert_eq!(grid.shelf_info.rows, 6);
        let origin = grid.cell(0, 0).unwrap().placement.as_ref().unwrap();
        assert_eq!(origin.placement_id, first.placement_id);
        assert!(origin.is_origin);
        let shadow = grid.cell(0, 1).unwrap().placement.as_ref().unwrap();
        assert_eq!(shadow.placement_id, second.placement_id);
        assert!(!shadow.is_origin);
        assert_eq!(shadow.maker_name, "自社");
    }

    #[test]
    fn test_suggest_and_compatibility() {
        let env = ApiTestEnv::new();
        let (shelf, own, _) = setup(&env);
        let api = &env.state.planogram_api;

        let suggestions = api.suggest(shelf.shelf_id, own.product_id, 1).unwrap();
        assert_eq!(suggestions.len(), env.state.engine_config.suggestion.top_n);
        for pair in suggestions.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        let best = &suggestions[0];
        assert!(api
            .can_place(shelf.shelf_id, own.product_id, best.row, best.column, 1)
            .unwrap());

        assert!(matches!(
            api.suggest(shelf.shelf_id, own.product_id, 0),
            Err(ApiError::InvalidInput(_))
        ));

        let compat = api.shelf_compatibility(shelf.shelf_id, own.product_id).unwrap();
        assert!(compat.compatible);
        assert_eq!(compat.required_cells, 1);
    }

    #[test]
    fn test_delete_shelf_via_api() {
        let env = ApiTestEnv::new();
        let (shelf, own, _) = setup(&env);
        let api = &env.state.planogram_api;

        api.place(&request(shelf.shelf_id, own.product_id, 0, 0, 1), "alice").unwrap();
        api.delete_shelf(shelf.shelf_id, "alice").unwrap();

        assert!(matches!(api.get_shelf(shelf.shelf_id), Err(ApiError::NotFound(_))));
        assert!(api.list_shelves().unwrap().is_empty());
        let logs = api.list_action_logs(shelf.shelf_id, None).unwrap();
        assert_eq!(logs[0].parsed_action_type(), Some(ActionType::DeleteShelf));
    }

    #[test]
    fn test_import_api() {
        let env = ApiTestEnv::new();
        let (shelf, own, rival) = setup(&env);

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "shelf_id,product_id,row,column,face_count").unwrap();
        writeln!(file, "{},{},0,0,2", shelf.shelf_id, own.product_id).unwrap();
        writeln!(file, "{},{},0,0,1", shelf.shelf_id, rival.product_id).unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        let report = env.state.import_api.import_placements(&path, "importer").unwrap();
        assert_eq!(report.placed, 1);
        assert_eq!(report.rejected, 1);

        let err = env
            .state
            .import_api
            .import_placements("missing.csv", "importer")
            .unwrap_err();
        assert!(matches!(err, ApiError::ImportError(_)));
    }
}
