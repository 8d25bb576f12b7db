// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use shelf_planogram::domain::product::{FaceCountBounds, Product};
use shelf_planogram::domain::shelf::Shelf;
use shelf_planogram::repository::{ProductRepository, ShelfRepository};

// ==========================================
// Shelf 构建器
// ==========================================
// 默认: 120cm × 180cm × 60cm, 6段 × 8列（单元 15cm × 30cm）

pub struct ShelfBuilder {
    name: String,
    width: f64,
    height: f64,
    depth: f64,
    rows: u32,
    columns: u32,
    cell_width: Option<f64>,
    cell_height: Option<f64>,
}

impl ShelfBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: 120.0,
            height: 180.0,
            depth: 60.0,
            rows: 6,
            columns: 8,
            cell_width: None,
            cell_height: None,
        }
    }

    pub fn size(mut self, width: f64, height: f64, depth: f64) -> Self {
        self.width = width;
        self.height = height;
        self.depth = depth;
        self
    }

    pub fn grid(mut self, rows: u32, columns: u32) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    pub fn cell_size(mut self, cell_width: f64, cell_height: f64) -> Self {
        self.cell_width = Some(cell_width);
        self.cell_height = Some(cell_height);
        self
    }

    pub fn build(self) -> Shelf {
        Shelf::new(&self.name, self.width, self.height, self.depth, self.rows, self.columns)
            .with_cell_size(self.cell_width, self.cell_height)
    }

    /// 构建并写入数据库，返回带 shelf_id 的货架
    pub fn insert(self, repo: &ShelfRepository) -> Shelf {
        let mut shelf = self.build();
        shelf.shelf_id = repo.insert(&shelf).expect("插入货架失败");
        shelf
    }
}

// ==========================================
// Product 构建器
// ==========================================

pub struct ProductBuilder {
    name: String,
    code: String,
    maker: String,
    width: Option<f64>,
    height: Option<f64>,
    depth: Option<f64>,
    own: bool,
    bounds: Option<FaceCountBounds>,
}

impl ProductBuilder {
    pub fn new(code: &str) -> Self {
        Self {
            name: format!("商品{}", code),
            code: code.to_string(),
            maker: "自社".to_string(),
            width: None,
            height: None,
            depth: None,
            own: false,
            bounds: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn maker(mut self, maker: &str) -> Self {
        self.maker = maker.to_string();
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn depth(mut self, depth: f64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn own(mut self) -> Self {
        self.own = true;
        self
    }

    pub fn face_bounds(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.bounds = Some(FaceCountBounds { min, max });
        self
    }

    /// 构建（maker_id 由调用方指定）
    pub fn build(self, maker_id: i64) -> Product {
        let mut product = Product::new(&self.name, &self.code, maker_id)
            .with_size(self.width, self.height, self.depth)
            .own(self.own);
        product.maker_name = self.maker;
        product.face_count_bounds = self.bounds;
        product
    }

    /// 构建并写入数据库（厂商不存在时自动创建）
    pub fn insert(self, repo: &ProductRepository) -> Product {
        let maker_id = repo.upsert_maker(&self.maker).expect("插入厂商失败");
        let mut product = self.build(maker_id);
        product.product_id = repo.insert(&product).expect("插入商品失败");
        product
    }
}
