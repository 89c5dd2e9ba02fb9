use std::path::{Path, PathBuf};

/// Directory all inputs are read from and all outputs written to.
pub const BASE_DIR: &str = "my_ws";

/// Year whose twelve monthly index columns are quarterized.
pub const HOUSING_INDEX_YEAR: i32 = 2024;

const ADMIN_CODE_INPUT: &str = "법정동_행정구역 코드.txt";
const ADMIN_CODE_OUTPUT: &str = "경기도_행정구역코드_시군구.csv";
const CARD_ZIP_DIR: &str = "카드소비데이터_모음";
const CARD_OUTPUT: &str = "경기_카드소비_시군구_분기별.csv";
const SALE_INDEX_INPUT: &str = "(월) 지역별 매매지수_아파트.xlsx";
const SALE_INDEX_OUTPUT: &str = "매매지수_2024분기.csv";
const RENT_INDEX_INPUT: &str = "(월) 지역별 전세지수_아파트.xlsx";
const RENT_INDEX_OUTPUT: &str = "전세지수_2024분기.csv";

/// Every file the pipeline touches.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePaths {
    pub base_dir: PathBuf,
    pub admin_code_input: PathBuf,
    pub admin_code_output: PathBuf,
    pub card_zip_dir: PathBuf,
    pub card_output: PathBuf,
    pub sale_index_input: PathBuf,
    pub sale_index_output: PathBuf,
    pub rent_index_input: PathBuf,
    pub rent_index_output: PathBuf,
    pub housing_year: i32,
}

impl PipelinePaths {
    /// The standard file layout rooted at `base`.
    pub fn under(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            base_dir: base.to_path_buf(),
            admin_code_input: base.join(ADMIN_CODE_INPUT),
            admin_code_output: base.join(ADMIN_CODE_OUTPUT),
            card_zip_dir: base.join(CARD_ZIP_DIR),
            card_output: base.join(CARD_OUTPUT),
            sale_index_input: base.join(SALE_INDEX_INPUT),
            sale_index_output: base.join(SALE_INDEX_OUTPUT),
            rent_index_input: base.join(RENT_INDEX_INPUT),
            rent_index_output: base.join(RENT_INDEX_OUTPUT),
            housing_year: HOUSING_INDEX_YEAR,
        }
    }
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self::under(BASE_DIR)
    }
}
