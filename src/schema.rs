// src/schema.rs
//! Sheet and column names of the payroll workbook.

/// Hours sheets, in order of preference.
pub mod hours {
    pub const TABLE_CANDIDATES: [&str; 2] = ["工时数据", "累计工时"];

    pub const EMPLOYEE_ID: &str = "工号";
    pub const NAME: &str = "姓名";
    pub const TITLE: &str = "职位名称";
    pub const STORE_CODE: &str = "门店编码";
    pub const CUMULATIVE_HOURS: &str = "总工时";
    pub const PERIOD_HOURS: &str = "考勤工时";
    pub const REGION: &str = "区域";
    pub const AREA_MANAGER: &str = "区经理";
    pub const ANNUAL_LEAVE_HOURS: &str = "年假小时数";
}

/// Employee master data (`基本数据`) and the roster (`花名册`) share columns.
pub mod master {
    pub const TABLE: &str = "基本数据";
    pub const ROSTER_TABLE: &str = "花名册";

    pub const EMPLOYEE_ID: &str = "工号";
    pub const NAME: &str = "姓名";
    pub const TITLE: &str = "职位";
    pub const ENTRY_DATE: &str = "入职日期";
    pub const REGULARIZATION_DATE: &str = "转正日期";
    pub const DEPARTURE_DATE: &str = "离职日期";
    pub const WORK_REGION: &str = "工作地区";
    pub const THIRD_PARTY: &str = "第三方";
    pub const NATIONAL_ID: &str = "身份证号码";
}

pub mod certs {
    pub const TABLE: &str = "过岗数据";

    pub const EMPLOYEE_ID: &str = "工号";
    pub const NAME: &str = "证书名称";
    pub const STATUS: &str = "状态";
    pub const EFFECTIVE_DATE: &str = "生效日期";

    pub const VALID_STATUS: &str = "有效";

    pub const LOBBY_SERVICE: &str = "【奈雪】大堂服务岗证书";
    pub const KITCHEN: &str = "【奈雪】后厨岗证书";
    pub const BEVERAGE_BAR: &str = "【奈雪】水吧岗证书";
    pub const REQUIRED: [&str; 3] = [LOBBY_SERVICE, KITCHEN, BEVERAGE_BAR];
}

pub mod managers {
    pub const TABLE: &str = "门店负责人";

    pub const STORE_CODE: &str = "部门编号";
    pub const MANAGER_ID: &str = "店长";
    pub const DEPARTMENT_NAME: &str = "部门名称";
}

pub mod stores {
    pub const TABLE: &str = "门店状态表";

    pub const STORE_CODE: &str = "ERP门店编码";
    pub const STORE_CODE_ALIAS: &str = "门店编码";
    pub const BRAND: &str = "品牌";
    pub const OPEN_DATE: &str = "开始营业";
    pub const CLOSE_DATE: &str = "闭店时间";
    pub const REGION: &str = "区域";
    pub const AREA_MANAGER: &str = "区经理";
}

pub mod criteria {
    pub const TABLE: &str = "筛选条件";
}

/// Job titles per role group.
pub mod titles {
    pub const TEA_MASTER: [&str; 4] = ["茶饮师", "茶饮师（S）", "专业培训师", "茶饮培训师"];
    pub const PART_TIME_MARKER: &str = "兼职";
    pub const INTERN: &str = "就业见习生";
    pub const ASSISTANT_MANAGER: [&str; 2] = ["副经理", "副店长"];
    pub const STORE_MANAGER: [&str; 4] = ["店长", "店长（S）", "储备店长", "资深店长"];
}

/// Columns of the projected eligible table the projector knows how to fill.
pub mod output {
    pub const EMPLOYEE_ID: &str = "工号";
    pub const NAME: &str = "姓名";
    pub const NATIONAL_ID: &str = "身份证信息";
    pub const STORE_CODE: &str = "门店编码";
    pub const DEPARTMENT: &str = "部门";
    pub const THIRD_PARTY: &str = "第三方";
    pub const WORK_REGION: &str = "工作地区";
    pub const TITLE: &str = "职位";
    pub const ENTRY_DATE: &str = "入职日期";
    pub const REGULARIZATION_DATE: &str = "转正日期";
    pub const DEPARTURE_DATE: &str = "离职日期";
    pub const ORG_TYPE: &str = "组织类型";
    pub const REGION: &str = "所属区域";
    pub const AREA_MANAGER: &str = "负责人";
    pub const OPEN_DATE: &str = "开业时间";
    pub const CLOSE_DATE: &str = "闭店时间";
    pub const HOURS: &str = "工时";
    pub const ANNUAL_LEAVE_HOURS: &str = "年假小时数";
    pub const TOTAL_HOURS: &str = "总工时";
    pub const IS_STORE_MANAGER: &str = "是否门店负责人";

    pub const YES: &str = "是";
    pub const NO: &str = "否";

    /// Column order of the bundled output template.
    pub const DEFAULT_SCHEMA: [&str; 20] = [
        EMPLOYEE_ID,
        NAME,
        NATIONAL_ID,
        STORE_CODE,
        DEPARTMENT,
        THIRD_PARTY,
        WORK_REGION,
        TITLE,
        ENTRY_DATE,
        REGULARIZATION_DATE,
        DEPARTURE_DATE,
        ORG_TYPE,
        REGION,
        AREA_MANAGER,
        OPEN_DATE,
        CLOSE_DATE,
        HOURS,
        ANNUAL_LEAVE_HOURS,
        TOTAL_HOURS,
        IS_STORE_MANAGER,
    ];

    pub fn default_schema() -> Vec<String> {
        DEFAULT_SCHEMA.iter().map(|c| c.to_string()).collect()
    }
}

/// Columns of the exclusion report.
pub mod exclusions {
    pub const TABLE: &str = "排除原因";

    pub const EMPLOYEE_ID: &str = "工号";
    pub const NAME: &str = "姓名";
    pub const TITLE: &str = "职位";
    pub const STORE_CODE: &str = "门店编码";
    pub const CUMULATIVE_HOURS: &str = "累计工时";
    pub const PERIOD_HOURS: &str = "当期工时";
    pub const REASON: &str = "原因";

    pub const COLUMNS: [&str; 7] = [
        EMPLOYEE_ID,
        NAME,
        TITLE,
        STORE_CODE,
        CUMULATIVE_HOURS,
        PERIOD_HOURS,
        REASON,
    ];
}
