use dsu_core::paging::PageRequest;

/// Filter for [`crate::SchemaBin::list`]. `None` filters match everything.
#[derive(Debug, Clone, Default)]
pub struct SchemaQuery {
    pub id: Option<String>,
    pub version: Option<i64>,
    pub page: PageRequest,
}

/// Filter for [`crate::DataBin::query`].
#[derive(Debug, Clone)]
pub struct DataQuery {
    pub owner: String,
    pub schema_id: String,
    pub schema_version: i64,
    pub page: PageRequest,
}
