//! Query parameters and envelope shared by list endpoints

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{ListParams, Page};

/// `?search=&sort=&order=&limit=&offset=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListQuery> for ListParams {
    fn from(query: ListQuery) -> Self {
        ListParams::from_query(
            query.search,
            query.sort,
            query.order,
            query.limit,
            query.offset,
        )
    }
}

/// `{total, limit, offset, <key>: [...]}`
#[derive(Debug, Clone)]
pub struct ListResponse<T> {
    key: &'static str,
    total: usize,
    limit: usize,
    offset: usize,
    records: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(key: &'static str, page: Page<T>, params: &ListParams) -> Self {
        Self {
            key,
            total: page.total,
            limit: params.limit,
            offset: params.offset,
            records: page.records,
        }
    }
}

impl<T: Serialize> Serialize for ListResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("total", &self.total)?;
        map.serialize_entry("limit", &self.limit)?;
        map.serialize_entry("offset", &self.offset)?;
        map.serialize_entry(self.key, &self.records)?;
        map.end()
    }
}
