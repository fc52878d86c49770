//! Listing parameters shared by every paginated collection

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `asc` and an empty value sort ascending, anything else descending
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Asc,
            Some(v) if v.eq_ignore_ascii_case("asc") => Self::Asc,
            Some(_) => Self::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Search, sort and pagination for a list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub search: String,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: None,
            order: SortOrder::Asc,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ListParams {
    /// Build from optional raw query values
    pub fn from_query(
        search: Option<String>,
        sort: Option<String>,
        order: Option<String>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Self {
        Self {
            search: search.map(|s| s.trim().to_string()).unwrap_or_default(),
            sort: sort.filter(|s| !s.trim().is_empty()),
            order: SortOrder::from_param(order.as_deref()),
            limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(sort.into());
        self.order = order;
        self
    }

    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Case-insensitive substring match; an empty search matches everything
    pub fn matches<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        if self.search.is_empty() {
            return true;
        }

        let needle = self.search.to_lowercase();
        fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Resolve the sort column against a whitelist, falling back to `default`
    pub fn sort_column<S: SortKey>(&self) -> S {
        self.sort
            .as_deref()
            .and_then(S::from_param)
            .unwrap_or_default()
    }

    /// Apply offset and limit to an already sorted vector
    pub fn paginate<T>(&self, records: Vec<T>) -> Vec<T> {
        records
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

/// Whitelisted sort columns of a collection
pub trait SortKey: Default + Copy {
    fn from_param(value: &str) -> Option<Self>;
}

/// One page of a collection plus the unpaginated total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total: usize) -> Self {
        Self { records, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            records: self.records.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
