use async_trait::async_trait;

use crate::error::DataError;
use crate::query::{QueryError, Select, SortDirection};

/// Where a [`Builder`] executes its shaped query.
///
/// Provided by the repository engine; `fetch` loads the rows into the
/// caller's result, `count` runs a `COUNT(*)` for the same filter.
#[async_trait]
pub trait Destination: Send {
    /// Execute the select and keep the rows. Returns the number of rows loaded.
    async fn fetch(&mut self, query: &Select) -> Result<usize, DataError>;

    async fn count(&mut self, query: &Select) -> Result<u64, DataError>;
}

/// Query shaping strategy: adds ordering, paging or extra filters to a base
/// query and executes it into a [`Destination`].
#[async_trait]
pub trait Builder: Send {
    async fn execute(&mut self, query: Select, dest: &mut dyn Destination)
        -> Result<(), DataError>;
}

/// How a find operation shapes its query.
#[derive(Default)]
pub enum Shape<'a> {
    /// The operation's own ordering and limit.
    #[default]
    Default,
    Custom(&'a mut dyn Builder),
}

impl<'a> From<&'a mut Pager> for Shape<'a> {
    fn from(pager: &'a mut Pager) -> Self {
        Shape::Custom(pager)
    }
}

impl std::fmt::Debug for Shape<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Default => write!(f, "Default"),
            Shape::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Offset/limit paging with ordering and a best-effort total page count.
///
/// ```ignore
/// let mut pager = Pager::desc("price", &["id"]).set_page(2, 20);
/// let goods = repo.find_list_by_map(&filter, (&mut pager).into()).await?;
/// println!("{} pages", pager.total_page());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pager {
    columns: Vec<String>,
    direction: SortDirection,
    page: u64,
    page_size: u64,
    total_page: u64,
}

impl Pager {
    pub fn desc(column: &str, others: &[&str]) -> Self {
        Self::with_columns(SortDirection::Desc, column, others)
    }

    pub fn asc(column: &str, others: &[&str]) -> Self {
        Self::with_columns(SortDirection::Asc, column, others)
    }

    fn with_columns(direction: SortDirection, column: &str, others: &[&str]) -> Self {
        let columns = std::iter::once(column)
            .chain(others.iter().copied())
            .map(str::to_string)
            .collect();
        Self {
            columns,
            direction,
            ..Default::default()
        }
    }

    /// 1-based page and page size. Zero for either disables paging.
    pub fn set_page(mut self, page: u64, page_size: u64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Total pages for the last execution; 0 when unknown.
    pub fn total_page(&self) -> u64 {
        self.total_page
    }

    /// Order clause for the configured columns, `None` when there are none.
    pub fn order(&self) -> Option<String> {
        if self.columns.is_empty() {
            return None;
        }
        let dir = self.direction.as_sql();
        Some(
            self.columns
                .iter()
                .map(|c| format!("{c} {dir}"))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    fn paging(&self) -> bool {
        self.page > 0 && self.page_size > 0
    }
}

#[async_trait]
impl Builder for Pager {
    async fn execute(
        &mut self,
        query: Select,
        dest: &mut dyn Destination,
    ) -> Result<(), DataError> {
        self.total_page = 0;

        let mut shaped = if self.columns.is_empty() {
            query.order_by_id(SortDirection::Desc)
        } else {
            self.columns
                .iter()
                .fold(query, |q, col| q.order_by(col, self.direction))
        };
        if self.paging() {
            let offset = (self.page - 1)
                .checked_mul(self.page_size)
                .ok_or(QueryError::PageOutOfRange {
                    page: self.page,
                    page_size: self.page_size,
                })?;
            shaped = shaped.offset(offset).limit(self.page_size);
        }

        dest.fetch(&shaped).await?;

        if !self.paging() {
            return Ok(());
        }
        match dest.count(&shaped.without_paging()).await {
            Ok(total) if total > 0 => {
                self.total_page = total.div_ceil(self.page_size);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "pager count failed, total pages unknown");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeDest {
        rows: u64,
        count_fails: bool,
        fetched: Vec<Select>,
        counted: Vec<Select>,
    }

    #[async_trait]
    impl Destination for FakeDest {
        async fn fetch(&mut self, query: &Select) -> Result<usize, DataError> {
            self.fetched.push(query.clone());
            Ok(0)
        }

        async fn count(&mut self, query: &Select) -> Result<u64, DataError> {
            self.counted.push(query.clone());
            if self.count_fails {
                Err(DataError::Other("count failed".into()))
            } else {
                Ok(self.rows)
            }
        }
    }

    fn goods() -> Select {
        Select::new("goods", &["id", "name"], "id")
    }

    #[tokio::test]
    async fn test_total_pages_round_up() {
        let mut pager = Pager::desc("name", &[]).set_page(2, 3);
        let mut dest = FakeDest {
            rows: 10,
            ..Default::default()
        };
        pager.execute(goods(), &mut dest).await.unwrap();

        assert_eq!(pager.total_page(), 4);
        let fetched = &dest.fetched[0];
        assert_eq!(fetched.offset_value(), Some(3));
        assert_eq!(fetched.limit_value(), Some(3));
        let sql = fetched.build_select().unwrap().sql;
        assert!(sql.contains(r#"ORDER BY "name" DESC"#));

        let counted = &dest.counted[0];
        assert_eq!(counted.limit_value(), None);
        assert!(!counted.has_order());
    }

    #[tokio::test]
    async fn test_overflowing_offset_is_a_query_error() {
        let mut pager = Pager::desc("id", &[]).set_page(u64::MAX / 2, 3);
        let mut dest = FakeDest::default();
        let err = pager.execute(goods(), &mut dest).await.unwrap_err();

        assert!(matches!(err, DataError::Query(QueryError::PageOutOfRange { page_size: 3, .. })));
        assert!(dest.fetched.is_empty());
        assert_eq!(pager.total_page(), 0);
    }

    #[tokio::test]
    async fn test_zero_page_disables_paging() {
        let mut pager = Pager::asc("name", &["id"]).set_page(0, 20);
        let mut dest = FakeDest::default();
        pager.execute(goods(), &mut dest).await.unwrap();

        assert_eq!(dest.fetched[0].limit_value(), None);
        assert_eq!(dest.fetched[0].offset_value(), None);
        assert!(dest.counted.is_empty());
        assert_eq!(pager.total_page(), 0);
    }

    #[tokio::test]
    async fn test_default_order_is_primary_key_desc() {
        let mut pager = Pager::default().set_page(1, 5);
        let mut dest = FakeDest::default();
        pager.execute(goods(), &mut dest).await.unwrap();

        let sql = dest.fetched[0].build_select().unwrap().sql;
        assert!(sql.ends_with(r#"ORDER BY "id" DESC LIMIT 5 OFFSET 0"#));
        assert_eq!(pager.order(), None);
    }

    #[tokio::test]
    async fn test_count_failure_leaves_zero() {
        let mut pager = Pager::desc("id", &[]).set_page(1, 3);
        let mut ok = FakeDest {
            rows: 7,
            ..Default::default()
        };
        pager.execute(goods(), &mut ok).await.unwrap();
        assert_eq!(pager.total_page(), 3);

        let mut failing = FakeDest {
            count_fails: true,
            ..Default::default()
        };
        pager.execute(goods(), &mut failing).await.unwrap();
        assert_eq!(pager.total_page(), 0);
    }

    #[test]
    fn test_order_clause() {
        let pager = Pager::desc("price", &["id"]);
        assert_eq!(pager.order().as_deref(), Some("price DESC, id DESC"));
    }
}
