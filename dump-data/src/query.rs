//! SQL statement building.
//!
//! [`Select`] is the query a repository operation starts from; a
//! [`Builder`](crate::Builder) may add ordering and paging before it is
//! executed. [`Insert`] and [`Update`] cover `create` and `save`.
//!
//! ```ignore
//! let stmt = Select::for_entity::<Goods>()
//!     .dialect(Dialect::Postgres)
//!     .where_eq("name", "apple")
//!     .order_by("id", SortDirection::Desc)
//!     .limit(10)
//!     .build_select()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::value::{FilterMap, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    #[default]
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    /// Pick the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(Dialect::Sqlite),
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            _ => None,
        }
    }

    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    /// Whether inserts read the generated key back through `RETURNING`.
    /// The `Any` driver reports no last insert id for SQLite, so SQLite
    /// (3.35+) takes this path too.
    pub fn returns_generated_key(self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Sqlite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierPolicy {
    /// Do not validate or quote identifiers.
    Raw,
    /// Validate identifiers against a conservative pattern.
    Validate,
    /// Validate and quote identifiers using the dialect quoting style.
    #[default]
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
    /// A raw expression's `?` count does not match its arguments.
    ArgumentCount { expected: usize, got: usize },
    /// `INSERT`/`UPDATE` without any column.
    EmptyColumnSet,
    /// `(page - 1) * page_size` does not fit in a `u64`.
    PageOutOfRange { page: u64, page_size: u64 },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            QueryError::ArgumentCount { expected, got } => {
                write!(f, "Expression expects {expected} argument(s), got {got}")
            }
            QueryError::EmptyColumnSet => write!(f, "Statement has no columns"),
            QueryError::PageOutOfRange { page, page_size } => {
                write!(f, "Page {page} of size {page_size} is out of range")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Rendered SQL plus its positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(String, Value),
    IsNull(String),
    In(String, Vec<Value>),
    Raw(String, Vec<Value>),
}

/// Shared rendering state: dialect, identifier policy and placeholder counter.
struct Render {
    dialect: Dialect,
    policy: IdentifierPolicy,
    next_placeholder: usize,
    params: Vec<Value>,
}

impl Render {
    fn new(dialect: Dialect, policy: IdentifierPolicy) -> Self {
        Self {
            dialect,
            policy,
            next_placeholder: 1,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        let placeholder = self.dialect.placeholder(self.next_placeholder);
        self.next_placeholder += 1;
        self.params.push(value);
        placeholder
    }

    fn ident(&self, ident: &str, kind: &'static str) -> Result<String, QueryError> {
        if self.policy == IdentifierPolicy::Raw {
            return Ok(ident.to_string());
        }
        if !is_valid_identifier(ident) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        match self.policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, self.dialect)),
            IdentifierPolicy::Raw | IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }

    /// Renumber the `?` placeholders of a raw expression, skipping quoted text.
    fn raw(&mut self, expr: &str, args: &[Value]) -> Result<String, QueryError> {
        let expected = count_placeholders(expr);
        if expected != args.len() {
            return Err(QueryError::ArgumentCount {
                expected,
                got: args.len(),
            });
        }
        let mut out = String::with_capacity(expr.len() + args.len() * 2);
        let mut args = args.iter();
        let mut in_quote = false;
        for c in expr.chars() {
            match c {
                '\'' => {
                    in_quote = !in_quote;
                    out.push(c);
                }
                '?' if !in_quote => {
                    if let Some(arg) = args.next() {
                        let placeholder = self.bind(arg.clone());
                        out.push_str(&placeholder);
                    }
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}

fn count_placeholders(expr: &str) -> usize {
    let mut in_quote = false;
    let mut count = 0;
    for c in expr.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            '?' if !in_quote => count += 1,
            _ => {}
        }
    }
    count
}

/// A `SELECT` over one table.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    id_column: String,
    conditions: Vec<Condition>,
    order: Vec<(String, SortDirection)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl Select {
    pub fn new(table: &str, columns: &[&str], id_column: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            id_column: id_column.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Quote,
        }
    }

    /// Select every column of `T`'s table.
    pub fn for_entity<T: Entity>() -> Self {
        Self::new(T::table_name(), T::columns(), T::id_column())
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull(column.to_string()));
        self
    }

    pub fn where_in(mut self, column: &str, values: &[Value]) -> Self {
        self.conditions
            .push(Condition::In(column.to_string(), values.to_vec()));
        self
    }

    /// Add a raw conditional expression with `?` positional placeholders.
    /// An empty expression adds nothing.
    pub fn where_raw(mut self, expr: &str, args: &[Value]) -> Self {
        if !expr.trim().is_empty() {
            self.conditions
                .push(Condition::Raw(expr.to_string(), args.to_vec()));
        }
        self
    }

    /// Equality on every non-zero column of an entity.
    pub fn where_template<T: Entity>(self, template: &T) -> Self {
        template
            .template()
            .into_iter()
            .fold(self, |query, (column, value)| query.where_eq(column, value))
    }

    pub fn where_map(self, filter: &FilterMap) -> Self {
        filter.iter().fold(self, |query, (column, value)| {
            if value.is_null() {
                query.where_null(column)
            } else {
                query.where_eq(column, value.clone())
            }
        })
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order.push((column.to_string(), direction));
        self
    }

    /// Order by the primary key.
    pub fn order_by_id(self, direction: SortDirection) -> Self {
        let id = self.id_column.clone();
        self.order_by(&id, direction)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit_val
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset_val
    }

    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    /// The same filter without ordering, limit or offset.
    pub fn without_paging(&self) -> Self {
        Self {
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            ..self.clone()
        }
    }

    pub fn build_select(&self) -> Result<Statement, QueryError> {
        let mut render = Render::new(self.dialect, self.identifier_policy);
        let columns = self
            .columns
            .iter()
            .map(|c| render.ident(c, "column"))
            .collect::<Result<Vec<_>, _>>()?;
        let table = render.ident(&self.table, "table")?;
        let mut sql = format!("SELECT {} FROM {table}", columns.join(", "));
        self.append_where(&mut sql, &mut render)?;
        self.append_order(&mut sql, &render)?;
        self.append_limit_offset(&mut sql);
        Ok(render.finish(sql))
    }

    /// `COUNT(*)` over the same filter; ordering and paging are ignored.
    pub fn build_count(&self) -> Result<Statement, QueryError> {
        let mut render = Render::new(self.dialect, self.identifier_policy);
        let table = render.ident(&self.table, "table")?;
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        self.append_where(&mut sql, &mut render)?;
        Ok(render.finish(sql))
    }

    fn append_where(&self, sql: &mut String, render: &mut Render) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.conditions.len());
        for cond in &self.conditions {
            let clause = match cond {
                Condition::Eq(col, val) => {
                    let col = render.ident(col, "column")?;
                    let placeholder = render.bind(val.clone());
                    format!("{col} = {placeholder}")
                }
                Condition::IsNull(col) => format!("{} IS NULL", render.ident(col, "column")?),
                Condition::In(col, vals) if vals.is_empty() => {
                    render.ident(col, "column")?;
                    "1 = 0".to_string()
                }
                Condition::In(col, vals) => {
                    let col = render.ident(col, "column")?;
                    let placeholders: Vec<_> = vals.iter().map(|v| render.bind(v.clone())).collect();
                    format!("{col} IN ({})", placeholders.join(", "))
                }
                Condition::Raw(expr, args) => format!("({})", render.raw(expr, args)?),
            };
            clauses.push(clause);
        }
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        Ok(())
    }

    fn append_order(&self, sql: &mut String, render: &Render) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, direction) in &self.order {
            let col = render.ident(col, "column")?;
            clauses.push(format!("{col} {}", direction.as_sql()));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, sql: &mut String) {
        match (self.limit_val, self.offset_val) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => match self.dialect {
                // Both require a LIMIT before OFFSET.
                Dialect::Sqlite => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
                Dialect::MySql => {
                    sql.push_str(&format!(" LIMIT {} OFFSET {offset}", u64::MAX))
                }
                Dialect::Generic | Dialect::Postgres => sql.push_str(&format!(" OFFSET {offset}")),
            },
            (None, None) => {}
        }
    }
}

/// An `INSERT` of one row.
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    values: Vec<(String, Value)>,
    returning: Option<String>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl Insert {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            values: Vec::new(),
            returning: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Quote,
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.push((column.to_string(), value.into()));
        self
    }

    pub fn returning(mut self, column: &str) -> Self {
        self.returning = Some(column.to_string());
        self
    }

    pub fn build(&self) -> Result<Statement, QueryError> {
        if self.values.is_empty() {
            return Err(QueryError::EmptyColumnSet);
        }
        let mut render = Render::new(self.dialect, self.identifier_policy);
        let table = render.ident(&self.table, "table")?;
        let mut columns = Vec::with_capacity(self.values.len());
        let mut placeholders = Vec::with_capacity(self.values.len());
        for (col, val) in &self.values {
            columns.push(render.ident(col, "column")?);
            placeholders.push(render.bind(val.clone()));
        }
        let mut sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        if let Some(col) = &self.returning {
            sql.push_str(&format!(" RETURNING {}", render.ident(col, "column")?));
        }
        Ok(render.finish(sql))
    }
}

/// An `UPDATE` of the given columns on the row identified by its primary key.
#[derive(Debug, Clone)]
pub struct Update {
    table: String,
    sets: Vec<(String, Value)>,
    key: Option<(String, Value)>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl Update {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Vec::new(),
            key: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Quote,
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.sets.push((column.to_string(), value.into()));
        self
    }

    pub fn where_id(mut self, column: &str, id: impl Into<Value>) -> Self {
        self.key = Some((column.to_string(), id.into()));
        self
    }

    pub fn build(&self) -> Result<Statement, QueryError> {
        if self.sets.is_empty() {
            return Err(QueryError::EmptyColumnSet);
        }
        let mut render = Render::new(self.dialect, self.identifier_policy);
        let table = render.ident(&self.table, "table")?;
        let mut assignments = Vec::with_capacity(self.sets.len());
        for (col, val) in &self.sets {
            let col = render.ident(col, "column")?;
            assignments.push(format!("{col} = {}", render.bind(val.clone())));
        }
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        if let Some((col, id)) = &self.key {
            let col = render.ident(col, "column")?;
            sql.push_str(&format!(" WHERE {col} = {}", render.bind(id.clone())));
        }
        Ok(render.finish(sql))
    }
}

fn is_valid_identifier(ident: &str) -> bool {
    !ident.is_empty() && ident.split('.').all(is_valid_segment)
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, dialect: Dialect) -> String {
    let quote = dialect.quote_char();
    ident
        .split('.')
        .map(|part| format!("{quote}{part}{quote}"))
        .collect::<Vec<_>>()
        .join(".")
}
