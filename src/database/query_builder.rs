use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::pagination::{Page, PageRequest};

/// A value bound to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    TextArray(Vec<String>),
}

/// Predicate fragments AND-combined into a WHERE clause. Fragments are
/// static SQL with `{}` marking where the bound value goes (every occurrence
/// refers to the same value); caller text only ever travels as a bind parameter.
#[derive(Debug, Default, Clone)]
pub struct WhereClause {
    fragments: Vec<String>,
    params: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment with one bound value, e.g. `push("r.user_id = {}", SqlValue::Int(7))`
    pub fn push(&mut self, fragment: &'static str, value: SqlValue) -> &mut Self {
        self.params.push(value);
        let placeholder = format!("${}", self.params.len());
        self.fragments.push(fragment.replace("{}", &placeholder));
        self
    }

    /// Add an OR group of fragments that bind nothing. An empty group adds nothing.
    pub fn push_any(&mut self, fragments: &[&'static str]) -> &mut Self {
        if !fragments.is_empty() {
            self.fragments.push(format!("({})", fragments.join(" OR ")));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Render as ` WHERE a AND b`, or an empty string when there are no fragments
    pub fn to_sql(&self) -> String {
        if self.fragments.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.fragments.join(" AND "))
        }
    }
}

/// Static parts of a paginated list query
#[derive(Debug, Clone, Copy)]
pub struct PagedQuery<'a> {
    /// `SELECT ... FROM ...` without a WHERE clause
    pub select: &'a str,
    /// `SELECT COUNT(*) FROM ...` over the same joins
    pub count: &'a str,
    /// ORDER BY expression; must end in a unique column
    pub order_by: &'a str,
}

impl PagedQuery<'_> {
    pub fn select_sql(&self, clause: &WhereClause) -> String {
        let n = clause.params().len();
        format!(
            "{}{} ORDER BY {} LIMIT ${} OFFSET ${}",
            self.select,
            clause.to_sql(),
            self.order_by,
            n + 1,
            n + 2
        )
    }

    pub fn count_sql(&self, clause: &WhereClause) -> String {
        format!("{}{}", self.count, clause.to_sql())
    }
}

/// Run the page query and the COUNT query over the same predicate
pub async fn fetch_page<T>(
    pool: &PgPool,
    query: PagedQuery<'_>,
    clause: &WhereClause,
    page: PageRequest,
) -> Result<Page<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let select_sql = query.select_sql(clause);
    let mut q = sqlx::query_as::<_, T>(&select_sql);
    for p in clause.params() {
        q = bind_param_query_as(q, p);
    }
    let items = q.bind(page.limit).bind(page.offset).fetch_all(pool).await?;

    let count_sql = query.count_sql(clause);
    let mut c = sqlx::query_as::<_, (i64,)>(&count_sql);
    for p in clause.params() {
        c = bind_param_query_as(c, p);
    }
    let (total,) = c.fetch_one(pool).await?;

    Ok(Page { items, total })
}

/// `%term%` for ILIKE with the LIKE metacharacters escaped
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::TextArray(a) => q.bind(a.clone()),
    }
}
