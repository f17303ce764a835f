use std::collections::HashMap;

/// Raw query-string parameters as received by the list endpoint
pub type QueryParams = HashMap<String, String>;

/// Presence state of a single query parameter.
///
/// `Empty` is a key sent without a value (`?limit=`), which resolves to the
/// default; `Absent` is a key that was never sent at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param<T> {
    Absent,
    Empty,
    Value(T),
}

impl<T> Param<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Param::Absent)
    }

    pub fn value_or(self, default: T) -> T {
        match self {
            Param::Value(v) => v,
            Param::Absent | Param::Empty => default,
        }
    }

    /// Falls back to `other` only when this parameter was never sent
    pub fn or_if_absent(self, other: Param<T>) -> Param<T> {
        match self {
            Param::Absent => other,
            present => present,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Age,
    House,
    Role,
    Nickname,
    Animal,
    Symbol,
    Death,
    Strength,
}

impl SortField {
    pub const ALLOWED: [SortField; 9] = [
        SortField::Name,
        SortField::Age,
        SortField::House,
        SortField::Role,
        SortField::Nickname,
        SortField::Animal,
        SortField::Symbol,
        SortField::Death,
        SortField::Strength,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALLOWED.into_iter().find(|f| f.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Age => "age",
            SortField::House => "house",
            SortField::Role => "role",
            SortField::Nickname => "nickname",
            SortField::Animal => "animal",
            SortField::Symbol => "symbol",
            SortField::Death => "death",
            SortField::Strength => "strength",
        }
    }

    /// Qualified SQL column the field orders by
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortField::Name => "c.\"name\"",
            SortField::Age => "c.\"age\"",
            SortField::House => "h.\"name\"",
            SortField::Role => "c.\"role\"",
            SortField::Nickname => "c.\"nickname\"",
            SortField::Animal => "c.\"animal\"",
            SortField::Symbol => "c.\"symbol\"",
            SortField::Death => "c.\"death\"",
            SortField::Strength => "s.\"description\"",
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, SortField::Age | SortField::Death)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self { field: SortField::Name, direction: SortDirection::Asc }
    }
}

/// How a list request is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Deterministic `OFFSET skip LIMIT limit` over the sorted result
    Page { limit: i64, skip: i64 },
    /// Up to `size` records of the filtered set, in no particular order
    Sample { size: i64 },
}

/// Positional parameter for a generated SQL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(Option<String>),
    Int(Option<i32>),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
