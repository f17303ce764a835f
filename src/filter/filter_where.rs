use super::error::FilterError;
use super::types::{QueryParams, SqlParam};
use crate::types::Character;

/// Longest accepted value for a text filter
pub const MAX_STRING_LENGTH: usize = 50;
/// Inclusive bounds for the age filters
pub const AGE_MIN: i32 = 0;
pub const AGE_MAX: i32 = 150;

/// Validated, typed filter set parsed from the query string.
///
/// Every predicate is evaluated the same way by both stores: `matches`
/// tests a record in memory, `FilterWhere` renders the same predicates as
/// SQL over `characters c` with optional `houses h` / `strengths s` joins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFilter {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub house: Option<String>,
    pub strength: Option<String>,
    pub role: Option<String>,
    pub animal: Option<String>,
    pub age: Option<i32>,
    pub age_more_than: Option<i32>,
    pub age_less_than: Option<i32>,
    pub house_id: Option<i32>,
    pub strength_id: Option<i32>,
}

impl CharacterFilter {
    /// Unknown keys are ignored; blank values are omitted.
    pub fn from_params(params: &QueryParams) -> Result<Self, FilterError> {
        Ok(Self {
            id: None,
            name: text_param(params, "name")?,
            house: text_param(params, "house")?,
            strength: text_param(params, "strength")?,
            role: text_param(params, "role")?,
            animal: text_param(params, "animal")?,
            age: int_param(params, "age", AGE_MIN, Some(AGE_MAX))?,
            age_more_than: int_param(params, "age_more_than", AGE_MIN, Some(AGE_MAX))?,
            age_less_than: int_param(params, "age_less_than", AGE_MIN, Some(AGE_MAX))?,
            house_id: int_param(params, "house_id", 1, None)?,
            strength_id: int_param(params, "strength_id", 1, None)?,
        })
    }

    pub fn by_id(id: i32) -> Self {
        Self { id: Some(id), ..Default::default() }
    }

    pub fn needs_house_join(&self) -> bool {
        self.house.is_some()
    }

    pub fn needs_strength_join(&self) -> bool {
        self.strength.is_some()
    }

    pub fn matches(&self, character: &Character) -> bool {
        let age = character.age;

        self.id.map_or(true, |id| character.id == id)
            && contains(Some(&character.name), &self.name)
            && contains(character.house.as_ref().map(|h| &h.name), &self.house)
            && contains(character.strength.as_ref().map(|s| &s.description), &self.strength)
            && contains(Some(&character.role), &self.role)
            && contains(character.animal.as_ref(), &self.animal)
            && self.age.map_or(true, |v| age == Some(v))
            && self.age_more_than.map_or(true, |v| age.is_some_and(|a| a >= v))
            && self.age_less_than.map_or(true, |v| age.is_some_and(|a| a <= v))
            && self.house_id.map_or(true, |v| character.house_id() == Some(v))
            && self.strength_id.map_or(true, |v| character.strength_id() == Some(v))
    }
}

fn contains(haystack: Option<&String>, needle: &Option<String>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase())),
    }
}

fn text_param(params: &QueryParams, key: &str) -> Result<Option<String>, FilterError> {
    let Some(value) = params.get(key).map(|v| v.trim()) else { return Ok(None) };
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > MAX_STRING_LENGTH {
        return Err(FilterError::TooLong { key: key.to_string(), max: MAX_STRING_LENGTH });
    }
    Ok(Some(value.to_string()))
}

fn int_param(params: &QueryParams, key: &str, min: i32, max: Option<i32>) -> Result<Option<i32>, FilterError> {
    let Some(value) = params.get(key).map(|v| v.trim()) else { return Ok(None) };
    if value.is_empty() {
        return Ok(None);
    }
    // Digits only: rejects signs, decimals and whitespace inside the literal
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FilterError::InvalidInteger { key: key.to_string() });
    }

    let upper = max.unwrap_or(i32::MAX);
    let out_of_range = || FilterError::OutOfRange { key: key.to_string(), min: min as i64, max: upper as i64 };
    let number: i32 = value.parse().map_err(|_| out_of_range())?;
    if number < min || number > upper {
        return Err(out_of_range());
    }
    Ok(Some(number))
}

/// Renders a `CharacterFilter` as a parameterized WHERE clause
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    conditions: Vec<String>,
}

impl FilterWhere {
    fn new() -> Self {
        Self { param_values: vec![], conditions: vec![] }
    }

    pub fn generate(filter: &CharacterFilter) -> (String, Vec<SqlParam>) {
        let mut filter_where = Self::new();
        filter_where.build(filter);

        let where_clause = if filter_where.conditions.is_empty() {
            "1=1".to_string()
        } else {
            filter_where.conditions.join(" AND ")
        };
        (where_clause, filter_where.param_values)
    }

    fn build(&mut self, filter: &CharacterFilter) {
        if let Some(id) = filter.id {
            self.compare("c.\"id\"", "=", id);
        }
        if let Some(name) = &filter.name {
            self.ilike("c.\"name\"", name);
        }
        if let Some(house) = &filter.house {
            self.ilike("h.\"name\"", house);
        }
        if let Some(strength) = &filter.strength {
            self.ilike("s.\"description\"", strength);
        }
        if let Some(role) = &filter.role {
            self.ilike("c.\"role\"", role);
        }
        if let Some(animal) = &filter.animal {
            self.ilike("c.\"animal\"", animal);
        }
        if let Some(age) = filter.age {
            self.compare("c.\"age\"", "=", age);
        }
        if let Some(age) = filter.age_more_than {
            self.compare("c.\"age\"", ">=", age);
        }
        if let Some(age) = filter.age_less_than {
            self.compare("c.\"age\"", "<=", age);
        }
        if let Some(house_id) = filter.house_id {
            self.compare("c.\"house_id\"", "=", house_id);
        }
        if let Some(strength_id) = filter.strength_id {
            self.compare("c.\"strength_id\"", "=", strength_id);
        }
    }

    fn ilike(&mut self, column: &str, needle: &str) {
        let pattern = format!("%{}%", escape_like(needle));
        let placeholder = self.param(SqlParam::Text(Some(pattern)));
        self.conditions.push(format!("{} ILIKE {}", column, placeholder));
    }

    fn compare(&mut self, column: &str, operator: &str, value: i32) {
        let placeholder = self.param(SqlParam::Int(Some(value)));
        self.conditions.push(format!("{} {} {}", column, operator, placeholder));
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

/// Escapes LIKE metacharacters so user input matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
