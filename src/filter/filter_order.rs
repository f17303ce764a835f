use std::cmp::Ordering;

use super::types::{QueryParams, Sort, SortDirection, SortField};
use crate::types::Character;

pub struct FilterOrder;

impl FilterOrder {
    /// Reads `sort_by` / `sort_order`, silently falling back to `name` / `asc`.
    pub fn resolve(params: &QueryParams) -> Sort {
        let field = params
            .get("sort_by")
            .and_then(|v| SortField::parse(v.trim()))
            .unwrap_or(SortField::Name);

        let direction = match params.get("sort_order") {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };

        Sort { field, direction }
    }

    /// In-memory comparator equivalent to `generate`.
    ///
    /// Text compares byte-wise (`COLLATE "C"`), missing values order like
    /// PostgreSQL NULLs (last ascending, first descending) and ties break on
    /// `id` ascending.
    pub fn compare(sort: &Sort, a: &Character, b: &Character) -> Ordering {
        let primary = match sort.field {
            SortField::Name => nullable(Some(a.name.as_str()), Some(b.name.as_str())),
            SortField::Age => nullable(a.age, b.age),
            SortField::House => nullable(
                a.house.as_ref().map(|h| h.name.as_str()),
                b.house.as_ref().map(|h| h.name.as_str()),
            ),
            SortField::Role => nullable(Some(a.role.as_str()), Some(b.role.as_str())),
            SortField::Nickname => nullable(a.nickname.as_deref(), b.nickname.as_deref()),
            SortField::Animal => nullable(a.animal.as_deref(), b.animal.as_deref()),
            SortField::Symbol => nullable(a.symbol.as_deref(), b.symbol.as_deref()),
            SortField::Death => nullable(a.death, b.death),
            SortField::Strength => nullable(
                a.strength.as_ref().map(|s| s.description.as_str()),
                b.strength.as_ref().map(|s| s.description.as_str()),
            ),
        };

        let primary = match sort.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then(a.id.cmp(&b.id))
    }

    pub fn generate(sort: &Sort) -> String {
        let collation = if sort.field.is_text() { " COLLATE \"C\"" } else { "" };
        format!(
            "ORDER BY {}{} {}, c.\"id\" ASC",
            sort.field.to_sql(),
            collation,
            sort.direction.to_sql()
        )
    }
}

fn nullable<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::House;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn character(id: i32, name: &str, age: Option<i32>, house: Option<&str>) -> Character {
        Character {
            id,
            name: name.to_string(),
            house: house.map(|h| House { id, name: h.to_string() }),
            animal: None,
            symbol: None,
            nickname: None,
            role: "Knight".to_string(),
            age,
            death: None,
            strength: None,
        }
    }

    fn sorted_ids(sort: Sort, mut characters: Vec<Character>) -> Vec<i32> {
        characters.sort_by(|a, b| FilterOrder::compare(&sort, a, b));
        characters.into_iter().map(|c| c.id).collect()
    }

    #[test]
    fn defaults_to_name_ascending() {
        assert_eq!(FilterOrder::resolve(&params(&[])), Sort::default());
    }

    #[test]
    fn unknown_field_and_direction_fall_back() {
        let sort = FilterOrder::resolve(&params(&[("sort_by", "password"), ("sort_order", "sideways")]));
        assert_eq!(sort, Sort::default());
    }

    #[test]
    fn direction_is_case_insensitive() {
        let sort = FilterOrder::resolve(&params(&[("sort_by", "age"), ("sort_order", "DESC")]));
        assert_eq!(sort, Sort { field: SortField::Age, direction: SortDirection::Desc });
    }

    #[test]
    fn missing_values_sort_last_ascending_first_descending() {
        let characters = vec![
            character(1, "a", None, None),
            character(2, "b", Some(40), None),
            character(3, "c", Some(20), None),
        ];
        let asc = Sort { field: SortField::Age, direction: SortDirection::Asc };
        let desc = Sort { field: SortField::Age, direction: SortDirection::Desc };

        assert_eq!(sorted_ids(asc, characters.clone()), vec![3, 2, 1]);
        assert_eq!(sorted_ids(desc, characters), vec![1, 2, 3]);
    }

    #[test]
    fn ties_break_on_id_in_both_directions() {
        let characters = vec![
            character(5, "x", Some(38), None),
            character(2, "y", Some(38), None),
        ];
        let desc = Sort { field: SortField::Age, direction: SortDirection::Desc };
        assert_eq!(sorted_ids(desc, characters), vec![2, 5]);
    }

    #[test]
    fn text_compares_bytewise() {
        let characters = vec![
            character(1, "bronn", None, None),
            character(2, "Tyrion", None, None),
            character(3, "Bronn", None, None),
        ];
        assert_eq!(sorted_ids(Sort::default(), characters), vec![3, 2, 1]);
    }

    #[test]
    fn generates_order_clause() {
        let sort = Sort { field: SortField::House, direction: SortDirection::Desc };
        assert_eq!(FilterOrder::generate(&sort), "ORDER BY h.\"name\" COLLATE \"C\" DESC, c.\"id\" ASC");

        let sort = Sort { field: SortField::Death, direction: SortDirection::Asc };
        assert_eq!(FilterOrder::generate(&sort), "ORDER BY c.\"death\" ASC, c.\"id\" ASC");
    }
}
