//! Sort criteria and the default cell comparator.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use lxg_types::{Row, Value};

/// A three-way comparison over two (possibly missing) cells.
pub type Comparator = Rc<dyn Fn(Option<&Value>, Option<&Value>) -> Ordering>;

/// Which column to sort by and how.
///
/// `reversed` is applied as a final pass over the sorted rows rather than
/// by negating the comparator, so a custom comparator and `reversed`
/// compose predictably.
#[derive(Clone)]
pub struct SortSpec {
    pub by: String,
    pub reversed: bool,
    pub comparator: Option<Comparator>,
}

impl SortSpec {
    /// Ascending sort on `column` with the default comparator.
    pub fn by(column: impl Into<String>) -> Self {
        Self {
            by: column.into(),
            reversed: false,
            comparator: None,
        }
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn with_comparator(
        mut self,
        comparator: impl Fn(Option<&Value>, Option<&Value>) -> Ordering + 'static,
    ) -> Self {
        self.comparator = Some(Rc::new(comparator));
        self
    }
}

impl fmt::Debug for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortSpec")
            .field("by", &self.by)
            .field("reversed", &self.reversed)
            .field("custom_comparator", &self.comparator.is_some())
            .finish()
    }
}

/// The default comparator.
///
/// Numbers compare numerically, text lexicographically, booleans
/// `false < true`. Missing cells, nulls, branches and mismatched kinds are
/// neither less nor greater and compare equal, which keeps them in place
/// under a stable sort.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        }
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Stable sort of `rows` in place.
pub(crate) fn sort_rows(rows: &mut [Rc<Row>], spec: &SortSpec) {
    let column = spec.by.as_str();
    match &spec.comparator {
        Some(cmp) => rows.sort_by(|a, b| cmp(a.get(column), b.get(column))),
        None => rows.sort_by(|a, b| compare_values(a.get(column), b.get(column))),
    }
    if spec.reversed {
        rows.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lxg_types::{Branch, RowKey};

    fn rows(amounts: &[i64]) -> Vec<Rc<Row>> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                let mut cells = Branch::new();
                cells.insert("amount".into(), Value::from(*amount));
                Rc::new(Row::new(i as u64, cells))
            })
            .collect()
    }

    fn keys(rows: &[Rc<Row>]) -> Vec<RowKey> {
        rows.iter().map(|r| r.key.clone()).collect()
    }

    #[test]
    fn ascending_numeric_sort() {
        let mut data = rows(&[30, 20, 10]);
        sort_rows(&mut data, &SortSpec::by("amount"));
        assert_eq!(keys(&data), [2u64, 1, 0].map(RowKey::Index));
    }

    #[test]
    fn reversal_is_a_final_pass() {
        let mut data = rows(&[10, 10, 20]);
        sort_rows(&mut data, &SortSpec::by("amount").reversed(true));
        // Ties keep input order during the sort, then the whole run flips.
        assert_eq!(keys(&data), [2u64, 1, 0].map(RowKey::Index));
    }

    #[test]
    fn custom_comparator_composes_with_reversal() {
        let mut data = rows(&[1, 3, 2]);
        let spec = SortSpec::by("amount")
            .with_comparator(|a, b| compare_values(b, a))
            .reversed(true);
        sort_rows(&mut data, &spec);
        assert_eq!(keys(&data), [0u64, 2, 1].map(RowKey::Index));
    }

    #[test]
    fn mismatched_kinds_compare_equal() {
        assert_eq!(
            compare_values(Some(&Value::from("a")), Some(&Value::from(1))),
            Ordering::Equal
        );
        assert_eq!(compare_values(None, Some(&Value::from(1))), Ordering::Equal);
        assert_eq!(
            compare_values(Some(&Value::from("a")), Some(&Value::from("b"))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&Value::from(true)), Some(&Value::from(false))),
            Ordering::Greater
        );
    }
}
