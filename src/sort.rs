use crate::editor::EditorRow;
use crate::roster::parse_class_number;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    ClassNumber,
    LastName,
    FirstName,
}

impl SortColumn {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "CN" => Some(Self::ClassNumber),
            "LastName" => Some(Self::LastName),
            "FirstName" => Some(Self::FirstName),
            _ => None,
        }
    }
}

fn text_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable ascending sort of the display order `current` by `column`.
pub fn sorted_order(rows: &[EditorRow], current: &[usize], column: SortColumn) -> Vec<usize> {
    let mut order = current.to_vec();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&rows[a], &rows[b]);
        match column {
            SortColumn::ClassNumber => {
                parse_class_number(&ra.class_number).cmp(&parse_class_number(&rb.class_number))
            }
            SortColumn::LastName => text_cmp(&ra.last_name, &rb.last_name),
            SortColumn::FirstName => text_cmp(&ra.first_name, &rb.first_name),
        }
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::RowStatus;

    fn row(id: &str, cn: &str, last: &str, first: &str) -> EditorRow {
        EditorRow {
            student_id: id.to_string(),
            class_number: cn.to_string(),
            last_name: last.to_string(),
            first_name: first.to_string(),
            status: RowStatus::Unset,
            conduct: Default::default(),
        }
    }

    #[test]
    fn class_number_sorts_numerically_with_junk_as_zero() {
        let rows = vec![
            row("a", "10", "", ""),
            row("b", "9", "", ""),
            row("c", "x", "", ""),
        ];
        assert_eq!(
            sorted_order(&rows, &[0, 1, 2], SortColumn::ClassNumber),
            vec![2, 1, 0]
        );
    }

    #[test]
    fn names_sort_case_insensitively_on_trimmed_text() {
        let rows = vec![
            row("a", "1", " santos", "Z"),
            row("b", "2", "Reyes ", "Y"),
            row("c", "3", "Santos", "X"),
        ];
        assert_eq!(
            sorted_order(&rows, &[0, 1, 2], SortColumn::LastName),
            vec![1, 2, 0]
        );
        assert_eq!(
            sorted_order(&rows, &[2, 1, 0], SortColumn::FirstName),
            vec![2, 1, 0]
        );
    }
}
