use crate::headers::HeaderIndex;
use crate::mapping::Selection;

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Header name for a column, falling back to `#N`.
pub fn column_label(headers: &HeaderIndex, column: i64) -> String {
    if column < 0 {
        return "(unset)".to_string();
    }
    headers
        .headers()
        .get(column as usize)
        .filter(|h| !h.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| format!("#{column}"))
}

/// Render a column selection for display.
pub fn column_selection(headers: &HeaderIndex, selection: Option<&Selection>) -> String {
    match selection {
        Some(Selection::One(i)) => column_label(headers, *i),
        Some(Selection::Pair(income, spend)) => format!(
            "income: {} / spend: {}",
            column_label(headers, *income),
            column_label(headers, *spend)
        ),
        Some(Selection::Unset) | None => "(none)".to_string(),
    }
}
