//! Plain-text numeric tables.
//!
//! Reading follows `loadtxt` conventions (whitespace delimited, `#` comments,
//! blank lines skipped) and writing follows `savetxt` (`%.18e`, `# ` header).

use std::fs;
use std::path::Path;

use ndarray::{Array2, ArrayView1};

use crate::error::{PostError, PostResult};

/// This function reads a whitespace-delimited numeric table into a 2D array of shape (rows, cols).
/// Every data row must have the same number of columns.
pub fn read_table(path: &Path) -> PostResult<Array2<f64>> {
    let contents = fs::read_to_string(path).map_err(|e| PostError::io(path, e))?;
    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> PostResult<Array2<f64>> {
    let mut values: Vec<f64> = Vec::new();
    let mut n_cols: Option<usize> = None;
    let mut n_rows = 0;

    for (idx, raw) in contents.lines().enumerate() {
        let line = idx + 1;

        // Drop anything after a comment marker
        let data = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };

        let row = data
            .split_whitespace()
            .map(|token| parse_value(token, path, line))
            .collect::<PostResult<Vec<f64>>>()?;

        if row.is_empty() {
            continue;
        }

        match n_cols {
            None => n_cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(PostError::ColumnCount {
                    path: path.display().to_string(),
                    line,
                    expected,
                    found: row.len(),
                });
            }
            Some(_) => {}
        }

        values.extend(row);
        n_rows += 1;
    }

    let n_cols = n_cols.ok_or_else(|| PostError::EmptyTable {
        path: path.display().to_string(),
    })?;

    Array2::from_shape_vec((n_rows, n_cols), values).map_err(|e| PostError::Parse {
        path: path.display().to_string(),
        line: 0,
        message: e.to_string(),
    })
}

fn parse_value(token: &str, path: &Path, line: usize) -> PostResult<f64> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(PostError::Parse {
            path: path.display().to_string(),
            line,
            message: format!("non-finite value '{token}'"),
        }),
        Err(e) => Err(PostError::Parse {
            path: path.display().to_string(),
            line,
            message: format!("'{token}': {e}"),
        }),
    }
}

/// Reads a table and checks it has at least `required` columns.
pub fn read_columns(path: &Path, required: usize) -> PostResult<Array2<f64>> {
    let table = read_table(path)?;
    if table.ncols() < required {
        return Err(PostError::TooFewColumns {
            path: path.display().to_string(),
            required,
            found: table.ncols(),
        });
    }
    Ok(table)
}

/// A function which writes equal-length columns side by side, preceded by a `# ` header line.
pub fn write_columns(path: &Path, header: &str, columns: &[ArrayView1<f64>]) -> PostResult<()> {
    let n_rows = columns.first().map_or(0, |c| c.len());

    let mut out = String::new();
    out.push_str("# ");
    out.push_str(header);
    out.push('\n');

    for i in 0..n_rows {
        let row = columns
            .iter()
            .map(|c| format_sci(c[i]))
            .collect::<Vec<String>>()
            .join(" ");
        out.push_str(&row);
        out.push('\n');
    }

    fs::write(path, out).map_err(|e| PostError::io(path, e))
}

/// Formats like C's `%.18e`: mantissa with 18 decimals and an exponent of at least two digits.
pub fn format_sci(value: f64) -> String {
    let formatted = format!("{:.18e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn parse(contents: &str) -> PostResult<Array2<f64>> {
        parse_table(contents, Path::new("test.txt"))
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let table = parse("# x y z\n0.0 0.0 0.0\n\n1.0  0.5\t0.0  # trailing\n").unwrap();
        assert_eq!(table, array![[0.0, 0.0, 0.0], [1.0, 0.5, 0.0]]);
    }

    #[test]
    fn test_parse_accepts_scientific_notation() {
        let table = parse("5.000000000000000000e-01 -2.5E+00\n").unwrap();
        assert_eq!(table, array![[0.5, -2.5]]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = parse("1 2\n3 4\n5\n").unwrap_err();
        match err {
            PostError::ColumnCount { line, expected, found, .. } => {
                assert_eq!((line, expected, found), (3, 2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_token_reports_its_line() {
        let err = parse("1 2\n3 abc\n").unwrap_err();
        assert!(matches!(err, PostError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        assert!(matches!(parse("1 nan\n"), Err(PostError::Parse { line: 1, .. })));
        assert!(matches!(parse("inf 1\n"), Err(PostError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_empty_table_is_an_error() {
        assert!(matches!(parse("# header only\n\n"), Err(PostError::EmptyTable { .. })));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, PostError::Io { .. }));
    }

    #[test]
    fn test_read_columns_checks_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one_col.txt");
        fs::write(&path, "1\n2\n").unwrap();
        let err = read_columns(&path, 2).unwrap_err();
        assert!(matches!(err, PostError::TooFewColumns { required: 2, found: 1, .. }));
    }

    #[test]
    fn test_format_sci_matches_c_style() {
        assert_eq!(format_sci(0.5), "5.000000000000000000e-01");
        assert_eq!(format_sci(2.0), "2.000000000000000000e+00");
        assert_eq!(format_sci(-1234.5), "-1.234500000000000000e+03");
        assert_eq!(format_sci(0.0), "0.000000000000000000e+00");
        assert_eq!(format_sci(1e-5), "1.000000000000000082e-05");
    }

    #[test]
    fn test_written_columns_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cols.txt");
        let x = array![0.5, 1.5];
        let y = array![2.0, -3.25];
        write_columns(&path, "x  du/dy_at_top_wall", &[x.view(), y.view()]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# x  du/dy_at_top_wall\n"));
        assert_eq!(read_table(&path).unwrap(), array![[0.5, 2.0], [1.5, -3.25]]);
    }
}
