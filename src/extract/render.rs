use super::RateTable;
use std::fmt::Write;

/// Rows at positions 0..3 are summary/header rows and keep their order; the
/// chronological tail below them renders most-recent-first.
const HEADER_ROWS: usize = 3;

/// Render one category as a bordered HTML table under an `<h2>` heading.
///
/// The reversed tail is a presentation contract: the page lists months
/// oldest-first, the email shows the newest at the top.
pub fn render_fragment(table: &RateTable) -> String {
    let mut html = format!(
        "<h2>{}</h2>\n<table style='border: 3px solid black; border-collapse: collapse;'>\n",
        xml_charref_escape(&table.title)
    );

    for (_, row) in table.rows.iter().filter(|(pos, _)| *pos < HEADER_ROWS) {
        push_row(&mut html, row);
    }
    for (_, row) in table.rows.iter().rev().filter(|(pos, _)| *pos >= HEADER_ROWS) {
        push_row(&mut html, row);
    }

    html.push_str("</table>\n<br><br>");
    html
}

fn push_row(html: &mut String, row: &[Option<String>]) {
    // A null leading cell marks a spacer row; drop the whole row.
    if row.first().map_or(true, |cell| cell.is_none()) {
        return;
    }
    html.push_str("  <tr style='border: 1px solid black'>\n");
    for cell in row {
        let text = cell.as_deref().unwrap_or("").replace("nan", "");
        let _ = writeln!(
            html,
            "    <td style='border: 1px solid black'>{}</td>",
            xml_charref_escape(&text)
        );
    }
    html.push_str("  </tr>\n");
}

/// Replace every non-ASCII character with a decimal XML character reference,
/// keeping the fragment ASCII-safe for mail clients.
pub fn xml_charref_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let _ = write!(out, "&#{};", c as u32);
        }
    }
    out
}

// ----- Tests -----
#[cfg(test)]
mod tests {
    use super::*;

    fn rate_table(title: &str, rows: &[&[&str]]) -> RateTable {
        RateTable {
            title: title.to_string(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| {
                            if cell.is_empty() {
                                None
                            } else {
                                Some(cell.to_string())
                            }
                        })
                        .collect()
                })
                .enumerate()
                .collect(),
        }
    }

    fn rendered_first_cells(html: &str) -> Vec<String> {
        html.lines()
            .filter(|l| l.trim_start().starts_with("<td"))
            .map(|l| {
                let start = l.find('>').unwrap() + 1;
                let end = l.rfind("</td>").unwrap();
                l[start..end].to_string()
            })
            .collect()
    }

    #[test]
    fn header_rows_forward_then_tail_reversed() {
        let table = rate_table(
            "2025 Natural Gas",
            &[
                &["r0"],
                &["r1"],
                &["r2"],
                &["r3"],
                &["r4"],
                &["r5"],
                &["r6"],
            ],
        );
        let html = render_fragment(&table);
        assert_eq!(
            rendered_first_cells(&html),
            vec!["r0", "r1", "r2", "r6", "r5", "r4", "r3"]
        );
    }

    #[test]
    fn null_leading_cell_drops_the_row() {
        let table = rate_table(
            "2025 Natural Gas",
            &[&["r0"], &["", "orphan"], &["r2"], &["r3"], &["", "x"]],
        );
        let html = render_fragment(&table);
        assert_eq!(rendered_first_cells(&html), vec!["r0", "r2", "r3"]);
        assert!(!html.contains("orphan"));
    }

    #[test]
    fn literal_nan_is_stripped_from_cells() {
        let table = rate_table("2025 Natural Gas", &[&["February", "nan/GJ", "4.25"]]);
        let html = render_fragment(&table);
        assert!(!html.contains("nan"));
        assert!(html.contains(">/GJ<"));
    }

    #[test]
    fn non_ascii_becomes_character_references() {
        let table = rate_table("2025 Électricité", &[&["Février", "11.20 ¢/kWh"]]);
        let html = render_fragment(&table);
        assert!(html.contains("<h2>2025 &#201;lectricit&#233;</h2>"));
        assert!(html.contains("F&#233;vrier"));
        assert!(html.contains("&#162;/kWh"));
        assert!(html.is_ascii());
    }

    #[test]
    fn empty_rate_table_still_renders_heading_and_shell() {
        let table = rate_table("2025 Natural Gas", &[]);
        let html = render_fragment(&table);
        assert!(html.starts_with("<h2>2025 Natural Gas</h2>"));
        assert!(html.contains("<table"));
        assert!(html.contains("</table>"));
        assert!(!html.contains("<tr"));
    }

    #[test]
    fn escape_is_identity_on_ascii() {
        assert_eq!(xml_charref_escape("Rate per GJ: 4.25"), "Rate per GJ: 4.25");
    }
}
