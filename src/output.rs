use crate::model::{Component, TextExpanderConfig};

const HEADERS: [&str; 4] = ["NAME", "TYPE", "STATUS", "DESCRIPTION"];

pub fn format_component_table(components: &[Component]) -> String {
    if components.is_empty() {
        return String::new();
    }

    let rows: Vec<[&str; 4]> = components
        .iter()
        .map(|c| {
            [
                c.name.as_str(),
                c.kind.as_str(),
                c.status.as_str(),
                c.description.as_str(),
            ]
        })
        .collect();

    // The last column is never padded.
    let mut widths = [0usize; 3];
    for row in std::iter::once(&HEADERS).chain(rows.iter()) {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&HEADERS).chain(rows.iter()) {
        let line = format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn format_mappings(config: &TextExpanderConfig) -> String {
    let width = config
        .mappings
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (marker, replacement) in &config.mappings {
        out.push_str(&format!("{marker:<width$}  => {replacement}\n"));
    }
    out
}
