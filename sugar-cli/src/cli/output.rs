//! Rendering command results as tables, JSON or CSV

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::{ModuleField, SugarEntry};

/// Widest a table cell may get before it is cut
const MAX_CELL_WIDTH: usize = 48;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// What a command produced
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Records, optionally labelled with their module
    Records {
        entries: Vec<SugarEntry>,
        show_module: bool,
    },
    /// A single column of values
    Values {
        header: &'static str,
        values: Vec<String>,
    },
    Fields(Vec<ModuleField>),
    /// Named scalar results in display order
    Properties(Vec<(&'static str, String)>),
    Message(String),
}

/// Key of the module tag on search hits, kept apart from any `module` field
const MODULE_TAG: &str = "_module";

#[derive(Serialize)]
struct Tagged<'a> {
    #[serde(rename = "_module")]
    module: &'a str,
    #[serde(flatten)]
    entry: &'a SugarEntry,
}

pub fn render(output: &Output, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(output),
        OutputFormat::Csv => {
            if let Output::Message(message) = output {
                return Ok(message.clone());
            }
            let (headers, rows) = tabulate(output);
            to_csv(&headers, &rows)
        }
        OutputFormat::Table => {
            if let Output::Message(message) = output {
                return Ok(message.clone());
            }
            let (headers, rows) = tabulate(output);
            if rows.is_empty() {
                return Ok("No results".dimmed().to_string());
            }
            Ok(to_table(&headers, &rows))
        }
    }
}

fn to_json(output: &Output) -> Result<String> {
    let json = match output {
        Output::Records {
            entries,
            show_module: true,
        } => {
            let tagged: Vec<Tagged<'_>> = entries
                .iter()
                .map(|entry| Tagged {
                    module: entry.module(),
                    entry,
                })
                .collect();
            serde_json::to_string_pretty(&tagged)
        }
        Output::Records { entries, .. } => serde_json::to_string_pretty(entries),
        Output::Values { values, .. } => serde_json::to_string_pretty(values),
        Output::Fields(fields) => serde_json::to_string_pretty(fields),
        Output::Properties(properties) => {
            let map: IndexMap<&str, &str> = properties
                .iter()
                .map(|(name, value)| (*name, value.as_str()))
                .collect();
            serde_json::to_string_pretty(&map)
        }
        Output::Message(message) => serde_json::to_string_pretty(message),
    };
    json.context("Failed to format JSON output")
}

/// Flatten an output into a header row and data rows
fn tabulate(output: &Output) -> (Vec<String>, Vec<Vec<String>>) {
    match output {
        Output::Records {
            entries,
            show_module,
        } => {
            let columns: IndexSet<&str> = entries.iter().flat_map(|e| e.field_names()).collect();

            let mut headers: Vec<String> = Vec::with_capacity(columns.len() + 1);
            if *show_module {
                headers.push(MODULE_TAG.to_string());
            }
            headers.extend(columns.iter().map(|c| c.to_string()));

            let rows = entries
                .iter()
                .map(|entry| {
                    let mut row = Vec::with_capacity(headers.len());
                    if *show_module {
                        row.push(entry.module().to_string());
                    }
                    row.extend(
                        columns
                            .iter()
                            .map(|column| entry.get(column).unwrap_or_default().to_string()),
                    );
                    row
                })
                .collect();
            (headers, rows)
        }
        Output::Values { header, values } => (
            vec![header.to_string()],
            values.iter().map(|v| vec![v.clone()]).collect(),
        ),
        Output::Fields(fields) => (
            ["name", "type", "label", "required", "options"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            fields
                .iter()
                .map(|field| {
                    vec![
                        field.name.clone(),
                        field.field_type.clone(),
                        field.label.clone(),
                        if field.required { "yes" } else { "" }.to_string(),
                        field
                            .options
                            .iter()
                            .map(|o| o.name.as_str())
                            .collect::<Vec<_>>()
                            .join(","),
                    ]
                })
                .collect(),
        ),
        Output::Properties(properties) => (
            vec!["property".to_string(), "value".to_string()],
            properties
                .iter()
                .map(|(name, value)| vec![name.to_string(), value.clone()])
                .collect(),
        ),
        Output::Message(message) => (vec!["message".to_string()], vec![vec![message.clone()]]),
    }
}

fn to_csv(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(headers)
        .context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(row).context("Failed to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {e}"))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

fn to_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| fit(cell, MAX_CELL_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(header, *width).bold().to_string())
        .collect();
    out.push_str(header_line.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  ").dimmed().to_string());

    for row in &cells {
        out.push('\n');
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect();
        out.push_str(line.join("  ").trim_end());
    }
    out
}

/// Pad to `width` display columns
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

/// Cut to at most `max` display columns, marking the cut with an ellipsis.
/// Newlines are flattened so each record stays on one line.
fn fit(text: &str, max: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.width() <= max {
        return flat;
    }

    let mut out = String::new();
    let mut used = 0;
    for c in flat.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NameValue;

    fn plain() {
        colored::control::set_override(false);
    }

    fn accounts() -> Vec<SugarEntry> {
        vec![
            SugarEntry::new("Accounts").with("id", "1").with("name", "Acme"),
            SugarEntry::new("Accounts")
                .with("id", "2")
                .with("name", "Globex, Inc.")
                .with("industry", "Energy"),
        ]
    }

    #[test]
    fn test_table_aligns_columns() {
        plain();
        let output = Output::Records {
            entries: accounts(),
            show_module: false,
        };
        let table = render(&output, OutputFormat::Table).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "id  name          industry");
        assert_eq!(lines[1], "--  ------------  --------");
        assert_eq!(lines[2], "1   Acme");
        assert_eq!(lines[3], "2   Globex, Inc.  Energy");
    }

    #[test]
    fn test_empty_table() {
        plain();
        let output = Output::Values {
            header: "module",
            values: vec![],
        };
        assert_eq!(render(&output, OutputFormat::Table).unwrap(), "No results");
    }

    #[test]
    fn test_csv_quotes_commas() {
        let output = Output::Records {
            entries: accounts(),
            show_module: true,
        };
        let csv = render(&output, OutputFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "_module,id,name,industry\n\
             Accounts,1,Acme,\n\
             Accounts,2,\"Globex, Inc.\",Energy\n"
        );
    }

    #[test]
    fn test_json_keeps_field_order_and_tags_module() {
        let output = Output::Records {
            entries: vec![SugarEntry::new("Contacts").with("last_name", "Hopper").with("id", "7")],
            show_module: true,
        };
        let json = render(&output, OutputFormat::Json).unwrap();
        let compact: String = json.split_whitespace().collect();
        assert_eq!(compact, r#"[{"_module":"Contacts","last_name":"Hopper","id":"7"}]"#);
    }

    #[test]
    fn test_module_tag_does_not_collide_with_module_field() {
        let output = Output::Records {
            entries: vec![SugarEntry::new("Bugs").with("id", "b1").with("module", "Billing")],
            show_module: true,
        };

        let json = render(&output, OutputFormat::Json).unwrap();
        let parsed: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["_module"], "Bugs");
        assert_eq!(parsed[0]["module"], "Billing");
        let compact: String = json.split_whitespace().collect();
        assert_eq!(compact.matches("\"module\"").count(), 1);

        let csv = render(&output, OutputFormat::Csv).unwrap();
        assert_eq!(csv, "_module,id,module\nBugs,b1,Billing\n");
    }

    #[test]
    fn test_properties_json_in_order() {
        let output = Output::Properties(vec![
            ("version", "6.5.26".to_string()),
            ("flavor", "CE".to_string()),
        ]);
        let json = render(&output, OutputFormat::Json).unwrap();
        let compact: String = json.split_whitespace().collect();
        assert_eq!(compact, r#"{"version":"6.5.26","flavor":"CE"}"#);
    }

    #[test]
    fn test_fields_table() {
        plain();
        let output = Output::Fields(vec![ModuleField {
            name: "industry".to_string(),
            field_type: "enum".to_string(),
            label: "Industry:".to_string(),
            required: true,
            options: vec![NameValue::new("Energy", "Energy"), NameValue::new("Retail", "Retail")],
        }]);
        let table = render(&output, OutputFormat::Table).unwrap();
        assert_eq!(
            table.lines().nth(2).unwrap(),
            "industry  enum  Industry:  yes       Energy,Retail"
        );
    }

    #[test]
    fn test_message_passthrough() {
        let output = Output::Message("abc-123".to_string());
        assert_eq!(render(&output, OutputFormat::Table).unwrap(), "abc-123");
        assert_eq!(render(&output, OutputFormat::Json).unwrap(), "\"abc-123\"");
    }

    #[test]
    fn test_fit_and_pad_use_display_width() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("abcdefghij", 5), "abcd…");
        assert_eq!(fit("日本語テキスト", 7), "日本語…");
        assert_eq!(fit("line\nbreak", 20), "line break");
        assert_eq!(pad("日本", 6), "日本  ");
    }
}
