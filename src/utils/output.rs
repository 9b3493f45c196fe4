use serde::Serialize;
use std::fmt::Display;

use crate::utils::errors::Result;

/// Output format configuration
#[derive(Clone, Debug)]
pub struct OutputFormat {
    pub raw: bool,
}

impl OutputFormat {
    pub fn new(raw: bool) -> Self {
        Self { raw }
    }

    /// Render a JSON-serializable value: compact when raw, indented otherwise
    pub fn render_json<T>(&self, value: &T) -> Result<String>
    where
        T: Serialize,
    {
        let rendered = if self.raw {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(rendered)
    }

    pub fn print_json<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        println!("{}", self.render_json(value)?);
        Ok(())
    }

    /// Print tabular data - either raw (tab-separated) or formatted (column-aligned)
    pub fn print_table<T>(&self, data: &[Vec<T>])
    where
        T: Display + AsRef<str>,
    {
        for line in self.render_table(data) {
            println!("{line}");
        }
    }

    /// Print key-value pairs
    pub fn print_key_value<K, V>(&self, pairs: &[(K, V)])
    where
        K: Display + AsRef<str>,
        V: Display + AsRef<str>,
    {
        let data: Vec<Vec<String>> = pairs
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect();

        self.print_table(&data);
    }

    pub fn render_table<T>(&self, data: &[Vec<T>]) -> Vec<String>
    where
        T: Display + AsRef<str>,
    {
        if data.is_empty() {
            return Vec::new();
        }

        if self.raw {
            // Raw output: tab-separated values
            return data
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.as_ref())
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect();
        }

        // Formatted output: column-aligned like `column -t`
        let num_cols = data.iter().map(Vec::len).max().unwrap_or(0);
        let mut col_widths = vec![0; num_cols];

        for row in data {
            for (i, cell) in row.iter().enumerate() {
                col_widths[i] = col_widths[i].max(cell.as_ref().chars().count());
            }
        }

        data.iter()
            .map(|row| {
                let formatted_cells: Vec<String> = row
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        if i == row.len() - 1 {
                            // Last column - no padding needed
                            cell.to_string()
                        } else {
                            format!("{:<width$}", cell.as_ref(), width = col_widths[i])
                        }
                    })
                    .collect();
                formatted_cells.join("  ")
            })
            .collect()
    }
}
