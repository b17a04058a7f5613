//! In-memory results table flushed to CSV.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::{BenchError, BenchResult};
use crate::metrics::{MetricReport, MetricValue};

/// Accumulates identified metric rows.
///
/// Columns are laid out as: id columns, then the explicit order list, then
/// every other key in first-seen order across records.
#[derive(Debug, Clone, Default)]
pub struct ResultsSink {
    id_columns: Vec<String>,
    column_order: Vec<String>,
    records: Vec<MetricReport>,
}

impl ResultsSink {
    pub fn new<S: Into<String>>(id_columns: impl IntoIterator<Item = S>, column_order: impl IntoIterator<Item = S>) -> Self {
        Self {
            id_columns: id_columns.into_iter().map(Into::into).collect(),
            column_order: column_order.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Append one row. Id values override report keys of the same name.
    pub fn add(&mut self, ids: Vec<MetricValue>, report: &MetricReport) -> BenchResult<()> {
        if ids.len() != self.id_columns.len() {
            return Err(BenchError::IdArity { expected: self.id_columns.len(), got: ids.len() });
        }
        let mut record = report.clone();
        for (column, value) in self.id_columns.iter().zip(ids) {
            record.insert(column.clone(), value);
        }
        self.records.push(record);
        Ok(())
    }

    /// Final column order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let fixed = self.id_columns.iter().chain(&self.column_order).map(String::as_str);
        let dynamic = self.records.iter().flat_map(MetricReport::keys);
        for key in fixed.chain(dynamic) {
            if seen.insert(key) {
                columns.push(key.to_string());
            }
        }
        columns
    }

    /// Write the header and one line per record. Missing values are empty cells.
    pub fn write_csv<W: Write>(&self, mut out: W) -> BenchResult<()> {
        let columns = self.columns();
        write_row(&mut out, columns.iter().map(String::as_str))?;
        for record in &self.records {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| record.get(c).map(ToString::to_string).unwrap_or_default())
                .collect();
            write_row(&mut out, cells.iter().map(String::as_str))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the table to `path`, replacing any existing file.
    pub fn flush(&self, path: impl AsRef<Path>) -> BenchResult<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))?;
        info!(rows = self.records.len(), path = %path.display(), "results written");
        Ok(())
    }

    pub fn records(&self) -> &[MetricReport] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn write_row<'a, W: Write>(out: &mut W, cells: impl Iterator<Item = &'a str>) -> BenchResult<()> {
    let line: Vec<String> = cells.map(escape).collect();
    writeln!(out, "{}", line.join(","))?;
    Ok(())
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(pairs: &[(&str, i64)]) -> MetricReport {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_id_arity() {
        let mut sink = ResultsSink::new(["A", "B"], []);
        let err = sink.add(vec![1i64.into()], &MetricReport::new()).unwrap_err();
        assert!(matches!(err, BenchError::IdArity { expected: 2, got: 1 }));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_column_order() {
        let mut sink = ResultsSink::new(["A", "B"], ["C"]);
        sink.add(vec![1i64.into(), 2i64.into()], &report(&[("C", 3), ("D", 4)])).unwrap();
        sink.add(vec![1i64.into(), 2i64.into()], &report(&[("E", 5)])).unwrap();
        assert_eq!(sink.columns(), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_explicit_column_without_values() {
        let mut sink = ResultsSink::new(["Run ID"], ["Depth"]);
        sink.add(vec!["r".into()], &report(&[("Cost", 1)])).unwrap();
        let mut buf = Vec::new();
        sink.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Run ID,Depth,Cost\nr,,1\n");
    }

    #[test]
    fn test_ids_override_report() {
        let mut sink = ResultsSink::new(["Stage ID"], []);
        sink.add(vec!["route".into()], &report(&[("Stage ID", 9), ("Depth", 2)])).unwrap();
        assert_eq!(sink.records()[0].get("Stage ID"), Some(&MetricValue::from("route")));
    }

    #[test]
    fn test_escaping() {
        let mut sink = ResultsSink::new(["Gate Set"], []);
        sink.add(vec!["U3, Cnot".into()], &MetricReport::new()).unwrap();
        sink.add(vec!["say \"hi\"".into()], &MetricReport::new()).unwrap();
        let mut buf = Vec::new();
        sink.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Gate Set\n\"U3, Cnot\"\n\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_flush_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut sink = ResultsSink::new(["A"], []);
        sink.add(vec![true.into()], &report(&[("B", 1)])).unwrap();
        sink.flush(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A,B\nTrue,1\n");
    }
}
