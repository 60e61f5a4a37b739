//! Comparison table over a finished run.
//!
//! A [`BenchmarkReport`] is assembled once from the runner's results and is
//! read-only afterwards; sorting and rendering only produce new views.

use crate::config::{RunConfig, SortKey};
use crate::corpus::Corpus;
use crate::runner::{Measurement, Outcome, RunResults};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Write as _;
use sysinfo::System;

/// Host the run executed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    /// CPU brand string
    pub cpu_brand: String,
    /// Logical cores
    pub cpu_cores: usize,
    /// Installed memory in MiB
    pub total_memory_mb: u64,
    /// OS name and version
    pub os: String,
}

impl HardwareInfo {
    /// Probes the current host.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let cpu_brand = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_else(|| "Unknown CPU".to_string());

        Self {
            cpu_brand,
            cpu_cores: sys.cpus().len(),
            total_memory_mb: sys.total_memory() / 1024 / 1024,
            os: format!(
                "{} {}",
                System::name().unwrap_or_else(|| "Unknown".to_string()),
                System::os_version().unwrap_or_else(|| "Unknown".to_string())
            ),
        }
    }
}

/// Corpus identity recorded in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusInfo {
    /// Corpus name
    pub name: String,
    /// Corpus length in bytes
    pub size: usize,
}

/// All measurements of one run plus the context needed to read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// UTC timestamp, RFC 3339
    pub generated_at: String,
    /// Corpus the run measured
    pub corpus: CorpusInfo,
    /// Options the run used
    pub config: RunConfig,
    /// Host description
    pub hardware: HardwareInfo,
    /// Set if the run stopped before every variant started
    pub interrupted: bool,
    /// One entry per variant, in registration order
    pub measurements: Vec<Measurement>,
}

impl BenchmarkReport {
    /// Assembles a report from a finished run.
    pub fn new(corpus: &Corpus, config: &RunConfig, results: RunResults, hardware: HardwareInfo) -> Self {
        let mut measurements = results.measurements;
        measurements.sort_by_key(|m| m.order);

        Self {
            generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            corpus: CorpusInfo {
                name: corpus.name().to_string(),
                size: corpus.len(),
            },
            config: config.clone(),
            hardware,
            interrupted: results.interrupted,
            measurements,
        }
    }

    /// Looks up a measurement by variant name.
    pub fn get(&self, name: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.name == name)
    }

    /// Number of completed variants.
    pub fn completed(&self) -> usize {
        self.measurements.iter().filter(|m| m.is_completed()).count()
    }

    /// Number of failed variants.
    pub fn failed(&self) -> usize {
        self.measurements.iter().filter(|m| m.is_failed()).count()
    }

    /// Number of variants that never started.
    pub fn skipped(&self) -> usize {
        self.measurements
            .iter()
            .filter(|m| m.outcome == Outcome::Skipped)
            .count()
    }

    /// Measurements ordered by `key`.
    ///
    /// Ties keep registration order and rows without the sort value
    /// (failed or skipped) come last.
    pub fn sorted(&self, key: SortKey) -> Vec<&Measurement> {
        let mut rows: Vec<&Measurement> = self.measurements.iter().collect();
        rows.sort_by(|a, b| compare(a, b, key).then(a.order.cmp(&b.order)));
        rows
    }

    /// Aligned plain-text table.
    pub fn render_table(&self, key: SortKey) -> String {
        let header = [
            "variant", "status", "mean", "median", "p90", "min", "max", "stddev", "MiB/s", "size",
            "ratio",
        ];
        let rows: Vec<[String; 11]> = self.sorted(key).into_iter().map(row_cells).collect();

        let mut widths = header.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        let mut push_line = |cells: &[&str]| {
            let line: Vec<String> = cells
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (cell, width))| {
                    if i == 0 {
                        format!("{:<width$}", cell, width = width)
                    } else {
                        format!("{:>width$}", cell, width = width)
                    }
                })
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        };

        push_line(&header);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&rule.iter().map(String::as_str).collect::<Vec<_>>());
        for row in &rows {
            push_line(&row.iter().map(String::as_str).collect::<Vec<_>>());
        }
        out
    }

    /// Markdown document with host, corpus, results and failures.
    pub fn render_markdown(&self, key: SortKey) -> String {
        let mut report = String::new();

        report.push_str("# Codec Benchmark Report\n\n");
        if self.interrupted {
            report.push_str("**PARTIAL RESULTS - the run was interrupted**\n\n");
        }
        let _ = writeln!(report, "**generated:** {}\n", self.generated_at);

        report.push_str("## Hardware\n\n");
        report.push_str("```\n");
        let _ = writeln!(report, "CPU:    {}", self.hardware.cpu_brand);
        let _ = writeln!(report, "Cores:  {}", self.hardware.cpu_cores);
        let _ = writeln!(report, "RAM:    {} MB", self.hardware.total_memory_mb);
        let _ = writeln!(report, "OS:     {}", self.hardware.os);
        report.push_str("```\n\n");

        report.push_str("## Run\n\n");
        let _ = writeln!(
            report,
            "- **Corpus:** {} ({} bytes)",
            self.corpus.name, self.corpus.size
        );
        let _ = writeln!(
            report,
            "- **Trials:** {} warm-up, {} measured, verification {}",
            self.config.warmup_iterations,
            self.config.measured_iterations,
            if self.config.verify { "on" } else { "off" }
        );
        let _ = writeln!(
            report,
            "- **Variants:** {} completed, {} failed, {} skipped\n",
            self.completed(),
            self.failed(),
            self.skipped()
        );

        let _ = writeln!(report, "## Results (sorted by {})\n", key);
        report.push_str("| Variant | Status | Mean | Median | p90 | Min | Max | Std dev | MiB/s | Size | Ratio |\n");
        report.push_str("|---------|--------|------|--------|-----|-----|-----|---------|-------|------|-------|\n");
        for m in self.sorted(key) {
            let cells = row_cells(m);
            let _ = writeln!(report, "| `{}` | {} |", cells[0], cells[1..].join(" | "));
        }

        let failures: Vec<&Measurement> = self.measurements.iter().filter(|m| m.is_failed()).collect();
        if !failures.is_empty() {
            report.push_str("\n## Failures\n\n");
            for m in failures {
                if let Outcome::Failed { kind, message } = &m.outcome {
                    let _ = writeln!(report, "- `{}` ({}): {}", m.name, kind, message);
                }
            }
        }

        report
    }

    /// Pretty-printed JSON of the whole report.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; this does not happen for reports built
    /// by [`BenchmarkReport::new`].
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn sort_value(m: &Measurement, key: SortKey) -> Option<f64> {
    match key {
        SortKey::Registration | SortKey::Name => None,
        SortKey::Mean => m.stats().map(|s| s.mean_ns),
        SortKey::Median => m.stats().map(|s| s.median_ns),
        SortKey::Size => m.compressed_size().map(|size| size as f64),
        SortKey::Ratio => m.ratio(),
    }
}

fn compare(a: &Measurement, b: &Measurement, key: SortKey) -> Ordering {
    match key {
        SortKey::Registration => Ordering::Equal,
        SortKey::Name => a.name.cmp(&b.name),
        _ => match (sort_value(a, key), sort_value(b, key)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

fn row_cells(m: &Measurement) -> [String; 11] {
    let dash = || "-".to_string();
    let status = match &m.outcome {
        Outcome::Completed { .. } => "ok",
        Outcome::Failed { .. } => "FAILED",
        Outcome::Skipped => "skipped",
    };

    let timing = |f: fn(&crate::stats::Stats) -> f64| {
        m.stats().map_or_else(dash, |s| format_nanos(f(s)))
    };

    [
        m.name.clone(),
        status.to_string(),
        timing(|s| s.mean_ns),
        timing(|s| s.median_ns),
        timing(|s| s.p90_ns as f64),
        timing(|s| s.min_ns as f64),
        timing(|s| s.max_ns as f64),
        timing(|s| s.stddev_ns),
        m.throughput_mib_s()
            .map_or_else(dash, |t| format!("{:.1}", t)),
        m.compressed_size().map_or_else(dash, |s| s.to_string()),
        m.ratio().map_or_else(dash, |r| format!("{:.4}", r)),
    ]
}

/// Formats nanoseconds with a unit chosen by magnitude.
pub fn format_nanos(ns: f64) -> String {
    if ns >= 1e9 {
        format!("{:.2}s", ns / 1e9)
    } else if ns >= 1e6 {
        format!("{:.2}ms", ns / 1e6)
    } else if ns >= 1e3 {
        format!("{:.2}µs", ns / 1e3)
    } else {
        format!("{:.0}ns", ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Direction, Family};
    use crate::error::ErrorKind;
    use crate::registry::CodecVariant;
    use crate::stats::Stats;
    use std::time::Duration;

    fn hardware() -> HardwareInfo {
        HardwareInfo {
            cpu_brand: "Test CPU".into(),
            cpu_cores: 4,
            total_memory_mb: 8192,
            os: "TestOS 1".into(),
        }
    }

    fn completed(order: usize, label: &str, mean_ms: u64, size: usize) -> Measurement {
        let samples = vec![Duration::from_millis(mean_ms); 3];
        Measurement {
            variant: CodecVariant::new(Family::Gzip, Direction::Compress, label),
            name: format!("compress/gzip/{}", label),
            order,
            input_size: Some(1000),
            corpus_size: 1000,
            outcome: Outcome::Completed {
                samples_ns: samples.iter().map(|d| d.as_nanos() as u64).collect(),
                output_size: size,
                stats: Stats::from_samples(&samples).unwrap(),
            },
        }
    }

    fn failed(order: usize, label: &str) -> Measurement {
        Measurement {
            variant: CodecVariant::new(Family::Xz, Direction::Decompress, label),
            name: format!("decompress/xz/{}", label),
            order,
            input_size: None,
            corpus_size: 1000,
            outcome: Outcome::Failed {
                kind: ErrorKind::ResourceUnavailable,
                message: "fixture missing".into(),
            },
        }
    }

    fn report() -> BenchmarkReport {
        let corpus = Corpus::from_bytes("unit", vec![b'x'; 1000]);
        let results = RunResults {
            measurements: vec![
                completed(0, "slow", 30, 400),
                failed(1, "stream"),
                completed(2, "fast", 10, 400),
                completed(3, "mid", 20, 300),
            ],
            interrupted: false,
        };
        BenchmarkReport::new(&corpus, &RunConfig::quick(), results, hardware())
    }

    fn names(rows: Vec<&Measurement>) -> Vec<&str> {
        rows.into_iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_sorting_with_ties_and_missing_values() {
        let report = report();
        assert_eq!(
            names(report.sorted(SortKey::Registration)),
            vec!["compress/gzip/slow", "decompress/xz/stream", "compress/gzip/fast", "compress/gzip/mid"]
        );
        assert_eq!(
            names(report.sorted(SortKey::Mean)),
            vec!["compress/gzip/fast", "compress/gzip/mid", "compress/gzip/slow", "decompress/xz/stream"]
        );
        // slow and fast tie on size; registration order decides
        assert_eq!(
            names(report.sorted(SortKey::Size)),
            vec!["compress/gzip/mid", "compress/gzip/slow", "compress/gzip/fast", "decompress/xz/stream"]
        );
        assert_eq!(report.sorted(SortKey::Name)[0].name, "compress/gzip/fast");
    }

    #[test]
    fn test_lookup_and_counts() {
        let report = report();
        assert_eq!(report.completed(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 0);
        let mid = report.get("compress/gzip/mid").unwrap();
        assert_eq!(mid.ratio(), Some(0.3));
        assert!(report.get("compress/gzip/none").is_none());
    }

    #[test]
    fn test_text_table_marks_failures() {
        let table = report().render_table(SortKey::Registration);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2 + 4);
        assert!(lines[0].starts_with("variant"));
        assert!(lines[3].contains("FAILED"));
        assert!(lines[2].contains("30.00ms"));
    }

    #[test]
    fn test_markdown_and_json() {
        let report = report();
        let markdown = report.render_markdown(SortKey::Ratio);
        assert!(markdown.contains("## Hardware"));
        assert!(markdown.contains("Test CPU"));
        assert!(markdown.contains("## Failures"));
        assert!(markdown.contains("fixture missing"));

        let json = report.render_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["measurements"].as_array().unwrap().len(), 4);
        assert_eq!(value["measurements"][1]["outcome"]["status"], "failed");
        assert_eq!(value["corpus"]["size"], 1000);
    }

    #[test]
    fn test_format_nanos_units() {
        assert_eq!(format_nanos(512.0), "512ns");
        assert_eq!(format_nanos(1_500.0), "1.50µs");
        assert_eq!(format_nanos(2_000_000.0), "2.00ms");
        assert_eq!(format_nanos(3_250_000_000.0), "3.25s");
    }
}
