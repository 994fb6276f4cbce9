use std::path::PathBuf;

/// Result of rendering a single file.
pub struct FileResult {
    pub path: PathBuf,
    pub original_size: u64,
    pub output_size: u64,
    /// Processor that shaped the image, if any
    pub processor: Option<String>,
    /// The processor failed and the unprocessed image was written instead
    pub recovered: bool,
    pub error: Option<String>,
}

impl FileResult {
    pub fn failed(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            original_size: 0,
            output_size: 0,
            processor: None,
            recovered: false,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregate report for all rendered files.
#[derive(Default)]
pub struct Report {
    pub results: Vec<FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn total_original(&self) -> u64 {
        self.results.iter().map(|r| r.original_size).sum()
    }

    pub fn total_output(&self) -> u64 {
        self.results.iter().map(|r| r.output_size).sum()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_none()).count()
    }

    pub fn processed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.error.is_none() && r.processor.is_some() && !r.recovered)
            .count()
    }

    pub fn recovered_count(&self) -> usize {
        self.results.iter().filter(|r| r.recovered).count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn print_summary(&self) {
        println!("\n--- Summary ---");
        println!(
            "Files rendered: {} | Post-processed: {} | Recovered: {} | Errors: {}",
            self.success_count(),
            self.processed_count(),
            self.recovered_count(),
            self.error_count()
        );

        if self.success_count() > 0 {
            println!(
                "Total: {} → {}",
                format_size(self.total_original()),
                format_size(self.total_output())
            );
        }

        for r in &self.results {
            if let Some(ref err) = r.error {
                println!("  ERROR {}: {}", r.path.display(), err);
            }
        }
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(processor: Option<&str>, recovered: bool) -> FileResult {
        FileResult {
            path: "a.jpg".into(),
            original_size: 2048,
            output_size: 4096,
            processor: processor.map(String::from),
            recovered,
            error: None,
        }
    }

    #[test]
    fn counts_split_by_outcome() {
        let mut report = Report::new();
        report.add(ok(Some("rounded-corners"), false));
        report.add(ok(Some("rounded-corners"), true));
        report.add(ok(None, false));
        report.add(FileResult::failed("b.jpg".into(), "failed to decode image: eof"));

        assert_eq!(report.success_count(), 3);
        assert_eq!(report.processed_count(), 1);
        assert_eq!(report.recovered_count(), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.total_output(), 3 * 4096);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
