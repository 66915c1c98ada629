pub mod json;
pub mod junit;
pub mod types;

use anyhow::{Context, Result};
use std::path::Path;

/// Re-render a saved results file
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let test_results = json::load(results_path)?;

    match format {
        "json" => json::generate(&test_results, output),
        "junit" | "xml" => {
            let xml = junit::generate_junit_xml(&test_results)?;
            match output {
                Some(path) => {
                    std::fs::write(path, xml)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("JUnit report saved to: {}", path.display());
                }
                None => println!("{}", xml),
            }
            Ok(())
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

/// Write `results.json` and `junit.xml` into the output directory
pub fn write_reports(results: &types::TestResults, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    json::generate(results, Some(&output_dir.join("results.json")))?;
    junit::write_report(results, output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{TestResult, TestSummary};

    #[test]
    fn test_write_and_rerender() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![TestResult::passed("List Rooms", 200, 10)];
        let report = types::TestResults {
            session_id: "s-1".to_string(),
            base_url: "https://example.test".to_string(),
            summary: TestSummary::from_results("s-1", &results),
            results,
            generated_at: "2024-05-01T10:00:00+00:00".to_string(),
        };

        write_reports(&report, dir.path()).unwrap();
        assert!(dir.path().join("junit.xml").exists());

        let loaded = json::load(&dir.path().join("results.json")).unwrap();
        assert_eq!(loaded.results, report.results);
        assert_eq!(loaded.summary, report.summary);

        let out = dir.path().join("again.xml");
        generate_report(&dir.path().join("results.json"), "junit", Some(&out)).unwrap();
        let xml = std::fs::read_to_string(out).unwrap();
        assert!(xml.contains(r#"<testcase name="List Rooms""#));

        assert!(generate_report(&dir.path().join("results.json"), "pdf", None).is_err());
    }
}
