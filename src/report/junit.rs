use super::types::TestResults;
use crate::runner::state::TestResult;
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

/// Generate JUnit XML report string from TestResults
pub fn generate_junit_xml(results: &TestResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_tests = results.results.len();
    let failures = results.results.iter().filter(|r| !r.success).count();
    let total_duration: u64 = results
        .results
        .iter()
        .map(|r| r.duration_ms.unwrap_or(0))
        .sum();

    // <testsuites>
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "chat-api-tests"));
    suites_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(total_duration).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    // One suite per run
    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", results.base_url.as_str()));
    suite_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("id", results.session_id.as_str()));
    suite_start.push_attribute(("time", seconds(total_duration).as_str()));
    suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for result in &results.results {
        write_test_case(&mut writer, result)?;
    }

    if let Some(reason) = &results.summary.aborted {
        writer.write_event(Event::Start(BytesStart::new("system-err")))?;
        writer.write_event(Event::Text(BytesText::new(reason)))?;
        writer.write_event(Event::End(BytesEnd::new("system-err")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(writer: &mut Writer<W>, result: &TestResult) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", result.name.as_str()));
    case_start.push_attribute(("classname", "chat_api"));
    case_start.push_attribute(("time", seconds(result.duration_ms.unwrap_or(0)).as_str()));

    writer.write_event(Event::Start(case_start))?;

    if !result.success {
        let message = result.details.as_deref().unwrap_or("Unknown error");
        let mut fail_start = BytesStart::new("failure");
        fail_start.push_attribute(("message", message));
        fail_start.push_attribute(("type", "AssertionError"));
        writer.write_event(Event::Start(fail_start))?;
        writer.write_event(Event::Text(BytesText::new(message)))?;
        writer.write_event(Event::End(BytesEnd::new("failure")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write report to file
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}
