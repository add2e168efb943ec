// ABOUTME: Integration tests for the yamscrape CLI binary.
// ABOUTME: Tests file and URL targets, JSON and report output, strict mode and configuration errors.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const CONFIG: &str = r#"
name: Shop listing
definitions:
  - selector: h1
    name: title
    note: Page heading
  - selector: .item
    name: items
    children:
      - selector: span.price
        name: price
"#;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Shop</title></head>
<body>
<h1>  Weekly   deals </h1>
<div class="item"><span class="price">$5</span></div>
<div class="item"><span class="price">$7</span></div>
</body>
</html>"#;

fn yamscrape_cmd() -> Command {
    Command::cargo_bin("yamscrape").unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn extracts_fields_from_html_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(&temp_dir, "config.yaml", CONFIG);
    let page = write(&temp_dir, "page.html", PAGE);

    let value = stdout_json(
        yamscrape_cmd()
            .arg("--config")
            .arg(&config)
            .arg("--html")
            .arg(&page),
    );

    assert_eq!(value["fields"]["title"], "Weekly deals");
    assert_eq!(value["fields"]["items"][0]["price"], "$5");
    assert_eq!(value["fields"]["items"][1]["price"], "$7");
    assert_eq!(value["errors"], serde_json::json!([]));
}

#[test]
fn inline_configuration_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let page = write(&temp_dir, "page.html", PAGE);

    yamscrape_cmd()
        .arg("-c")
        .arg("[{selector: h1, name: heading}]")
        .arg("--html")
        .arg(&page)
        .arg("--compact")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"fields":{"heading":"Weekly deals"},"errors":[]}"#));
}

#[test]
fn report_format_renders_sections() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(&temp_dir, "config.yaml", CONFIG);
    let page = write(&temp_dir, "page.html", PAGE);

    yamscrape_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--html")
        .arg(&page)
        .arg("--format")
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("### title ###\nNote: Page heading\n\nWeekly deals"))
        .stdout(predicate::str::contains("--- Element 1 ---"))
        .stdout(predicate::str::contains("price: $7"));
}

#[test]
fn json_fields_follow_configuration_order() {
    let temp_dir = TempDir::new().unwrap();
    let page = write(&temp_dir, "page.html", "<h1>A</h1><h2>Z</h2>");

    yamscrape_cmd()
        .arg("--compact")
        .arg("--config")
        .arg("[{selector: h2, name: zeta}, {selector: h1, name: alpha}]")
        .arg("--html")
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"fields":{"zeta":"Z","alpha":"A"},"errors":[]}"#));
}

#[test]
fn strict_report_fails_on_cardinality() {
    let temp_dir = TempDir::new().unwrap();
    let page = write(&temp_dir, "page.html", "<ul><li>one</li><li>two</li></ul>");
    let config = "[{selector: li, name: one, expect_single: true}]";

    yamscrape_cmd()
        .arg("-f")
        .arg("report")
        .arg("--strict")
        .arg("--config")
        .arg(config)
        .arg("--html")
        .arg(&page)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("--- Element").not())
        .stderr(predicate::str::contains("expected exactly one match, found 2"));

    yamscrape_cmd()
        .arg("-f")
        .arg("report")
        .arg("--config")
        .arg(config)
        .arg("--html")
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("No content found for the provided selectors."));
}

#[test]
fn single_line_collapses_report_text() {
    let temp_dir = TempDir::new().unwrap();
    let page = write(&temp_dir, "page.html", "<div class=\"body\"><p>First</p>\n<p>Second</p></div>");
    let config = "[{selector: div.body, name: Body}]";

    yamscrape_cmd()
        .args(["-f", "report", "--config", config, "--html"])
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("First\nSecond"));

    yamscrape_cmd()
        .args(["-f", "report", "--single-line", "--config", config, "--html"])
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("First Second"));
}

#[test]
fn lenient_mode_reports_errors_and_keeps_siblings() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(
        &temp_dir,
        "config.yaml",
        "- {selector: .item, name: item, expect_single: true}\n- {selector: h1, name: title}\n",
    );
    let page = write(&temp_dir, "page.html", PAGE);

    let value = stdout_json(
        yamscrape_cmd()
            .arg("--config")
            .arg(&config)
            .arg("--html")
            .arg(&page),
    );

    assert_eq!(value["fields"]["title"], "Weekly deals");
    assert_eq!(value["errors"][0]["code"], "cardinality");
    assert_eq!(value["errors"][0]["path"], "item");
}

#[test]
fn strict_mode_fails_on_cardinality() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(
        &temp_dir,
        "config.yaml",
        "- {selector: .item, name: item, expect_single: true}\n",
    );
    let page = write(&temp_dir, "page.html", PAGE);

    yamscrape_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--html")
        .arg(&page)
        .arg("--strict")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("expected exactly one match, found 2"));
}

#[test]
fn missing_selector_is_a_load_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(&temp_dir, "config.yaml", "- {selector: h1, name: title}\n- {name: price}\n");
    let page = write(&temp_dir, "page.html", PAGE);

    yamscrape_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--html")
        .arg(&page)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[1].selector"));
}

#[test]
fn no_targets_is_an_error() {
    yamscrape_cmd()
        .arg("--config")
        .arg("[{selector: h1, name: title}]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one --html file or URL"));
}

#[test]
fn separator_joins_multiple_matches() {
    let temp_dir = TempDir::new().unwrap();
    let page = write(&temp_dir, "page.html", PAGE);

    let value = stdout_json(
        yamscrape_cmd()
            .arg("--config")
            .arg("[{selector: span.price, name: prices}]")
            .arg("--separator")
            .arg(", ")
            .arg("--html")
            .arg(&page),
    );
    assert_eq!(value["fields"]["prices"], "$5, $7");
}

#[test]
fn output_file_is_written() {
    let temp_dir = TempDir::new().unwrap();
    let page = write(&temp_dir, "page.html", PAGE);
    let out = temp_dir.path().join("out.json");

    yamscrape_cmd()
        .arg("--config")
        .arg("[{selector: h1, name: title}]")
        .arg("--html")
        .arg(&page)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["fields"]["title"], "Weekly deals");
}

#[test]
fn multiple_urls_output_envelope() {
    let server = MockServer::start();

    let mock1 = server.mock(|when, then| {
        when.method(GET).path("/page1");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html><body><h1>Page One</h1></body></html>");
    });

    let mock2 = server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404).body("<html><body><h1>Not here</h1></body></html>");
    });

    let url1 = server.url("/page1");
    let url2 = server.url("/missing");

    let output = yamscrape_cmd()
        .arg("--config")
        .arg("[{selector: h1, name: title}]")
        .arg("--allow-private-networks")
        .arg(&url1)
        .arg(&url2)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stdout
        .clone();

    mock1.assert();
    mock2.assert();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["total"], 2);
    assert_eq!(value["failed"], 1);
    assert_eq!(value["results"][0]["target"], url1.as_str());
    assert_eq!(value["results"][0]["fields"]["title"], "Page One");
    assert_eq!(value["results"][1]["ok"], false);
}

#[test]
fn private_urls_blocked_without_flag() {
    let server = MockServer::start();
    let url = server.url("/page");

    yamscrape_cmd()
        .arg("--config")
        .arg("[{selector: h1, name: title}]")
        .arg(&url)
        .assert()
        .failure()
        .stdout(predicate::str::contains("private"));
}
