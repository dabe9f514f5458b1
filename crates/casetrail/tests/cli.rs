use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ctrail() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("ctrail").into();
    cmd.env("NO_COLOR", "1");
    cmd
}

const CASE_EXPORT: &str = r#"<html>
<span>Case Number</span><span>46816635</span>
<span>Case Title</span><span>Crash on save</span>
<b>Description</b> Editor crashes when saving files with accented names like caf&#233;. <b>Severity</b> S2
<b>Bug Reference</b><table><tr><td>12345</td></tr></table>
<b>Emails</b>
<table>
  <tr>
    <td width="10%">Email Name</td><td width="10%">Status</td>
    <td width="40%">Subject</td><td width="30%">From Address</td>
    <td width="10%">Message Date</td>
  </tr>
  <tr>
    <td width="10%">Email-001</td><td width="10%">Sent</td>
    <td width="40%">Crash report</td><td width="30%">alice@example.com</td>
    <td width="10%">07/30/2024, 10:00:00</td>
  </tr>
  <tr><td colspan="2"><div>Saving a large file crashes the editor.</div></td></tr>
  <tr>
    <td width="10%">Email-002</td><td width="10%">Received</td>
    <td width="40%">Re: Crash report</td><td width="30%">support@example.com</td>
    <td width="10%">07/31/2024, 09:30:00</td>
  </tr>
  <tr><td colspan="2"><div>Please attach the session logs.</div></td></tr>
  <tr>
    <td width="10%">Email-003</td><td width="10%">Sent</td>
    <td width="40%">Fwd: Crash report</td><td width="30%">bob@example.com</td>
    <td width="10%">08/01/2024, 11:00:00</td>
  </tr>
  <tr><td colspan="2"><div>Saving a large file crashes the editor.</div></td></tr>
</table>
Open Activities
Case Comments
<table>
  <tr><td>Comment</td><td>Author</td><td>Created Date</td></tr>
  <tr><td>Escalated to engineering.</td><td>ivan</td><td>07/30/2024, 15:00:00</td></tr>
</table>
Case Feed
<table>
  <tr><td>Comment</td><td>Author</td><td>Created Date</td></tr>
  <tr><td>Customer confirmed the fix.</td><td>judy</td><td>08/05/2024, 16:00:00</td></tr>
</table>
Related Articles
</html>"#;

const LINKED_EXPORT: &str = "<html>DESCRIPTION Save path mishandles large buffers.
NOTES
Appended by: grace On: 30/07/2024 11:00 ====
Reproduced on build 4.2.
Appended by: henry On: 31/07/2024 09:30 ====
Fix merged to main.
AUDIT TRAIL</html>";

/// Write the saved exports the offline fetcher reads.
fn export_dir() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("exports");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("46816635.html"), CASE_EXPORT).unwrap();
    fs::write(dir.join("12345.html"), LINKED_EXPORT).unwrap();
    (tmp, dir)
}

fn read_csv(out_dir: &Path, id: &str) -> Vec<u8> {
    fs::read(out_dir.join(format!("case_{id}.csv"))).unwrap()
}

#[test]
fn binary_runs() {
    ctrail()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ctrail"));
}

#[test]
fn export_produces_csv_with_bom() {
    let (tmp, dir) = export_dir();
    let out = tmp.path().join("out");

    ctrail()
        .args(["46816635", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("46816635: ok"));

    let bytes = read_csv(&out, "46816635");
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");

    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("case_number,case_title"));

    // 2 deduplicated emails + 2 comment records + 2 linked notes
    assert_eq!(text.lines().count(), 7);
    assert!(text.contains("linked-note"));
    assert!(text.contains("initial"));
}

#[test]
fn duplicate_email_bodies_are_suppressed() {
    let (tmp, dir) = export_dir();
    let out = tmp.path().join("out");

    ctrail()
        .args(["46816635", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 duplicates dropped"));

    let text = String::from_utf8(read_csv(&out, "46816635")[3..].to_vec()).unwrap();
    assert!(!text.contains("bob@example.com"));
}

#[test]
fn envelope_policy_keeps_both_emails() {
    let (tmp, dir) = export_dir();
    let out = tmp.path().join("out");

    ctrail()
        .args(["46816635", "--dedupe", "envelope", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 duplicates dropped"));

    let text = String::from_utf8(read_csv(&out, "46816635")[3..].to_vec()).unwrap();
    assert!(text.contains("bob@example.com"));
}

#[test]
fn timeline_rows_are_chronological() {
    let (tmp, dir) = export_dir();
    let out = tmp.path().join("out");

    ctrail()
        .args(["46816635", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();

    let text = String::from_utf8(read_csv(&out, "46816635")[3..].to_vec()).unwrap();
    let first_mail = text.find("Crash report").unwrap();
    let linked = text.find("Reproduced on build 4.2.").unwrap();
    let confirmation = text.find("Customer confirmed the fix.").unwrap();

    assert!(first_mail < linked);
    assert!(linked < confirmation);
}

#[test]
fn missing_export_fails_that_case() {
    let (tmp, dir) = export_dir();
    let out = tmp.path().join("out");

    ctrail()
        .args(["99999", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .failure()
        .stdout(predicate::str::contains("99999: failed"));
}

#[test]
fn batch_continues_past_failures() {
    let (tmp, dir) = export_dir();
    let out = tmp.path().join("out");

    ctrail()
        .args(["99999", "46816635", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("99999: failed")
                .and(predicate::str::contains("46816635: ok")),
        );

    assert!(out.join("case_46816635.csv").exists());
}

#[test]
fn degraded_sections_are_reported_not_fatal() {
    let (tmp, dir) = export_dir();
    fs::write(dir.join("555.html"), "<html>no recognizable sections</html>").unwrap();
    let out = tmp.path().join("out");

    ctrail()
        .args(["555", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("degraded").and(predicate::str::contains("emails")));

    assert!(out.join("case_555.csv").exists());
}

#[test]
fn report_flag_writes_run_report() {
    let (tmp, dir) = export_dir();
    let out = tmp.path().join("out");

    ctrail()
        .args(["46816635", "--report", "--from-dir"])
        .arg(&dir)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();

    let report = fs::read_to_string(out.join("case_46816635.report.json")).unwrap();
    assert!(report.contains("\"duplicates_dropped\": 1"));
    assert!(report.contains("\"linked_notes\": 2"));
}

#[test]
fn rejects_url_template_without_placeholder() {
    ctrail()
        .args(["1", "--url-template", "https://support.example.com/export"])
        .assert()
        .failure();
}
