use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;

const PAGE: &str = "<p style=\"color:red\">{%$title%}</p>\n<style>a{b:c}</style>\n";

#[test]
fn prints_text_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("page.tpl");
    fs::write(&path, PAGE).expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&path).arg("--tpl").arg("--format").arg("text");
    cmd.assert().success().stdout(PAGE);
}

#[test]
fn prints_json_and_treeviz() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("page.tpl");
    fs::write(&path, PAGE).expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&path).arg("--tpl").arg("-f").arg("json");
    cmd.assert().success().stdout(
        predicate::str::contains("\"grammar\": \"markup\"")
            .and(predicate::str::contains("\"styleTokens\"")),
    );

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&path).arg("--tpl");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("⧉ markup").and(predicate::str::contains("css-property")));
}

#[test]
fn rejects_unsupported_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello").expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&path);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("can not get AST"));
}

#[test]
fn reports_backend_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.css");
    fs::write(&path, "a { /* open").expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("style error at 0:4: unclosed comment"));
}

#[test]
fn config_file_enables_template_scripts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let page = dir.path().join("page.tpl");
    fs::write(
        &page,
        "<script type=\"text/x-tmpl\"><b>[[$x]]</b></script>",
    )
    .expect("write");
    let config = dir.path().join("weft.toml");
    fs::write(
        &config,
        "[js_tpl]\ntype = [\"text/x-tmpl\"]\nld = \"[[\"\nrd = \"]]\"\n",
    )
    .expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&page).arg("--tpl").arg("--config").arg(&config);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("tpl 0:30 [[$x]]"));
}

#[test]
fn unknown_format_lists_alternatives() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("a.css");
    fs::write(&path, "a{}").expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&path).arg("--format").arg("yaml");
    cmd.assert().failure().stderr(
        predicate::str::contains("Format 'yaml' not found")
            .and(predicate::str::contains("json, text, treeviz")),
    );
}

#[test]
fn lists_formats() {
    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg("--list-formats");
    cmd.assert().success().stdout(
        predicate::str::contains("treeviz")
            .and(predicate::str::contains("json"))
            .and(predicate::str::contains("text")),
    );
}

#[test]
fn local_config_file_is_picked_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("page.tpl"), "<p>[[$x]]</p>").expect("write");
    fs::write(dir.path().join("weft.toml"), "[tpl]\nld = \"[[\"\nrd = \"]]\"\n").expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.current_dir(dir.path()).arg("page.tpl").arg("--tpl");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("tpl 0:3 [[$x]]"));
}

#[test]
fn delimiter_flags_override_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("page.tpl");
    fs::write(&path, "<p><%$x%></p>").expect("write");

    let mut cmd = cargo_bin_cmd!("weft");
    cmd.arg(&path)
        .arg("--tpl")
        .arg("--tpl-ld")
        .arg("<%")
        .arg("--tpl-rd")
        .arg("%>");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("tpl 0:3 <%$x%>"));
}
