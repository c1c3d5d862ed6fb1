use assert_cmd::Command;
use predicates::prelude::*;

const FEED: &str = r#"<feed xmlns:m="urn:media"><entry><title>One</title><m:thumb/></entry><entry><title>Two</title></entry></feed>"#;

fn xmlx() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("xmlx")?)
}

#[test]
fn test_reformat_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .write_stdin("<a><b>x</b></a>")
        .assert()
        .success()
        .stdout(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a><b>x</b></a>"#);
    Ok(())
}

#[test]
fn test_indent_without_declaration() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .args(["--indent", "  ", "--no-decl"])
        .write_stdin("<a><b/><c>t</c></a>")
        .assert()
        .success()
        .stdout("<a>\n  <b/>\n  <c>t</c>\n</a>");
    Ok(())
}

#[test]
fn test_select_recursive_with_namespace() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .args(["--select", "title", "--recursive"])
        .write_stdin(FEED)
        .assert()
        .success()
        .stdout("<title>One</title>\n<title>Two</title>\n");

    xmlx()?
        .args(["--select", "thumb", "--ns", "m", "--recursive"])
        .write_stdin(FEED)
        .assert()
        .success()
        .stdout("<m:thumb/>\n");
    Ok(())
}

#[test]
fn test_flat_select_only_sees_top_level() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .args(["--select", "title"])
        .write_stdin(FEED)
        .assert()
        .success()
        .stdout("");
    Ok(())
}

#[test]
fn test_file_input_and_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("in.xml");
    let output = dir.path().join("out.xml");
    std::fs::write(&input, "<list><item/></list>")?;

    xmlx()?
        .arg(&input)
        .arg("--no-decl")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout("");
    assert_eq!(std::fs::read_to_string(&output)?, "<list><item/></list>");
    Ok(())
}

#[test]
fn test_entities_flag() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .arg("--no-decl")
        .write_stdin("<p>a&nbsp;b</p>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("&nbsp;"));

    xmlx()?
        .args(["--no-decl", "--entities"])
        .write_stdin("<p>a&nbsp;b</p>")
        .assert()
        .success()
        .stdout("<p>a\u{a0}b</p>");
    Ok(())
}

#[test]
fn test_syntax_error_fails() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .write_stdin("<a><b></a>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error"));
    Ok(())
}

#[test]
fn test_empty_stdin_fails() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .write_stdin("  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input"));
    Ok(())
}

#[test]
fn test_missing_input_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    xmlx()?
        .arg("does-not-exist.xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read input file"));
    Ok(())
}

#[test]
fn test_latin1_input_is_decoded() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = br#"<?xml version="1.0" encoding="ISO-8859-1"?><c>"#.to_vec();
    input.extend_from_slice(b"caf\xE9</c>");
    xmlx()?
        .arg("--no-decl")
        .write_stdin(input)
        .assert()
        .success()
        .stdout("<c>caf\u{e9}</c>");
    Ok(())
}
