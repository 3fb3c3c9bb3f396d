use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

pub fn list_tesseract_languages(binary: &str) -> Result<Vec<String>> {
    let output = Command::new(binary)
        .arg("--list-langs")
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {} --list-langs (is it installed?)", binary))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} --list-langs failed: {}", binary, stderr.trim()));
    }
    Ok(parse_language_list(&String::from_utf8_lossy(&output.stdout)))
}

/// First line of `--list-langs` is a banner naming the tessdata directory.
pub(super) fn parse_language_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

pub(super) fn ensure_language(requested: &str, available: &[String]) -> Result<String> {
    let lang = requested.trim();
    if lang.is_empty() {
        return Err(anyhow!("ocr language is empty"));
    }
    if available.iter().any(|value| value == lang) {
        return Ok(lang.to_string());
    }
    Err(anyhow!(
        "ocr language not available: {} (available: {})",
        lang,
        available.join(", ")
    ))
}

pub(super) fn run_tesseract_tsv(
    binary: &str,
    path: &Path,
    language: &str,
    psm: u32,
    verbose: bool,
) -> Result<String> {
    let output = Command::new(binary)
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(language)
        .arg("--oem")
        .arg("1")
        .arg("--psm")
        .arg(psm.to_string())
        .arg("tsv")
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {} (is it installed?)", binary))?;

    forward_stderr(&output, verbose);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract failed: {}", stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn forward_stderr(output: &Output, verbose: bool) {
    if !verbose {
        return;
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
        debug!(target: "tesseract", "{}", line.trim());
    }
}
