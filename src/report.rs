use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

pub const NO_IMAGE_PATH: &str = "No image path provided";

/// Exit status for a run that produced a report, successful or not.
pub const EXIT_REPORTED: i32 = 0;
/// Exit status when the invocation itself was malformed.
pub const EXIT_USAGE: i32 = 1;

/// The single JSON object a run writes to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeReport {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.into()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).with_context(|| "failed to serialize outcome report")
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let json = self.to_json()?;
        writer
            .write_all(json.as_bytes())
            .with_context(|| "failed to write outcome report")?;
        writer.flush().with_context(|| "failed to flush outcome report")?;
        Ok(())
    }
}

impl<E: std::fmt::Display> From<std::result::Result<String, E>> for OutcomeReport {
    fn from(result: std::result::Result<String, E>) -> Self {
        match result {
            Ok(text) => OutcomeReport::success(text),
            Err(err) => OutcomeReport::failure(err.to_string()),
        }
    }
}

/// Writes `report` to stdout and ends the process with `code`.
pub fn emit_and_exit(report: &OutcomeReport, code: i32) -> ! {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if let Err(err) = report.write_to(&mut handle) {
        tracing::error!("{:#}", err);
    }
    drop(handle);
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_text_only() {
        let json = OutcomeReport::success("TOTAL 4.20").to_json().expect("json");
        assert_eq!(json, r#"{"success":true,"text":"TOTAL 4.20"}"#);
    }

    #[test]
    fn failure_serializes_error_only() {
        let json = OutcomeReport::failure("File not found: a.png")
            .to_json()
            .expect("json");
        assert_eq!(json, r#"{"success":false,"error":"File not found: a.png"}"#);
    }

    #[test]
    fn empty_text_is_still_present() {
        let json = OutcomeReport::success("").to_json().expect("json");
        assert_eq!(json, r#"{"success":true,"text":""}"#);
    }

    #[test]
    fn converts_from_result() {
        let ok: std::result::Result<String, String> = Ok("cash".to_string());
        assert_eq!(OutcomeReport::from(ok), OutcomeReport::success("cash"));
        let err: std::result::Result<String, String> = Err("boom".to_string());
        assert_eq!(OutcomeReport::from(err), OutcomeReport::failure("boom"));
    }

    #[test]
    fn writes_exactly_one_object() {
        let mut buffer = Vec::new();
        OutcomeReport::failure(NO_IMAGE_PATH)
            .write_to(&mut buffer)
            .expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("parse");
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], NO_IMAGE_PATH);
        assert!(value.get("text").is_none());
    }
}
