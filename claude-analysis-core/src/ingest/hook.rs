//! Hook payload decoding
//!
//! A session-end hook receives a small JSON object on stdin that points at the
//! transcript file. Some hook runners hand over a Python dict literal instead
//! of JSON; that form is accepted as a fallback.

use super::reader::parse_record;
use super::RawRecord;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::PathBuf;

/// Decoded hook payload.
#[derive(Debug, Clone)]
pub struct HookInput {
    fields: RawRecord,
}

impl HookInput {
    /// Parse a hook payload from the raw stdin buffer.
    pub fn parse(buffer: &str) -> Result<Self> {
        let fields = match parse_record(buffer) {
            Ok(fields) => fields,
            Err(json_err) => {
                let converted = python_dict_to_json(buffer);
                parse_record(&converted).map_err(|_| {
                    Error::input("hook payload", format!("not a JSON object: {}", json_err))
                })?
            }
        };
        Ok(Self { fields })
    }

    /// An empty payload means there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Path of the session transcript (`transcript_path`).
    pub fn transcript_path(&self) -> Result<PathBuf> {
        match self.fields.get("transcript_path") {
            Some(Value::String(path)) if !path.is_empty() => Ok(PathBuf::from(path)),
            Some(Value::String(_)) => Err(Error::input("hook payload", "transcript_path is empty")),
            Some(_) => Err(Error::input(
                "hook payload",
                "transcript_path is not a string",
            )),
            None => Err(Error::input("hook payload", "missing transcript_path")),
        }
    }

    /// Session identifier carried by the hook, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.fields.get("session_id").and_then(Value::as_str)
    }
}

/// Rewrite a Python dict literal into JSON.
///
/// String literals in either quote style become JSON strings with their
/// contents kept verbatim. `True`, `False` and `None` are mapped only as bare
/// words outside string literals.
fn python_dict_to_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => out.push_str("\\\\"),
                        },
                        '"' if c == '\'' => out.push_str("\\\""),
                        q if q == c => break,
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    _ => &word,
                });
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_json_payload() {
        let input = HookInput::parse(
            r#"{"session_id":"abc","transcript_path":"/tmp/t.jsonl","hook_event_name":"Stop"}"#,
        )
        .unwrap();
        assert!(!input.is_empty());
        assert_eq!(input.session_id(), Some("abc"));
        assert_eq!(input.transcript_path().unwrap(), PathBuf::from("/tmp/t.jsonl"));
    }

    #[test]
    fn test_parses_python_dict_payload() {
        let input = HookInput::parse(
            "{'session_id': 'abc', 'transcript_path': '/tmp/t.jsonl', 'stop_hook_active': False, 'extra': None}",
        )
        .unwrap();
        assert_eq!(input.transcript_path().unwrap(), PathBuf::from("/tmp/t.jsonl"));
    }

    #[test]
    fn test_python_literals_inside_strings_are_kept() {
        let input = HookInput::parse(
            "{'transcript_path': '/srv/Nonexistent/True/t.jsonl', 'stop_hook_active': False}",
        )
        .unwrap();
        assert_eq!(
            input.transcript_path().unwrap(),
            PathBuf::from("/srv/Nonexistent/True/t.jsonl")
        );
    }

    #[test]
    fn test_python_escaped_apostrophe_in_path() {
        let input = HookInput::parse(
            r"{'transcript_path': '/Users/O\'Brien/t.jsonl', 'session_id': None}",
        )
        .unwrap();
        assert_eq!(
            input.transcript_path().unwrap(),
            PathBuf::from("/Users/O'Brien/t.jsonl")
        );
        assert_eq!(input.session_id(), None);
    }

    #[test]
    fn test_python_double_quotes_inside_single_quoted_string() {
        let converted = python_dict_to_json(r#"{'note': 'say "hi"', 'ok': True}"#);
        assert_eq!(converted, r#"{"note": "say \"hi\"", "ok": true}"#);
    }

    #[test]
    fn test_empty_object() {
        let input = HookInput::parse("{}").unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn test_transcript_path_errors() {
        let missing = HookInput::parse(r#"{"session_id":"abc"}"#).unwrap();
        assert!(missing.transcript_path().is_err());

        let wrong_type = HookInput::parse(r#"{"transcript_path":3}"#).unwrap();
        assert!(wrong_type.transcript_path().is_err());

        let empty = HookInput::parse(r#"{"transcript_path":""}"#).unwrap();
        assert!(empty.transcript_path().is_err());
    }

    #[test]
    fn test_garbage_is_input_error() {
        let err = HookInput::parse("definitely not a dict").unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }
}
