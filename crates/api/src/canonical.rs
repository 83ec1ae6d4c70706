//! Deterministic canonical JSON encoding.
//!
//! Signing and verification both operate on the bytes produced here, so
//! the encoding must be a pure function of the logical value: the same
//! document always yields the same bytes regardless of the key order it
//! arrived with.
//!
//! Rules:
//!
//! - `null`, booleans: JSON literals.
//! - Numbers: anything representable as i64/u64 is emitted in plain
//!   decimal (no `+` sign, no leading zeros); other numbers use
//!   serde_json's shortest round-trip (Ryu) formatting. This choice is
//!   part of the wire contract and matches JavaScript `JSON.stringify`
//!   for integers and for the overwhelming majority of floats.
//! - Strings: minimal escaping. Only `"`, `\`, and control characters
//!   U+0000..=U+001F are escaped, using the short escapes where JSON
//!   defines them.
//! - Arrays: `[` + comma-joined recursion in received order + `]`.
//! - Objects: keys sorted by codepoint order, emitted as
//!   `"key":value` pairs with no whitespace.

use std::fmt::Write as _;

use serde_json::{Map, Number, Value};

/// Produce the canonical encoding of a JSON value.
///
/// This is a pure function with no failure mode: every
/// [serde_json::Value] has exactly one canonical form.
pub fn canonicalize(value: &Value) -> String {
    let mut output = String::new();
    emit_value(value, &mut output);
    output
}

fn emit_value(value: &Value, output: &mut String) {
    match value {
        Value::Null => output.push_str("null"),
        Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => emit_number(n, output),
        Value::String(s) => emit_string(s, output),
        Value::Array(arr) => emit_array(arr, output),
        Value::Object(obj) => emit_object(obj, output),
    }
}

fn emit_number(n: &Number, output: &mut String) {
    if let Some(i) = n.as_i64() {
        let _ = write!(output, "{i}");
    } else if let Some(u) = n.as_u64() {
        let _ = write!(output, "{u}");
    } else {
        // Non-integer: serde_json's Display uses Ryu shortest round-trip.
        let _ = write!(output, "{n}");
    }
}

fn emit_string(s: &str, output: &mut String) {
    output.push('"');
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\u{0008}' => output.push_str("\\b"),
            '\u{000C}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if ('\u{0000}'..='\u{001F}').contains(&c) => {
                let _ = write!(output, "\\u{:04x}", c as u32);
            }
            c => output.push(c),
        }
    }
    output.push('"');
}

fn emit_array(arr: &[Value], output: &mut String) {
    output.push('[');
    for (i, item) in arr.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        emit_value(item, output);
    }
    output.push(']');
}

fn emit_object(obj: &Map<String, Value>, output: &mut String) {
    let mut sorted_keys: Vec<&String> = obj.keys().collect();
    sorted_keys.sort();

    output.push('{');
    for (i, key) in sorted_keys.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        emit_string(key, output);
        output.push(':');
        emit_value(&obj[*key], output);
    }
    output.push('}');
}
