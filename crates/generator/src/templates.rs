//! Template loading and management

use smithy_mcp_common::{Result, SmithyMcpError};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    // Register custom filters
    tera.register_filter("rust_string", rust_string_filter);

    tera.add_raw_template("Cargo.toml", include_str!("../templates/Cargo.toml.tera"))
        .map_err(|e| {
            SmithyMcpError::Generation(format!("Failed to load Cargo.toml template: {}", e))
        })?;

    tera.add_raw_template("main.rs", include_str!("../templates/main.rs.tera"))
        .map_err(|e| {
            SmithyMcpError::Generation(format!("Failed to load main.rs template: {}", e))
        })?;

    tera.add_raw_template("README.md", include_str!("../templates/README.md.tera"))
        .map_err(|e| {
            SmithyMcpError::Generation(format!("Failed to load README.md template: {}", e))
        })?;

    Ok(tera)
}

/// Filter rendering a value as a Rust string literal, escapes included.
fn rust_string_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("rust_string filter expects a string"))?;

    let mut literal = String::with_capacity(s.len() + 2);
    literal.push('"');
    for c in s.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if c.is_control() => literal.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push('"');

    Ok(Value::String(literal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_filter(input: &str) -> String {
        let value = Value::String(input.to_string());
        let result = rust_string_filter(&value, &HashMap::new()).unwrap();
        result.as_str().unwrap().to_string()
    }

    #[test]
    fn test_rust_string_escapes_quotes_and_backslashes() {
        assert_eq!(run_filter(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(run_filter(r"a\b"), r#""a\\b""#);
    }

    #[test]
    fn test_rust_string_escapes_newlines() {
        assert_eq!(run_filter("line1\nline2"), r#""line1\nline2""#);
    }

    #[test]
    fn test_rust_string_plain_passthrough() {
        assert_eq!(run_filter("get-weather"), r#""get-weather""#);
    }
}
