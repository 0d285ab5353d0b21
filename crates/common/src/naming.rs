//! Name derivation helpers shared by the generator and the runtime server.

/// Convert a PascalCase operation or waiter name to a kebab-case tool name.
///
/// A hyphen is inserted before each uppercase letter, everything is
/// lowercased, and a leading hyphen is stripped:
/// `GetCurrentWeather` -> `get-current-weather`.
pub fn to_kebab_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() {
            result.push('-');
            for lower in ch.to_lowercase() {
                result.push(lower);
            }
        } else {
            result.push(ch);
        }
    }
    result.trim_start_matches('-').to_string()
}

/// Strip HTML tags from Smithy documentation and normalize whitespace.
pub fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the short name from a fully-qualified shape id.
/// e.g. `com.amazonaws.s3#CreateBucket` -> `CreateBucket`
pub fn shape_name(shape_id: &str) -> &str {
    shape_id.rsplit('#').next().unwrap_or(shape_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_kebab_case() {
        assert_eq!(to_kebab_case("GetCurrentWeather"), "get-current-weather");
        assert_eq!(to_kebab_case("PutObject"), "put-object");
        assert_eq!(to_kebab_case("listBuckets"), "list-buckets");
        assert_eq!(to_kebab_case("get"), "get");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Creates a <code>Bucket</code>.</p>"),
            "Creates a Bucket."
        );
        assert_eq!(strip_html("plain   text\n  here"), "plain text here");
    }

    #[test]
    fn test_shape_name() {
        assert_eq!(shape_name("com.amazonaws.s3#CreateBucket"), "CreateBucket");
        assert_eq!(shape_name("CreateBucket"), "CreateBucket");
    }
}
