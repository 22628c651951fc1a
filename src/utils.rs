/// Strip leading and trailing slashes from a KV path
///
/// `"/app/web/"` becomes `"app/web"`, and `"/"` becomes the root path `""`.
pub fn trim_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Whether a value already looks quoted for the shell
///
/// This is a heuristic: any value starting or ending with a single or
/// double quote is left alone.
pub fn looks_quoted(value: &str) -> bool {
    value.starts_with('"') || value.starts_with('\'') || value.ends_with('"') || value.ends_with('\'')
}

/// Wrap a value in double quotes unless it already looks quoted
pub fn quote_value(value: &str) -> String {
    if looks_quoted(value) {
        value.to_string()
    } else {
        format!("\"{}\"", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_path() {
        assert_eq!(trim_path("/app/web/"), "app/web");
        assert_eq!(trim_path("app"), "app");
        assert_eq!(trim_path("//"), "");
        assert_eq!(trim_path(""), "");
    }

    #[test]
    fn test_quote_value_plain() {
        assert_eq!(quote_value("1.2.3.4"), "\"1.2.3.4\"");
        assert_eq!(quote_value(""), "\"\"");
        assert_eq!(quote_value("hello world"), "\"hello world\"");
    }

    #[test]
    fn test_quote_value_already_quoted() {
        assert_eq!(quote_value("'single'"), "'single'");
        assert_eq!(quote_value("\"double\""), "\"double\"");
    }

    #[test]
    fn test_quote_value_half_quoted_is_left_alone() {
        assert_eq!(quote_value("\"open"), "\"open");
        assert_eq!(quote_value("close'"), "close'");
        // Embedded quotes are not detected
        assert_eq!(quote_value("it's"), "\"it's\"");
    }
}
