//! Identifier and string quoting shared by the query and schema compilers.

/// Wrap an identifier in double quotes, doubling embedded quotes.
///
/// `*` passes through unwrapped so `select *` stays intact.
pub(crate) fn wrap_value(value: &str) -> String {
    if value == "*" {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render a comma-separated list of wrapped identifiers.
pub(crate) fn columnize<I, S>(columns: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns
        .into_iter()
        .map(|column| wrap_value(column.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quote a string literal with single quotes, doubling embedded quotes.
pub(crate) fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_value_escapes_quotes() {
        assert_eq!(wrap_value("users"), "\"users\"");
        assert_eq!(wrap_value("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(wrap_value("*"), "*");
    }

    #[test]
    fn test_columnize_joins_wrapped_names() {
        assert_eq!(columnize(["id", "name"]), "\"id\", \"name\"");
    }

    #[test]
    fn test_quote_string_doubles_quotes() {
        assert_eq!(quote_string("o'brien"), "'o''brien'");
    }
}
