/// Ensures URL ends without a trailing slash
///
/// # Examples
/// ```
/// use kbchat::utils::uri::ensure_no_trailing_slash;
/// assert_eq!(ensure_no_trailing_slash("https://api.anthropic.com/"), "https://api.anthropic.com");
///
/// // Works with owned String too
/// let url = String::from("https://api.anthropic.com//");
/// assert_eq!(ensure_no_trailing_slash(url), "https://api.anthropic.com");
/// ```
pub fn ensure_no_trailing_slash<S>(url: S) -> String
where
    S: Into<String>,
{
    let mut url = url.into();
    let trimmed = url.trim_end_matches('/').len();
    url.truncate(trimmed);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_no_trailing_slash() {
        let test_cases = vec![
            ("https://api.anthropic.com/", "https://api.anthropic.com"),
            ("https://api.anthropic.com", "https://api.anthropic.com"),
            ("https://api.anthropic.com//", "https://api.anthropic.com"),
            ("http://localhost:8080/proxy/", "http://localhost:8080/proxy"),
        ];

        for (input, expected) in test_cases {
            // Test with &str
            assert_eq!(ensure_no_trailing_slash(input), expected);

            // Test with String
            assert_eq!(ensure_no_trailing_slash(input.to_string()), expected);
        }
    }

    #[test]
    fn test_no_allocation_when_unchanged() {
        let input = String::from("https://api.anthropic.com");
        let result = ensure_no_trailing_slash(input.clone());

        assert_eq!(result, input);
    }
}
