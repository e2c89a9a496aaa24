//! Call-expression extraction

use super::balance::find_matching_paren;
use super::split::split_top_level_comma;

/// Match `s` as exactly one top-level call of `function_name` and return
/// its arguments.
///
/// Accepts optional leading whitespace, the literal function name, `(`,
/// a balanced argument list, `)` and nothing but whitespace after it.
/// Arguments are split on top-level commas only, so nested calls, table
/// lookups and quoted labels pass through intact. Any other shape
/// (missing prefix, unbalanced parens, trailing text like `dmg(a)(b)`)
/// is `None`.
pub fn parse_top_level_call(s: &str, function_name: &str) -> Option<Vec<String>> {
    let lead = s.len() - s.trim_start().len();
    let rest = &s[lead..];

    if !rest.starts_with(function_name) {
        return None;
    }

    let open = lead + function_name.len();
    if !s[open..].starts_with('(') {
        return None;
    }

    let close = find_matching_paren(s, open)?;
    if !s[close + 1..].trim().is_empty() {
        return None;
    }

    Some(split_args(&s[open + 1..close]))
}

/// Extract the argument list of the call whose `(` sits at `open_index`,
/// returning the arguments and the byte index of the closing `)`.
pub fn extract_call_args(s: &str, open_index: usize) -> Option<(Vec<String>, usize)> {
    let close = find_matching_paren(s, open_index)?;
    Some((split_args(&s[open_index + 1..close]), close))
}

fn split_args(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    split_top_level_comma(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_basic() {
        assert_eq!(
            parse_top_level_call("dmg(a*b, 'e')", "dmg"),
            Some(vec!["a*b".to_string(), "'e'".to_string()])
        );
    }

    #[test]
    fn test_parse_call_leading_whitespace() {
        assert_eq!(
            parse_top_level_call("  dmg(x)", "dmg"),
            Some(vec!["x".to_string()])
        );
    }

    #[test]
    fn test_parse_call_rejects_trailing_text() {
        assert_eq!(parse_top_level_call("dmg(a)(b)", "dmg"), None);
        assert_eq!(parse_top_level_call("dmg(a) + 1", "dmg"), None);
    }

    #[test]
    fn test_parse_call_rejects_other_names() {
        assert_eq!(parse_top_level_call("heal(a)", "dmg"), None);
        assert_eq!(parse_top_level_call("mydmg(a)", "dmg"), None);
        // Name followed by something other than ( is not a call
        assert_eq!(parse_top_level_call("dmgx(a)", "dmg"), None);
        assert_eq!(parse_top_level_call("dmg [a]", "dmg"), None);
    }

    #[test]
    fn test_parse_call_nested_arguments() {
        assert_eq!(
            parse_top_level_call("dmg(f(a, b), talent.e[\"x,y\"])", "dmg"),
            Some(vec![
                "f(a, b)".to_string(),
                "talent.e[\"x,y\"]".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_call_empty_args() {
        assert_eq!(parse_top_level_call("dmg()", "dmg"), Some(vec![]));
    }

    #[test]
    fn test_parse_call_unbalanced() {
        assert_eq!(parse_top_level_call("dmg(a", "dmg"), None);
    }

    #[test]
    fn test_extract_call_args_at_index() {
        let s = "x + calc(attr.cpct) * 2";
        let open = s.find('(').unwrap();
        let (args, close) = extract_call_args(s, open).unwrap();
        assert_eq!(args, vec!["attr.cpct"]);
        assert_eq!(&s[close..close + 1], ")");
    }
}
