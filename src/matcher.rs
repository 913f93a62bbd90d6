use std::borrow::Cow;
use std::ops::Range;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct Matcher {
    backend: fancy_regex::Regex,
}

impl Matcher {
    // Every regex metacharacter in the query is escaped before the pattern
    // is built, so "a.b*c" finds "a.b*c" and nothing else.
    pub fn literal(query: &str) -> Result<Self> {
        if query.is_empty() {
            return Err(Error::Regex("empty query".into()));
        }
        let escaped = escape_literal(query);
        let mut builder = fancy_regex::RegexBuilder::new(&escaped);
        builder.case_insensitive(true);
        let backend = builder
            .build()
            .map_err(|error| Error::Regex(error.to_string()))?;
        Ok(Self { backend })
    }

    // Byte ranges of every non-overlapping occurrence, left to right.
    pub fn find_ranges(&self, input: &str) -> Result<Vec<Range<usize>>> {
        let mut out = Vec::new();
        for matched in self.backend.find_iter(input) {
            let matched = matched.map_err(|error| Error::Regex(error.to_string()))?;
            out.push(matched.start()..matched.end());
        }
        Ok(out)
    }

    pub fn is_match(&self, input: &str) -> Result<bool> {
        self.backend
            .is_match(input)
            .map_err(|error| Error::Regex(error.to_string()))
    }
}

pub(crate) fn escape_literal(value: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(value.len());
    let mut changed = false;

    for ch in value.chars() {
        if is_regex_meta(ch) {
            out.push('\\');
            changed = true;
        }
        out.push(ch);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(value)
    }
}

fn is_regex_meta(ch: char) -> bool {
    matches!(
        ch,
        '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '/'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_case_insensitive() -> Result<()> {
        let matcher = Matcher::literal("cat")?;
        assert_eq!(matcher.find_ranges("Cat CAT caT scatter")?.len(), 4);
        Ok(())
    }

    #[test]
    fn occurrences_do_not_overlap() -> Result<()> {
        let matcher = Matcher::literal("ab")?;
        let ranges = matcher.find_ranges("ababab")?;
        assert_eq!(ranges, vec![0..2, 2..4, 4..6]);
        Ok(())
    }

    #[test]
    fn metacharacters_match_literally() -> Result<()> {
        let matcher = Matcher::literal("a.b*c")?;
        assert!(matcher.is_match("see a.b*c here")?);
        assert!(!matcher.is_match("axbyyc")?);
        assert!(!matcher.is_match("aXbc")?);
        Ok(())
    }

    #[test]
    fn escaping_leaves_plain_text_borrowed() {
        assert!(matches!(escape_literal("plain text"), Cow::Borrowed(_)));
        assert_eq!(escape_literal("1+1 (two)"), "1\\+1 \\(two\\)");
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(Matcher::literal("").is_err());
    }
}
