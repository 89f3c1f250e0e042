//! Single-segment glob compilation and matching.
//!
//! A segment is one `/`-free piece of a pattern. Supported syntax:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match any character in the set or range
//! - `[!abc]` or `[^abc]` match any character NOT in the set
//! - `\x` matches `x` literally
//!
//! Unlike shell globbing, malformed input is rejected at compile time
//! instead of silently falling back to a literal match.

use crate::pattern::PatternError;

/// Upper bound on recursive calls while matching one segment. Protects against
/// adversarial patterns like `*a*a*a*...*a` that cause O(n^k) backtracking.
const MAX_MATCH_CALLS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    Star,
    Class { negated: bool, items: Vec<ClassItem> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

impl ClassItem {
    fn contains(&self, ch: char) -> bool {
        match *self {
            ClassItem::Char(c) => c == ch,
            ClassItem::Range(lo, hi) => lo <= ch && ch <= hi,
        }
    }
}

/// One compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Exact name, no metacharacters.
    Literal(String),
    /// Name with wildcards or classes.
    Wildcard(WildcardSegment),
    /// `**`: zero or more whole path components.
    Globstar,
}

/// Compiled token stream for a wildcard segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardSegment {
    tokens: Vec<Token>,
}

impl Segment {
    /// Compile one segment of `pattern`. `pattern` is only used for error
    /// messages.
    pub fn compile(part: &str, pattern: &str) -> Result<Self, PatternError> {
        if part == "**" {
            return Ok(Segment::Globstar);
        }

        let tokens = tokenize(part, pattern)?;
        if tokens.iter().all(|t| matches!(t, Token::Literal(_))) {
            let literal = tokens
                .iter()
                .filter_map(|t| match t {
                    Token::Literal(c) => Some(*c),
                    _ => None,
                })
                .collect();
            return Ok(Segment::Literal(literal));
        }

        Ok(Segment::Wildcard(WildcardSegment { tokens }))
    }

    /// Match a single path component against this segment.
    ///
    /// `Globstar` matches any single component; callers handle its
    /// multi-component behavior.
    pub fn matches(&self, component: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == component,
            Segment::Wildcard(w) => w.matches(component),
            Segment::Globstar => true,
        }
    }
}

impl WildcardSegment {
    fn matches(&self, component: &str) -> bool {
        let input: Vec<char> = component.chars().collect();
        let mut calls = 0usize;
        match_bounded(&self.tokens, 0, &input, 0, &mut calls)
    }
}

fn tokenize(part: &str, pattern: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = part.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Consecutive stars inside a segment collapse to one
                if tokens.last() != Some(&Token::Star) {
                    tokens.push(Token::Star);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    return Err(PatternError::malformed(pattern, "trailing escape"));
                };
                tokens.push(Token::Literal(next));
                i += 2;
            }
            '[' => {
                let (token, consumed) = parse_class(&chars[i..], pattern)?;
                tokens.push(token);
                i += consumed;
            }
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Parse a character class starting at `chars[0] == '['`.
///
/// Returns the token and how many chars were consumed, including both brackets.
fn parse_class(chars: &[char], pattern: &str) -> Result<(Token, usize), PatternError> {
    let mut idx = 1;
    let mut negated = false;

    if matches!(chars.get(idx), Some('!') | Some('^')) {
        negated = true;
        idx += 1;
    }

    // `]` as the first member is literal
    let first = idx;
    let mut items = Vec::new();

    loop {
        let Some(&c) = chars.get(idx) else {
            return Err(PatternError::malformed(pattern, "unclosed character class"));
        };

        if c == ']' && idx > first {
            idx += 1;
            break;
        }

        let c = if c == '\\' {
            idx += 1;
            match chars.get(idx) {
                Some(&escaped) => escaped,
                None => return Err(PatternError::malformed(pattern, "trailing escape")),
            }
        } else {
            c
        };

        // Range a-z; a trailing `-` is literal
        if chars.get(idx + 1) == Some(&'-')
            && matches!(chars.get(idx + 2), Some(&end) if end != ']')
        {
            let end = chars[idx + 2];
            if end < c {
                return Err(PatternError::malformed(pattern, "inverted range in character class"));
            }
            items.push(ClassItem::Range(c, end));
            idx += 3;
            continue;
        }

        items.push(ClassItem::Char(c));
        idx += 1;
    }

    if items.is_empty() {
        return Err(PatternError::malformed(pattern, "empty character class"));
    }

    Ok((Token::Class { negated, items }, idx))
}

/// Work-bounded recursive matching with backtracking for `*`.
///
/// Returns `false` (non-match) once total calls exceed `MAX_MATCH_CALLS`.
fn match_bounded(
    tokens: &[Token],
    ti: usize,
    input: &[char],
    ii: usize,
    calls: &mut usize,
) -> bool {
    *calls += 1;
    if *calls > MAX_MATCH_CALLS {
        return false;
    }

    let Some(token) = tokens.get(ti) else {
        return ii >= input.len();
    };

    match token {
        Token::Star => {
            // Star at end matches everything remaining
            if ti + 1 >= tokens.len() {
                return true;
            }
            (ii..=input.len()).any(|skip| match_bounded(tokens, ti + 1, input, skip, calls))
        }
        Token::AnyChar => ii < input.len() && match_bounded(tokens, ti + 1, input, ii + 1, calls),
        Token::Class { negated, items } => {
            let Some(&ch) = input.get(ii) else {
                return false;
            };
            let hit = items.iter().any(|item| item.contains(ch));
            hit != *negated && match_bounded(tokens, ti + 1, input, ii + 1, calls)
        }
        Token::Literal(c) => {
            input.get(ii) == Some(c) && match_bounded(tokens, ti + 1, input, ii + 1, calls)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn seg(part: &str) -> Segment {
        Segment::compile(part, part).unwrap()
    }

    #[test]
    fn literal_segments_compile_to_literal() {
        assert_eq!(seg("main.rs"), Segment::Literal("main.rs".into()));
        assert_eq!(seg("a\\*b"), Segment::Literal("a*b".into()));
        assert_eq!(seg("**"), Segment::Globstar);
        assert!(matches!(seg("*.rs"), Segment::Wildcard(_)));
    }

    #[rstest]
    #[case::star_all("*", "anything", true)]
    #[case::star_empty("*", "", true)]
    #[case::star_suffix("*.rs", "main.rs", true)]
    #[case::star_suffix_miss("*.rs", "main.txt", false)]
    #[case::star_prefix("foo*", "foo", true)]
    #[case::star_prefix_long("foo*", "foo2", true)]
    #[case::star_prefix_miss("foo*", "bar", false)]
    #[case::star_middle("a*b*c", "aXXXbYYYc", true)]
    #[case::question("test?", "test1", true)]
    #[case::question_short("test?", "test", false)]
    #[case::question_long("?", "ab", false)]
    #[case::class("[abc]", "b", true)]
    #[case::class_miss("[abc]", "d", false)]
    #[case::range("[a-z]", "m", true)]
    #[case::range_miss("[a-z]", "A", false)]
    #[case::negated_bang("[!abc]", "d", true)]
    #[case::negated_caret("[^abc]", "a", false)]
    #[case::leading_bracket("[]abc]", "]", true)]
    #[case::trailing_dash("[abc-]", "-", true)]
    #[case::escaped_star("\\*", "*", true)]
    #[case::escaped_star_miss("\\*", "a", false)]
    #[case::unicode("?", "ü", true)]
    #[case::dotfile(".*", ".gitignore", true)]
    #[case::dotfile_miss(".*", "visible", false)]
    fn segment_matching(#[case] pattern: &str, #[case] input: &str, #[case] expected: bool) {
        assert_eq!(seg(pattern).matches(input), expected, "{pattern} vs {input}");
    }

    #[rstest]
    #[case::unclosed_class("[abc")]
    #[case::unclosed_negated("[!")]
    #[case::trailing_escape("abc\\")]
    #[case::inverted_range("[z-a]")]
    fn malformed_segments_are_rejected(#[case] part: &str) {
        assert!(matches!(
            Segment::compile(part, part),
            Err(PatternError::Malformed { .. })
        ));
    }

    #[test]
    fn backtracking_is_bounded() {
        let pattern = format!("{}b", "*a".repeat(50));
        let input = "a".repeat(100);
        // Must return in bounded time; the verdict itself does not matter.
        let _ = seg(&pattern).matches(&input);
    }
}
