use logos::Logos;
use std::fmt;

/// Inline markdown tokens. Everything that is not a delimiter is `Text`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineToken {
    #[token("**")]
    DoubleStar,

    #[token("__")]
    DoubleUnderscore,

    #[token("*")]
    Star,

    #[token("_")]
    Underscore,

    #[token("~~")]
    DoubleTilde,

    #[token("~")]
    Tilde,

    #[token("`")]
    Backtick,

    #[token("[")]
    OpenBracket,

    #[token("](")]
    LinkMiddle,

    #[token("]")]
    CloseBracket,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[regex(r"\\[^\n]")]
    Escape,

    #[token("\\")]
    Backslash,

    #[regex(r"[^*_~`\[\]()\\]+")]
    Text,
}

impl fmt::Display for InlineToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineToken::DoubleStar => write!(f, "**"),
            InlineToken::DoubleUnderscore => write!(f, "__"),
            InlineToken::Star => write!(f, "*"),
            InlineToken::Underscore => write!(f, "_"),
            InlineToken::DoubleTilde => write!(f, "~~"),
            InlineToken::Tilde => write!(f, "~"),
            InlineToken::Backtick => write!(f, "`"),
            InlineToken::OpenBracket => write!(f, "["),
            InlineToken::LinkMiddle => write!(f, "]("),
            InlineToken::CloseBracket => write!(f, "]"),
            InlineToken::OpenParen => write!(f, "("),
            InlineToken::CloseParen => write!(f, ")"),
            InlineToken::Escape => write!(f, "escape"),
            InlineToken::Backslash => write!(f, "\\"),
            InlineToken::Text => write!(f, "text"),
        }
    }
}

/// Tokenize the inline content of a single textblock
pub fn tokenize_inline(source: &str) -> Vec<(InlineToken, std::ops::Range<usize>)> {
    let lexer = InlineToken::lexer(source);
    lexer
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<InlineToken> {
        tokenize_inline(source).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_emphasis_delimiters() {
        assert_eq!(
            kinds("**a** _b_ ~~c~~"),
            vec![
                InlineToken::DoubleStar,
                InlineToken::Text,
                InlineToken::DoubleStar,
                InlineToken::Text,
                InlineToken::Underscore,
                InlineToken::Text,
                InlineToken::Underscore,
                InlineToken::Text,
                InlineToken::DoubleTilde,
                InlineToken::Text,
                InlineToken::DoubleTilde,
            ]
        );
    }

    #[test]
    fn test_link_tokens() {
        assert_eq!(
            kinds("[docs](https://x.dev)"),
            vec![
                InlineToken::OpenBracket,
                InlineToken::Text,
                InlineToken::LinkMiddle,
                InlineToken::Text,
                InlineToken::CloseParen,
            ]
        );
    }

    #[test]
    fn test_escapes() {
        let source = r"a\*b\";
        let tokens = tokenize_inline(source);
        assert_eq!(tokens[1].0, InlineToken::Escape);
        assert_eq!(&source[tokens[1].1.clone()], r"\*");
        assert_eq!(tokens[3].0, InlineToken::Backslash);
    }

    #[test]
    fn test_unicode_text_is_one_token() {
        let tokens = tokenize_inline("héllo wörld");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].1, 0.."héllo wörld".len());
    }
}
