// Line-oriented parser for Boost INFO documents, built on nom
//
// A line holds `key [value]`, optionally followed by `{`, or a lone brace.
// `;` outside a quoted string starts a comment.

use super::tree::InfoTree;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_till1},
    character::complete::{char, multispace0},
    combinator::{map, opt, value},
    multi::many0,
    sequence::{delimited, preceded},
    IResult, Parser,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: '{{' does not follow a key")]
    UnexpectedOpen { line: usize },

    #[error("line {line}: '}}' without a matching '{{'")]
    UnbalancedClose { line: usize },

    #[error("line {line}: unterminated quoted string")]
    UnterminatedString { line: usize },

    #[error("line {line}: unexpected input '{text}'")]
    UnexpectedInput { line: usize, text: String },

    #[error("block '{key}' is never closed")]
    UnclosedBlock { key: String },
}

pub type Result<T> = std::result::Result<T, InfoError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
}

/// What the next word on the current line means
#[derive(Debug, Clone, Copy, PartialEq)]
enum LineState {
    Key,
    Value,
    Done,
}

/// Characters that end a bare (unquoted) word
pub(crate) fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '}' | ';' | '"')
}

/// Parse a double-quoted string, resolving backslash escapes
fn quoted(input: &str) -> IResult<&str, String> {
    let body = escaped_transform(
        is_not("\\\""),
        '\\',
        alt((
            value("\\", tag("\\")),
            value("\"", tag("\"")),
            value("\n", tag("n")),
            value("\t", tag("t")),
        )),
    );
    delimited(
        char('"'),
        map(opt(body), |s: Option<String>| s.unwrap_or_default()),
        char('"'),
    )
    .parse(input)
}

fn bare(input: &str) -> IResult<&str, &str> {
    take_till1(is_delimiter).parse(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Open, char('{')),
        value(Token::Close, char('}')),
        map(quoted, Token::Word),
        map(bare, |s: &str| Token::Word(s.to_string())),
    ))
    .parse(input)
}

/// Split one line into tokens, dropping any trailing comment
fn tokenize_line(line: &str, line_no: usize) -> Result<Vec<Token>> {
    let parsed: IResult<&str, Vec<Token>> = many0(preceded(multispace0, token)).parse(line);
    let (rest, tokens) = parsed.map_err(|_| InfoError::UnexpectedInput {
        line: line_no,
        text: line.trim().to_string(),
    })?;

    let rest = rest.trim_start();
    if rest.is_empty() || rest.starts_with(';') {
        Ok(tokens)
    } else if rest.starts_with('"') {
        Err(InfoError::UnterminatedString { line: line_no })
    } else {
        Err(InfoError::UnexpectedInput {
            line: line_no,
            text: rest.to_string(),
        })
    }
}

fn current<'a>(root: &'a mut InfoTree, open: &'a mut [(String, InfoTree)]) -> &'a mut InfoTree {
    match open.last_mut() {
        Some((_, node)) => node,
        None => root,
    }
}

/// Build a tree from a complete INFO document
pub(crate) fn parse_document(text: &str) -> Result<InfoTree> {
    let mut root = InfoTree::new();
    // Blocks currently open, innermost last. A block is detached from its
    // parent while open and re-attached when its `}` is seen.
    let mut open: Vec<(String, InfoTree)> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut state = LineState::Key;

        for token in tokenize_line(line, line_no)? {
            match token {
                Token::Open => {
                    let (key, node) = current(&mut root, &mut open)
                        .pop()
                        .ok_or(InfoError::UnexpectedOpen { line: line_no })?;
                    open.push((key, node));
                    state = LineState::Key;
                }
                Token::Close => {
                    let (key, node) = open
                        .pop()
                        .ok_or(InfoError::UnbalancedClose { line: line_no })?;
                    current(&mut root, &mut open).push(key, node);
                    state = LineState::Key;
                }
                Token::Word(word) => match state {
                    LineState::Key => {
                        current(&mut root, &mut open).push(word, InfoTree::new());
                        state = LineState::Value;
                    }
                    LineState::Value => {
                        if let Some(last) = current(&mut root, &mut open).last_mut() {
                            last.set_value(Some(word));
                        }
                        state = LineState::Done;
                    }
                    LineState::Done => {
                        tracing::debug!(line = line_no, token = %word, "ignoring extra token");
                    }
                },
            }
        }
    }

    if let Some((key, _)) = open.pop() {
        return Err(InfoError::UnclosedBlock { key });
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_line() {
        let tokens = tokenize_line(r#"label "Radio \"One\"" { ; trailing"#, 1).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("label".to_string()),
                Token::Word("Radio \"One\"".to_string()),
                Token::Open,
            ]
        );

        assert!(tokenize_line("   ; only a comment", 1).unwrap().is_empty());
        assert_eq!(
            tokenize_line(r#"label """#, 1).unwrap(),
            vec![Token::Word("label".to_string()), Token::Word(String::new())]
        );
    }

    #[test]
    fn test_quoted_semicolon_is_not_comment() {
        let tree = parse_document(r#"inputuri "tcp://host;port""#).unwrap();
        assert_eq!(tree.child_value("inputuri"), Some("tcp://host;port"));
    }

    #[test]
    fn test_nested_blocks() {
        let doc = "
            ; ODR-DabMux style
            general {
                dabmode 1
            }
            services
            {
                srv-fu
                {
                    id 0x8daa
                    label \"Funk\"  ; inline comment
                }
            }
        ";
        let tree = parse_document(doc).unwrap();
        assert_eq!(tree.keys(), vec!["general", "services"]);
        let srv = &tree.get_path("services/srv-fu")[0];
        assert_eq!(srv.child_value("id"), Some("0x8daa"));
        assert_eq!(srv.child_value("label"), Some("Funk"));
        assert_eq!(tree.get_path("general/dabmode")[0].value(), Some("1"));
    }

    #[test]
    fn test_key_value_and_open_on_one_line() {
        let tree = parse_document("sub value {\n child 2\n}\n").unwrap();
        let sub = tree.get("sub").unwrap();
        assert_eq!(sub.value(), Some("value"));
        assert_eq!(sub.child_value("child"), Some("2"));
    }

    #[test]
    fn test_extra_tokens_ignored() {
        let tree = parse_document("key one two three").unwrap();
        assert_eq!(tree.child_value("key"), Some("one"));
        assert_eq!(tree.keys(), vec!["key"]);
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            parse_document("{\n}"),
            Err(InfoError::UnexpectedOpen { line: 1 })
        ));
        assert!(matches!(
            parse_document("a 1\n}"),
            Err(InfoError::UnbalancedClose { line: 2 })
        ));
        assert!(matches!(
            parse_document("outer {\n inner 1\n"),
            Err(InfoError::UnclosedBlock { key }) if key == "outer"
        ));
        assert!(matches!(
            parse_document("label \"open"),
            Err(InfoError::UnterminatedString { line: 1 })
        ));
    }
}
