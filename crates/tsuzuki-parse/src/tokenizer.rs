/// Token types produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Text enclosed in brackets: `[SubGroup]`, `(720p)`.
    Bracketed,
    /// A word between delimiters, or a dash.
    FreeText,
    /// A run of soft delimiters (space, underscore, dot), collapsed to one space.
    Delimiter,
}

/// A single token from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Whether this token was inside a bracket pair.
    pub is_enclosed: bool,
}

impl Token {
    fn bracketed(text: String) -> Self {
        Self {
            kind: TokenKind::Bracketed,
            text,
            is_enclosed: true,
        }
    }

    fn free(text: String) -> Self {
        Self {
            kind: TokenKind::FreeText,
            text,
            is_enclosed: false,
        }
    }

    fn delimiter() -> Self {
        Self {
            kind: TokenKind::Delimiter,
            text: " ".into(),
            is_enclosed: false,
        }
    }

    /// A dash separator (`-`, `–`, `—` all normalize to `-`).
    pub fn is_dash(&self) -> bool {
        self.kind == TokenKind::FreeText && self.text == "-"
    }

    /// A free-text or bracketed token carrying actual content.
    pub fn is_word(&self) -> bool {
        self.kind != TokenKind::Delimiter && !self.is_dash()
    }
}

/// Opening/closing bracket pairs, including CJK brackets.
const BRACKETS: &[(char, char)] = &[
    ('[', ']'),
    ('(', ')'),
    ('{', '}'),
    ('\u{300C}', '\u{300D}'), // 「」
    ('\u{300E}', '\u{300F}'), // 『』
    ('\u{3010}', '\u{3011}'), // 【】
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "ogm", "wmv", "mpg", "flv", "webm", "m4v", "ts", "mov", "3gp", "rm",
    "rmvb", "m2ts",
];

fn is_soft_delimiter(c: char) -> bool {
    matches!(c, ' ' | '_' | '.' | '\u{3000}')
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2013}' | '\u{2014}')
}

/// A hyphen joining two letters ("Kaguya-sama") belongs to the word.
fn is_word_hyphen(chars: &[char], i: usize) -> bool {
    i > 0
        && i + 1 < chars.len()
        && chars[i - 1].is_alphabetic()
        && chars[i + 1].is_alphabetic()
}

fn closing_bracket(c: char) -> Option<char> {
    BRACKETS
        .iter()
        .find(|(open, _)| *open == c)
        .map(|(_, close)| *close)
}

/// Tokenize an anime filename.
///
/// Returns the tokens and the video file extension, if one was stripped.
/// Dashes are emitted as `FreeText("-")` so the parser can spot `Title - 05`,
/// except hyphens inside a word.
/// A dot between two digits (`07.5`, `5.1`) stays inside the token.
pub fn tokenize(input: &str) -> (Vec<Token>, Option<String>) {
    let (input, extension) = strip_extension(input);
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(close) = closing_bracket(c) {
            let start = i + 1;
            let end = chars[start..]
                .iter()
                .position(|&ch| ch == close)
                .map_or(chars.len(), |offset| start + offset);
            let text: String = chars[start..end].iter().collect();
            let text = text.trim().to_string();
            if !text.is_empty() {
                tokens.push(Token::bracketed(text));
            }
            i = (end + 1).min(chars.len());
            continue;
        }

        if is_dash(c) {
            tokens.push(Token::free("-".into()));
            i += 1;
            while i < chars.len() && is_soft_delimiter(chars[i]) {
                i += 1;
            }
            continue;
        }

        if is_soft_delimiter(c) {
            while i < chars.len() && is_soft_delimiter(chars[i]) {
                i += 1;
            }
            tokens.push(Token::delimiter());
            continue;
        }

        let start = i;
        while i < chars.len() && closing_bracket(chars[i]).is_none() {
            if is_dash(chars[i]) && !is_word_hyphen(&chars, i) {
                break;
            }
            if is_soft_delimiter(chars[i]) {
                let digit_dot = chars[i] == '.'
                    && i > start
                    && i + 1 < chars.len()
                    && chars[i - 1].is_ascii_digit()
                    && chars[i + 1].is_ascii_digit();
                if !digit_dot {
                    break;
                }
            }
            i += 1;
        }
        let text: String = chars[start..i].iter().collect();
        if !text.is_empty() {
            tokens.push(Token::free(text));
        }
    }

    (tokens, extension)
}

/// Strip a known video extension (case-insensitive), returning it lowercased.
fn strip_extension(input: &str) -> (&str, Option<String>) {
    let Some((stem, ext)) = input.rsplit_once('.') else {
        return (input, None);
    };
    let ext = ext.to_ascii_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        (stem, Some(ext))
    } else {
        (input, None)
    }
}
