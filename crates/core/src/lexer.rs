//! Pass 0 (first half): pull documentation comments out of source text and
//! classify each comment line for the scanner.

const BEGIN: &str = "/*!";
const END: &str = "*/";

/// One line of extracted comment text with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub text: String,
    pub line: u32,
}

/// Keep only the text between `/*!` and `*/` delimiters.
///
/// The remainder of the opening line and the part of the closing line before
/// `*/` are kept. All blocks are concatenated into one flat sequence.
pub fn extract_comments(src: &str) -> Vec<Spanned> {
    let mut out = Vec::new();
    let mut saving = false;
    for (idx, raw) in src.lines().enumerate() {
        let line = idx as u32 + 1;
        if !saving {
            let trimmed = raw.trim();
            if let Some(rest) = trimmed.strip_prefix(BEGIN) {
                match rest.split_once(END) {
                    Some((inside, _)) => out.push(Spanned {
                        text: inside.to_owned(),
                        line,
                    }),
                    None => {
                        saving = true;
                        out.push(Spanned {
                            text: rest.to_owned(),
                            line,
                        });
                    }
                }
            }
        } else if let Some((inside, _)) = raw.split_once(END) {
            out.push(Spanned {
                text: inside.to_owned(),
                line,
            });
            saving = false;
        } else {
            out.push(Spanned {
                text: raw.to_owned(),
                line,
            });
        }
    }
    out
}

/// Wrap already-extracted comment lines, numbering them from 1.
pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Vec<Spanned> {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| Spanned {
            text: l.as_ref().to_owned(),
            line: i as u32 + 1,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    OneOf,
    Or,
    End,
    If,
    Then,
    Else,
    Evaluators,
    Keys,
    Includes,
    Dependencies,
}

impl Keyword {
    fn spellings(self) -> &'static [&'static str] {
        match self {
            Keyword::OneOf => &["ONE OF"],
            Keyword::Or => &["OR"],
            Keyword::End => &["END"],
            Keyword::If => &["IF"],
            Keyword::Then => &["THEN"],
            Keyword::Else => &["ELSE"],
            Keyword::Evaluators => &["EVALUATORS", "EVALUATOR"],
            Keyword::Keys => &["KEYS"],
            Keyword::Includes => &["INCLUDES"],
            Keyword::Dependencies => &["DEPENDENCIES"],
        }
    }

    const ALL: [Keyword; 10] = [
        Keyword::OneOf,
        Keyword::Or,
        Keyword::End,
        Keyword::If,
        Keyword::Then,
        Keyword::Else,
        Keyword::Evaluators,
        Keyword::Keys,
        Keyword::Includes,
        Keyword::Dependencies,
    ];

    pub fn as_str(self) -> &'static str {
        self.spellings()[0]
    }
}

/// What a stripped comment line means to the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Blank,
    /// `* ...` parameter declaration start.
    Param,
    /// `- ...` list item.
    Item,
    Keyword(Keyword),
    /// ``` ``[name]`` ``` or `.. admonition:: name`.
    Header(String),
    Prose,
}

impl LineKind {
    /// Lines the scanner stops at; everything else is skipped as prose.
    pub fn is_marker(&self) -> bool {
        !matches!(self, LineKind::Blank | LineKind::Prose)
    }
}

pub fn classify(text: &str) -> LineKind {
    let line = text.trim();
    if line.is_empty() {
        return LineKind::Blank;
    }
    if let Some(rest) = line.strip_prefix("``[") {
        let name = rest.split("]``").next().unwrap_or(rest);
        return LineKind::Header(name.trim().to_owned());
    }
    if let Some(rest) = line.strip_prefix(".. admonition::") {
        return LineKind::Header(rest.trim().trim_matches(':').trim().to_owned());
    }
    if line.starts_with('*') && !line.starts_with("**") {
        return LineKind::Param;
    }
    if line == "-" || line.starts_with("- ") {
        return LineKind::Item;
    }
    for kw in Keyword::ALL {
        if kw.spellings().iter().any(|s| keyword_matches(line, s)) {
            return LineKind::Keyword(kw);
        }
    }
    LineKind::Prose
}

fn keyword_matches(line: &str, word: &str) -> bool {
    match line.strip_prefix(word) {
        Some(rest) => rest.is_empty() || rest.starts_with(':') || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_block() {
        let lines = extract_comments("\n\n/*!\nabc\n*/\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].text, "abc");
        assert_eq!(lines[1].line, 4);
    }

    #[test]
    fn keeps_partial_lines_and_concatenates_blocks() {
        let src = "int x;\n  /*! first\nmiddle\nlast */ int y;\n/*! second\n*/\ncode();\n";
        let texts: Vec<String> = extract_comments(src).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec![" first", "middle", "last ", " second", ""]);
    }

    #[test]
    fn single_line_block_closes_itself() {
        let texts: Vec<String> = extract_comments("/*! one-liner */\nint z;\n")
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(texts, vec![" one-liner "]);
    }

    #[test]
    fn plain_block_comments_are_ignored() {
        assert!(extract_comments("/* not docs */\n/** nor this */\n").is_empty());
    }

    #[test]
    fn classifies_markers() {
        assert_eq!(classify("  * `\"x`\" ``[double]``"), LineKind::Param);
        assert_eq!(classify("**bold** prose"), LineKind::Prose);
        assert_eq!(classify("- `\"temperature`\""), LineKind::Item);
        assert_eq!(classify("------"), LineKind::Prose);
        assert_eq!(classify("ONE OF"), LineKind::Keyword(Keyword::OneOf));
        assert_eq!(classify("EVALUATORS:"), LineKind::Keyword(Keyword::Evaluators));
        assert_eq!(classify("EVALUATOR"), LineKind::Keyword(Keyword::Evaluators));
        assert_eq!(classify("ORDER of operations"), LineKind::Prose);
        assert_eq!(classify("``[my-spec]``"), LineKind::Header("my-spec".into()));
        assert_eq!(
            classify(".. admonition:: pk-spec:"),
            LineKind::Header("pk-spec".into())
        );
        assert_eq!(classify("   "), LineKind::Blank);
    }
}
