//! Isolates a code payload from free-form model output.
//!
//! Models usually wrap code in explanatory prose and one or more fenced
//! blocks, sometimes restating the request in a fence of its own. Selection
//! is a best-effort heuristic over the fenced segments, not a Markdown
//! parser:
//!
//! - with a target language, the first segment whose tag names it wins;
//! - otherwise the second-to-last segment wins, which skips a trailing
//!   explanatory or unterminated fence;
//! - a lone segment is used as is.
//!
//! A selected body that is blank after trimming is a failure, never an
//! empty success.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::assist::error::ExtractionError;
use crate::assist::language::LanguageLabel;

/// Code fence delimiter.
pub const FENCE: &str = "```";

/// A fence info string: one short token without whitespace.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_+#.\-]{1,32}$").unwrap());

/// Text between an opening and a closing fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencedSegment<'a> {
    /// Language tag from the opening line, if any.
    pub tag: Option<&'a str>,
    /// Candidate code, untrimmed.
    pub body: &'a str,
}

impl<'a> FencedSegment<'a> {
    /// Splits a segment into its optional tag line and body.
    ///
    /// An opening line that is not a single short token is code, not a
    /// tag, and stays in the body. A segment without a newline is an
    /// inline fence and is all body.
    pub fn parse(content: &'a str) -> Self {
        let Some((first, rest)) = content.split_once('\n') else {
            return Self {
                tag: None,
                body: content,
            };
        };
        let info = first.trim();
        if info.is_empty() {
            Self {
                tag: None,
                body: rest,
            }
        } else if TAG_PATTERN.is_match(info) {
            Self {
                tag: Some(info),
                body: rest,
            }
        } else {
            Self {
                tag: None,
                body: content,
            }
        }
    }
}

/// How a segment was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    TagMatch,
    SecondToLast,
    Only,
}

/// Returns the fenced segments of `raw` in order.
///
/// Splitting on the fence alternates prose and fenced text; every odd piece
/// is a segment. A trailing unterminated fence yields a final segment too.
pub fn fenced_segments(raw: &str) -> Vec<FencedSegment<'_>> {
    raw.split(FENCE)
        .skip(1)
        .step_by(2)
        .map(FencedSegment::parse)
        .collect()
}

fn fallback<'s, 'a>(segments: &'s [FencedSegment<'a>]) -> Option<(&'s FencedSegment<'a>, Selection)> {
    match segments.len() {
        0 => None,
        1 => Some((&segments[0], Selection::Only)),
        n => Some((&segments[n - 2], Selection::SecondToLast)),
    }
}

/// Extracts a single code body from a model completion.
///
/// `expected` constrains the choice to a block tagged with that language,
/// falling back to the positional heuristic when no tag matches. `None` or
/// `Unknown` skip the tag scan.
pub fn extract_code(raw: &str, expected: Option<&LanguageLabel>) -> Result<String, ExtractionError> {
    if !raw.contains(FENCE) {
        debug!(raw_len = raw.len(), "No fence in model output");
        return Err(ExtractionError::NoCodeBlock);
    }

    let segments = fenced_segments(raw);

    let tagged = expected
        .filter(|label| !label.is_unknown())
        .and_then(|label| {
            segments
                .iter()
                .find(|segment| segment.tag.is_some_and(|tag| label.matches_tag(tag)))
        })
        .map(|segment| (segment, Selection::TagMatch));

    let (segment, selection) = tagged
        .or_else(|| fallback(&segments))
        .ok_or(ExtractionError::NoCodeBlock)?;

    debug!(
        segment_count = segments.len(),
        selection = ?selection,
        tag = ?segment.tag,
        "Selected fenced segment"
    );

    let code = segment.body.trim();
    if code.is_empty() {
        return Err(ExtractionError::EmptyBlock);
    }
    Ok(code.to_string())
}

/// Returns an unfenced completion as is, minus surrounding whitespace.
pub fn passthrough(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn python() -> LanguageLabel {
        LanguageLabel::new("python")
    }

    #[test]
    fn scenario_single_tagged_block() {
        let raw = "```python\ndef f(): pass\n```";
        assert_eq!(extract_code(raw, Some(&python())).unwrap(), "def f(): pass");
    }

    #[test]
    fn scenario_trailing_prose_block_is_skipped() {
        let raw = "Here is the code:\n```\nprint(1)\n```\nExplanation: ...\n```\ntext\n```";
        assert_eq!(extract_code(raw, None).unwrap(), "print(1)");
    }

    #[test]
    fn scenario_blank_block_fails() {
        let raw = "```python\n   \n\t\n```";
        assert_eq!(
            extract_code(raw, Some(&python())),
            Err(ExtractionError::EmptyBlock)
        );
        assert_eq!(extract_code("```\n\n```", None), Err(ExtractionError::EmptyBlock));
    }

    #[test]
    fn no_fence_fails() {
        assert_eq!(
            extract_code("def f(): pass", None),
            Err(ExtractionError::NoCodeBlock)
        );
        assert_eq!(
            extract_code("", Some(&python())),
            Err(ExtractionError::NoCodeBlock)
        );
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        let raw = "```JavaScript\nlet x = 1;\n```";
        let target = LanguageLabel::new("javascript");
        assert_eq!(extract_code(raw, Some(&target)).unwrap(), "let x = 1;");
    }

    #[test]
    fn first_matching_tag_wins_over_position() {
        let raw = "```python\nsource = 1\n```\nNow in Rust:\n```rust\nlet a = 1;\n```\n```rust\nlet b = 2;\n```\n```text\nnotes\n```";
        let target = LanguageLabel::new("Rust");
        assert_eq!(extract_code(raw, Some(&target)).unwrap(), "let a = 1;");
    }

    #[test]
    fn alias_tag_matches_target() {
        let raw = "Sure!\n```js\nconsole.log(1);\n```";
        let target = LanguageLabel::new("JavaScript");
        assert_eq!(extract_code(raw, Some(&target)).unwrap(), "console.log(1);");
    }

    #[test]
    fn unmatched_tags_fall_back_to_second_to_last() {
        let raw = "```go\nfmt.Println(1)\n```\n```go\nfmt.Println(2)\n```\n```text\ndone\n```";
        assert_eq!(
            extract_code(raw, Some(&python())).unwrap(),
            "fmt.Println(2)"
        );
    }

    #[test]
    fn prose_starting_with_target_name_is_not_a_match() {
        let raw = "Python is great.\n```\nx = 1\n```";
        assert_eq!(extract_code(raw, Some(&python())).unwrap(), "x = 1");
    }

    #[test]
    fn unknown_target_uses_positional_choice() {
        let raw = "```unknown\na\n```\n```\nb\n```";
        assert_eq!(
            extract_code(raw, Some(&LanguageLabel::Unknown)).unwrap(),
            "a"
        );
    }

    #[test]
    fn unterminated_trailing_fence_is_skipped() {
        let raw = "```rust\nfn main() {}\n```\nand then ```";
        assert_eq!(extract_code(raw, None).unwrap(), "fn main() {}");
    }

    #[test]
    fn lone_unterminated_fence_is_used() {
        let raw = "Here you go: ```python\nprint('cut off')";
        assert_eq!(extract_code(raw, None).unwrap(), "print('cut off')");
    }

    #[test]
    fn opening_line_with_code_stays_in_body() {
        let raw = "```def f():\n    return 1\n```";
        assert_eq!(extract_code(raw, None).unwrap(), "def f():\n    return 1");
    }

    #[test]
    fn inline_fence_is_all_body() {
        let segments = fenced_segments("run ```ls -la``` now");
        assert_eq!(
            segments,
            vec![FencedSegment {
                tag: None,
                body: "ls -la"
            }]
        );
    }

    #[test]
    fn crlf_opening_line_is_tag() {
        let segment = FencedSegment::parse("python\r\nx = 1\r\n");
        assert_eq!(segment.tag, Some("python"));
        assert_eq!(segment.body, "x = 1\r\n");
    }

    #[test]
    fn segments_alternate_with_prose() {
        let segments = fenced_segments("a```x\n1```b```\n2```c");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].tag, Some("x"));
        assert_eq!(segments[1].tag, None);
        assert_eq!(segments[1].body, "2");
    }

    #[test]
    fn passthrough_trims_only() {
        assert_eq!(
            passthrough("\n  This adds two numbers.\n\n```\nnot extracted\n```  \n"),
            "This adds two numbers.\n\n```\nnot extracted\n```"
        );
    }

    fn arb_body() -> impl Strategy<Value = String> {
        "[a-z0-9 =();:\\n]{0,40}"
    }

    fn arb_prose() -> impl Strategy<Value = String> {
        "[A-Za-z .,:\\n]{0,30}"
    }

    fn arb_other_tag() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("text"), Just("json"), Just("rust"), Just("go"), Just("")]
    }

    fn fenced(tag: &str, body: &str) -> String {
        format!("{FENCE}{tag}\n{body}\n{FENCE}")
    }

    proptest! {
        #[test]
        fn text_without_fences_never_extracts(raw in "[^`]{0,200}") {
            prop_assert_eq!(extract_code(&raw, None), Err(ExtractionError::NoCodeBlock));
            prop_assert_eq!(
                extract_code(&raw, Some(&python())),
                Err(ExtractionError::NoCodeBlock)
            );
            prop_assert_eq!(passthrough(&raw), raw.trim());
        }

        #[test]
        fn single_matching_block_yields_trimmed_body(
            before in arb_prose(),
            after in arb_prose(),
            body in arb_body(),
            tag in prop_oneof![Just("python"), Just("Python"), Just("PYTHON"), Just("py")],
        ) {
            let raw = format!("{before}{}{after}", fenced(tag, &body));
            let result = extract_code(&raw, Some(&python()));
            if body.trim().is_empty() {
                prop_assert_eq!(result, Err(ExtractionError::EmptyBlock));
            } else {
                prop_assert_eq!(result, Ok(body.trim().to_string()));
            }
        }

        #[test]
        fn unmatched_blocks_fall_back_to_second_to_last(
            blocks in proptest::collection::vec((arb_other_tag(), arb_body(), arb_prose()), 2..6),
        ) {
            let raw: String = blocks
                .iter()
                .map(|(tag, body, prose)| format!("{}{prose}", fenced(tag, body)))
                .collect();
            let expected_body = blocks[blocks.len() - 2].1.trim();
            let result = extract_code(&raw, Some(&python()));
            if expected_body.is_empty() {
                prop_assert_eq!(result, Err(ExtractionError::EmptyBlock));
            } else {
                prop_assert_eq!(result, Ok(expected_body.to_string()));
            }
        }

        #[test]
        fn rewrapped_output_extracts_unchanged(
            blocks in proptest::collection::vec((arb_other_tag(), arb_body(), arb_prose()), 1..5),
            target in prop_oneof![Just("python"), Just("rust"), Just("go")],
        ) {
            let raw: String = blocks
                .iter()
                .map(|(tag, body, prose)| format!("{prose}{}", fenced(tag, body)))
                .collect();
            let label = LanguageLabel::new(target);
            if let Ok(code) = extract_code(&raw, Some(&label)) {
                let rewrapped = fenced(target, &code);
                prop_assert_eq!(extract_code(&rewrapped, Some(&label)), Ok(code));
            }
        }

        #[test]
        fn success_is_never_blank(raw in "[a-z `\\n]{0,80}") {
            if let Ok(code) = extract_code(&raw, None) {
                prop_assert!(!code.is_empty());
                prop_assert_eq!(code.trim(), code.as_str());
            }
        }
    }
}
