//! Prompt templates for explanation, generation and translation.
//!
//! Every builder is a pure function of its inputs. The few-shot examples are
//! baked into the template text so the same request always renders the same
//! prompt.

use crate::assist::language::LanguageLabel;

/// Worked examples shown before every generation request.
const GENERATION_EXAMPLES: &str = r#"### Examples:
**Description**: Create a Python function to check if a number is even.
**Python Code**:
```python
def is_even(n):
    return n % 2 == 0
```

**Description**: Create a JavaScript function to reverse a string.
**JavaScript Code**:
```javascript
function reverseString(str) {
    return str.split("").reverse().join("");
}
```"#;

/// Worked examples shown before every translation request.
const TRANSLATION_EXAMPLES: &str = r#"Here are some examples of how to translate code from one language to another:

**Python to JavaScript Example:**
**Python Code**:
```python
def add(a, b):
    return a + b
```
**JavaScript Code**:
```javascript
function add(a, b) {
    return a + b;
}
```

**JavaScript to Python Example:**
**JavaScript Code**:
```javascript
function multiply(a, b) {
    return a * b;
}
```
**Python Code**:
```python
def multiply(a, b):
    return a * b
```"#;

/// Fence info string for a language name: lowercase, no surrounding space.
pub fn fence_tag(language: &str) -> String {
    language.trim().to_lowercase()
}

fn label_tag(language: &LanguageLabel) -> String {
    match language {
        LanguageLabel::Known(name) => fence_tag(name),
        LanguageLabel::Unknown => String::new(),
    }
}

/// Builds the prompt asking for a concise explanation of `code`.
pub fn explanation_prompt(language: &LanguageLabel, code: &str) -> String {
    format!(
        "Role: You are an expert software engineer.
Context: The user provided a {language} code snippet.
Task: Explain what this code does in a simple, easy-to-understand way.
Limitation: Keep the explanation concise.
Audience: Developers of all levels.

Code:
```{tag}
{code}
```

Explanation:
",
        tag = label_tag(language),
    )
}

/// Builds the prompt asking for a `language` snippet matching `description`.
pub fn generation_prompt(language: &str, description: &str) -> String {
    let language = language.trim();
    format!(
        "Role: You are an expert {language} programmer.
Context: The user wants a {language} code snippet for the following functionality.
Task: Generate a {language} code snippet that matches the user's request.
Limitation: Provide only the code in a single fenced block, no extra text.
Audience: Developers.

{GENERATION_EXAMPLES}

### Now generate code for:
{description}
"
    )
}

/// Builds the prompt asking to port `code` from `source` to `target`.
pub fn translation_prompt(source: &LanguageLabel, target: &str, code: &str) -> String {
    let target = target.trim();
    format!(
        "You are a programming language translator.

{TRANSLATION_EXAMPLES}

Now, please translate the following:

**Source Language**: {source}
**Target Language**: {target}

**Code to Translate**:
```{source_tag}
{code}
```

**{target} Code (ONLY return the translated code in a single ```{target_tag} fenced block, no extra text)**:
",
        source_tag = label_tag(source),
        target_tag = fence_tag(target),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn explanation_embeds_language_and_code() {
        let code = "fn main() {\n    println!(\"hi\");\n}";
        let prompt = explanation_prompt(&LanguageLabel::new("Rust"), code);
        assert!(prompt.contains("The user provided a Rust code snippet."));
        assert!(prompt.contains(&format!("```rust\n{code}\n```")));
        assert!(prompt.trim_end().ends_with("Explanation:"));
    }

    #[test]
    fn explanation_with_unknown_language_has_bare_fence() {
        let prompt = explanation_prompt(&LanguageLabel::Unknown, "x");
        assert!(prompt.contains("a Unknown code snippet"));
        assert!(prompt.contains("```\nx\n```"));
    }

    #[test]
    fn generation_includes_examples_and_request() {
        let prompt = generation_prompt(" Go ", "Read a file line by line");
        assert!(prompt.contains("You are an expert Go programmer."));
        assert!(prompt.contains("def is_even(n):"));
        assert!(prompt.contains("function reverseString(str) {"));
        assert!(prompt.ends_with("### Now generate code for:\nRead a file line by line\n"));
    }

    #[test]
    fn translation_includes_both_directions() {
        let prompt = translation_prompt(&LanguageLabel::new("Python"), "JavaScript", "print(1)");
        assert!(prompt.contains("**Python to JavaScript Example:**"));
        assert!(prompt.contains("**JavaScript to Python Example:**"));
        assert!(prompt.contains("**Source Language**: Python"));
        assert!(prompt.contains("**Target Language**: JavaScript"));
        assert!(prompt.contains("```python\nprint(1)\n```"));
        assert!(prompt.contains("single ```javascript fenced block"));
    }

    #[test]
    fn examples_use_single_braces() {
        assert!(!GENERATION_EXAMPLES.contains("{{"));
        assert!(!TRANSLATION_EXAMPLES.contains("{{"));
    }

    #[test]
    fn builders_are_deterministic() {
        let label = LanguageLabel::new("C++");
        assert_eq!(
            translation_prompt(&label, "Rust", "int x;"),
            translation_prompt(&label, "Rust", "int x;")
        );
        assert_eq!(generation_prompt("Rust", "a"), generation_prompt("Rust", "a"));
        assert_eq!(explanation_prompt(&label, "a"), explanation_prompt(&label, "a"));
    }

    #[test]
    fn fence_tag_normalises() {
        assert_eq!(fence_tag(" JavaScript "), "javascript");
        assert_eq!(fence_tag("C++"), "c++");
    }
}
