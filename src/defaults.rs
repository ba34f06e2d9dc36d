//! Stored command defaults: tokenizing the persisted string and merging it
//! with the arguments of the current invocation.
//!
//! Live arguments always win. Stored defaults are appended after them, and a
//! stored `--prompt` never contributes because prompts belong to a single run.

use crate::config::CliArgs;

const PROMPT_FLAG: &str = "--prompt";
const SHORT_FLAGS: [&str; 2] = ["-h", "-V"];

/// Split a persisted defaults string into shell-like tokens.
///
/// Whitespace separates tokens except inside double quotes. A backslash makes
/// the next character literal, inside quotes too. Unbalanced quotes are not an
/// error and a trailing lone backslash is kept as a literal backslash.
pub fn split_arguments(command_line: &str) -> Vec<String> {
    let mut results = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape_next = false;

    for character in command_line.chars() {
        if escape_next {
            current.push(character);
            escape_next = false;
            continue;
        }

        match character {
            '\\' => escape_next = true,
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    results.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if escape_next {
        current.push('\\');
    }

    if !current.is_empty() {
        results.push(current);
    }

    results
}

/// A token naming an option rather than a value.
pub fn is_option(token: &str) -> bool {
    token.starts_with("--")
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

/// Merge stored defaults into the live argument list.
///
/// Stored `--flag value` pairs are appended unless the same flag (compared
/// case-insensitively) was given live. Stored flags without a value, stray
/// values, and any stored `--prompt` are dropped.
pub fn merge_with_stored_defaults(args: &[String], defaults_raw: &str) -> Vec<String> {
    if defaults_raw.trim().is_empty() {
        return args.to_vec();
    }

    let default_arguments = split_arguments(defaults_raw);
    if default_arguments.is_empty() {
        return args.to_vec();
    }

    let provided_options: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|argument| is_option(argument))
        .collect();
    let is_provided = |token: &str| provided_options.iter().any(|p| eq_ignore_case(p, token));

    let mut merged_arguments = args.to_vec();
    let has_value = |index: usize| {
        default_arguments
            .get(index + 1)
            .is_some_and(|next| !is_option(next))
    };

    let mut i = 0;
    while i < default_arguments.len() {
        let token = &default_arguments[i];
        if !is_option(token) {
            i += 1;
            continue;
        }

        if eq_ignore_case(token, PROMPT_FLAG) {
            i += if has_value(i) { 2 } else { 1 };
            continue;
        }

        if !has_value(i) {
            i += 1;
            continue;
        }

        if !is_provided(token) {
            merged_arguments.push(token.clone());
            merged_arguments.push(default_arguments[i + 1].clone());
        }
        i += 2;
    }

    merged_arguments
}

/// Turn `askllm what is rust` into `askllm --prompt "what is rust"`.
///
/// Only applies when no live token is an option or a short help/version
/// flag, so words like `-1` still count as part of the prompt.
pub fn bare_prompt_args(args: &[String]) -> Vec<String> {
    let has_flag = args
        .iter()
        .any(|argument| is_option(argument) || SHORT_FLAGS.contains(&argument.as_str()));
    if args.is_empty() || has_flag {
        return args.to_vec();
    }

    vec![PROMPT_FLAG.to_string(), args.join(" ")]
}

/// Serialize the reusable options of an invocation into a defaults string.
pub fn build_defaults_string(settings: &CliArgs) -> String {
    let options = [
        ("--model", settings.model.as_deref()),
        ("--input-file", settings.input_file.as_deref()),
        ("--output-file", settings.output_file.as_deref()),
        ("--color", settings.color.as_deref()),
    ];

    options
        .into_iter()
        .filter_map(|(name, value)| {
            let value = value?.trim();
            (!value.is_empty()).then(|| format!("{} {}", name, quote(value)))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn split_empty_and_blank_input_yields_nothing() {
        assert!(split_arguments("").is_empty());
        assert!(split_arguments("   ").is_empty());
        assert!(split_arguments("\t \n").is_empty());
    }

    #[test]
    fn split_keeps_quoted_whitespace_in_one_token() {
        assert_eq!(
            split_arguments(r#"--model "gpt-4o mini" --color red"#),
            strings(&["--model", "gpt-4o mini", "--color", "red"])
        );
    }

    #[test]
    fn split_honours_escaped_space() {
        assert_eq!(split_arguments(r"a\ b"), strings(&["a b"]));
    }

    #[test]
    fn split_tolerates_unmatched_quote() {
        assert_eq!(split_arguments(r#""abc"#), strings(&["abc"]));
        assert_eq!(split_arguments(r#"x "a b"#), strings(&["x", "a b"]));
    }

    #[test]
    fn split_escapes_inside_quotes_and_keeps_trailing_backslash() {
        assert_eq!(
            split_arguments(r#""say \"hi\"" C:\\dir"#),
            strings(&[r#"say "hi""#, r"C:\dir"])
        );
        assert_eq!(split_arguments(r"abc\"), strings(&[r"abc\"]));
        assert_eq!(split_arguments(r"\"), strings(&[r"\"]));
    }

    #[test]
    fn split_drops_structural_quotes_between_words() {
        assert_eq!(split_arguments(r#"a""b"#), strings(&["ab"]));
        assert_eq!(split_arguments(r#""" x"#), strings(&["x"]));
    }

    #[test]
    fn merge_with_nothing_stored_returns_live_args() {
        assert!(merge_with_stored_defaults(&[], "").is_empty());
        let live = strings(&["--model", "m"]);
        assert_eq!(merge_with_stored_defaults(&live, "  "), live);
        assert_eq!(merge_with_stored_defaults(&live, r#""""#), live);
    }

    #[test]
    fn merge_never_takes_prompt_from_defaults() {
        let live = strings(&["--prompt", "hi"]);
        assert_eq!(
            merge_with_stored_defaults(&live, "--model gpt-4 --prompt ignored"),
            strings(&["--prompt", "hi", "--model", "gpt-4"])
        );

        let merged = merge_with_stored_defaults(&[], "--PROMPT --model gpt-4");
        assert_eq!(merged, strings(&["--model", "gpt-4"]));
    }

    #[test]
    fn merge_prefers_live_options() {
        let live = strings(&["--model", "gpt-4"]);
        assert_eq!(
            merge_with_stored_defaults(&live, "--model gpt-3.5 --color blue"),
            strings(&["--model", "gpt-4", "--color", "blue"])
        );
    }

    #[test]
    fn merge_compares_flags_case_insensitively() {
        let live = strings(&["--Model", "gpt-4"]);
        assert_eq!(
            merge_with_stored_defaults(&live, "--MODEL gpt-3.5"),
            strings(&["--Model", "gpt-4"])
        );
    }

    #[test]
    fn merge_drops_valueless_flags_and_stray_values() {
        let live = strings(&["--x"]);
        assert_eq!(merge_with_stored_defaults(&live, "--color"), live);
        assert_eq!(
            merge_with_stored_defaults(&live, "stray --store --color red tail"),
            strings(&["--x", "--color", "red"])
        );
    }

    #[test]
    fn merge_keeps_stored_order_and_quoted_values() {
        let merged = merge_with_stored_defaults(
            &strings(&["--prompt", "p"]),
            r#"--output-file "out dir/a.md" --model m"#,
        );
        assert_eq!(
            merged,
            strings(&["--prompt", "p", "--output-file", "out dir/a.md", "--model", "m"])
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let live = strings(&["--prompt", "hi", "--color", "red"]);
        let defaults = "--model gpt-4 --color blue --output-file out.txt";
        let once = merge_with_stored_defaults(&live, defaults);
        let twice = merge_with_stored_defaults(&once, defaults);
        assert_eq!(once, twice);
    }

    #[test]
    fn bare_words_become_a_prompt() {
        assert_eq!(
            bare_prompt_args(&strings(&["what", "is", "rust"])),
            strings(&["--prompt", "what is rust"])
        );
        assert!(bare_prompt_args(&[]).is_empty());
        let flagged = strings(&["-h"]);
        assert_eq!(bare_prompt_args(&flagged), flagged);
        let version = strings(&["-V"]);
        assert_eq!(bare_prompt_args(&version), version);
        let regular = strings(&["--prompt", "hi there"]);
        assert_eq!(bare_prompt_args(&regular), regular);
    }

    #[test]
    fn bare_words_may_start_with_a_dash() {
        assert_eq!(
            bare_prompt_args(&strings(&["what", "is", "-1", "squared"])),
            strings(&["--prompt", "what is -1 squared"])
        );
    }

    #[test]
    fn defaults_string_skips_prompt_and_blank_values() {
        let args = CliArgs::parse_from([
            "askllm",
            "--prompt",
            "hello",
            "--model",
            " gpt-4o ",
            "--color",
            "  ",
            "--store",
        ]);
        assert_eq!(build_defaults_string(&args), r#"--model "gpt-4o""#);
    }

    #[test]
    fn defaults_string_survives_tokenizing() {
        let args = CliArgs::parse_from([
            "askllm",
            "--model",
            "vendor/model \"x\"",
            "--output-file",
            r"C:\out dir\reply.md",
        ]);
        let stored = build_defaults_string(&args);
        assert_eq!(
            split_arguments(&stored),
            strings(&[
                "--model",
                "vendor/model \"x\"",
                "--output-file",
                r"C:\out dir\reply.md",
            ])
        );
    }
}
