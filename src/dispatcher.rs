//! Script dispatcher: splits a submitted script into lines, routes each
//! line's first token to a command handler, and accumulates the
//! per-line result text. Generalizes the teacher's "route argv[0] to a
//! handler" shape to "route the first token of a script line".

use crate::commands;
use crate::context::Context;

/// Runs every line of `script` against `ctx` in order and returns the
/// concatenated output. A failing line never aborts the remaining
/// lines — each is independent.
pub fn run_script(ctx: &mut Context, script: &str) -> String {
    let mut out = String::new();
    for (i, raw_line) in script.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let n = i + 1;
        let (keyword, raw_args) = match line.split_once(char::is_whitespace) {
            Some((k, rest)) => (k, rest.trim_start()),
            None => (line, ""),
        };
        let keyword = keyword.to_lowercase();

        let message = match commands::dispatch(&keyword, ctx, raw_args) {
            Ok(msg) => {
                tracing::info!(line = n, verb = %keyword, "command succeeded");
                msg
            }
            Err(err) => {
                tracing::info!(line = n, verb = %keyword, error = %err, "command failed");
                err.to_string()
            }
        };
        out.push_str(&format!("Resultado línea {n} — {message}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let mut ctx = Context::new();
        let out = run_script(&mut ctx, "\n# comment\n   \n");
        assert_eq!(out, "");
    }

    #[test]
    fn unknown_verb_reports_friendly_error() {
        let mut ctx = Context::new();
        let out = run_script(&mut ctx, "bogus -x=1");
        assert!(out.starts_with("Resultado línea 1 — "));
        assert!(out.contains("Error"));
    }

    #[test]
    fn line_numbers_count_blank_lines() {
        let mut ctx = Context::new();
        let out = run_script(&mut ctx, "\nbogus -x=1");
        assert!(out.starts_with("Resultado línea 2 — "));
    }
}
