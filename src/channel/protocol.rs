//! Outbound wire format: the s-expression commands understood by the
//! editor-side bootstrap.
//!
//! Every function returns one complete command string ready to be written
//! to the channel. Caller-supplied text is escaped before it is embedded
//! in a string literal, so buffer names and payloads may contain quotes
//! and backslashes.

/// Escape `text` for embedding in a double-quoted s-expression literal.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

/// Open `name` under `dir` at `line` (1-based) and `col`. The mode string
/// `"disabled"` tells the editor to mark the buffer read-only.
pub fn visit(dir: &str, name: &str, line: u32, col: u32, mode: &str) -> String {
    format!(
        "(embridge-visit {} {} {line} {col} {})",
        quoted(dir),
        quoted(name),
        quoted(mode)
    )
}

pub fn append_to_buffer(name: &str, text: &str) -> String {
    format!(
        "(embridge-append-to-buffer {} {})",
        quoted(name),
        quoted(text)
    )
}

pub fn clear_buffer(name: &str) -> String {
    format!("(embridge-clear-buffer {})", quoted(name))
}

pub fn kill_buffer(name: &str) -> String {
    format!("(embridge-kill-buffer {})", quoted(name))
}

pub fn compilation_buffer(name: &str) -> String {
    format!("(embridge-compilation-buffer {})", quoted(name))
}

/// Mark `files` as the project file set rooted at `root`.
pub fn project_files(root: &str, files: &[String]) -> String {
    let mut out = format!("(embridge-project-files {} '(", quoted(root));
    for file in files {
        out.push(' ');
        out.push_str(&quoted(file));
    }
    out.push_str("))");
    out
}

pub fn save_buffers_kill() -> String {
    "(save-buffers-kill-emacs)".to_string()
}

/// Append `content` to `name` in one shot, creating the buffer if needed.
pub fn fill_buffer(name: &str, content: &str) -> String {
    format!(
        "(save-excursion (with-current-buffer (get-buffer-create {}) \
         (goto-char (point-max)) (insert {})))",
        quoted(name),
        quoted(content)
    )
}

/// The connect-back call evaluated by the spawned editor.
pub fn startup(app: &str, host: &str, port: u16) -> String {
    format!("(embridge-startup {} {} {port})", quoted(app), quoted(host))
}

/// Full one-shot bootstrap expression handed to the editor on its command
/// line: the bootstrap prelude followed by the connect-back call.
pub fn bootstrap(prelude: &str, app: &str, host: &str, port: u16) -> String {
    format!("(progn {} {})", prelude.trim(), startup(app, host, port))
}

/// Prelude that loads the bridge library from `dir` instead of carrying
/// the code inline.
pub fn load_path_prelude(dir: &str) -> String {
    format!(
        "(add-to-list 'load-path {}) (require 'embridge)",
        quoted(dir)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_leaves_plain_text_alone() {
        assert_eq!(escape("hello world"), "hello world");
    }

    #[test]
    fn escape_handles_quotes_and_backslashes() {
        assert_eq!(escape(r#"a "b" c\d"#), r#"a \"b\" c\\d"#);
    }

    #[test]
    fn visit_command_shape() {
        assert_eq!(
            visit("/home/user/src", "main.rs", 12, 4, "disabled"),
            r#"(embridge-visit "/home/user/src" "main.rs" 12 4 "disabled")"#
        );
    }

    #[test]
    fn append_command_escapes_payload() {
        assert_eq!(
            append_to_buffer("*log*", r#"said "hi""#),
            r#"(embridge-append-to-buffer "*log*" "said \"hi\"")"#
        );
    }

    #[test]
    fn buffer_commands_name_the_buffer() {
        assert_eq!(
            clear_buffer("*out*"),
            r#"(embridge-clear-buffer "*out*")"#
        );
        assert_eq!(kill_buffer("*out*"), r#"(embridge-kill-buffer "*out*")"#);
        assert_eq!(
            compilation_buffer("*build*"),
            r#"(embridge-compilation-buffer "*build*")"#
        );
    }

    #[test]
    fn project_files_lists_every_path() {
        let files = vec!["/p/a.rs".to_string(), "/p/b.rs".to_string()];
        assert_eq!(
            project_files("/p", &files),
            r#"(embridge-project-files "/p" '( "/p/a.rs" "/p/b.rs"))"#
        );
    }

    #[test]
    fn project_files_with_no_files_is_an_empty_list() {
        assert_eq!(
            project_files("/p", &[]),
            r#"(embridge-project-files "/p" '())"#
        );
    }

    #[test]
    fn fill_buffer_wraps_content_in_a_single_form() {
        let cmd = fill_buffer("*test*", "foobar");
        assert!(cmd.starts_with("(save-excursion"));
        assert!(cmd.contains(r#"(get-buffer-create "*test*")"#));
        assert!(cmd.contains(r#"(insert "foobar")"#));
        assert!(cmd.ends_with(")))"));
    }

    #[test]
    fn bootstrap_embeds_identity() {
        let cmd = bootstrap("(ignore)", "MyApp", "127.0.0.1", 4464);
        assert_eq!(
            cmd,
            r#"(progn (ignore) (embridge-startup "MyApp" "127.0.0.1" 4464))"#
        );
    }

    #[test]
    fn load_path_prelude_requires_the_library() {
        assert_eq!(
            load_path_prelude("/usr/share/embridge"),
            r#"(add-to-list 'load-path "/usr/share/embridge") (require 'embridge)"#
        );
    }
}
