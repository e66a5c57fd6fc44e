//! # DeskPilot Codegen
//!
//! Renders a resolved action into a runnable shell script.
//!
//! The server never executes actions itself; it hands the caller a script
//! that invokes `deskpilot run` and reports success or failure, so the
//! user sees exactly what will run before running it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodegenError>;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Cannot quote value for the shell: {0}")]
    Quote(#[from] shlex::QuoteError),
}

/// Renders the execution script for an action and its inferred arguments.
///
/// Every interpolated value goes through shell quoting, including the
/// action name, since registered names arrive over the API.
pub fn render_script(action: &str, params: &[String]) -> Result<String> {
    let mut invocation = format!("deskpilot run {}", shlex::try_quote(action)?);
    if !params.is_empty() {
        invocation.push_str(" --");
        for param in params {
            invocation.push(' ');
            invocation.push_str(&shlex::try_quote(param)?);
        }
    }

    let success_message = format!("{action} executed successfully.");
    let error_message = format!("Error executing {action}.");
    let success = shlex::try_quote(&success_message)?;
    let error = shlex::try_quote(&error_message)?;

    Ok(format!(
        "#!/bin/sh\n# deskpilot generated action script\nif {invocation}; then\n    echo {success}\nelse\n    echo {error} >&2\nfi\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn script_without_params_has_no_separator() {
        let script = render_script("open_chrome", &[]).unwrap();
        assert_eq!(
            script,
            "#!/bin/sh\n\
             # deskpilot generated action script\n\
             if deskpilot run open_chrome; then\n    \
             echo 'open_chrome executed successfully.'\n\
             else\n    \
             echo 'Error executing open_chrome.' >&2\n\
             fi\n"
        );
    }

    #[test]
    fn params_are_quoted_after_a_separator() {
        let script =
            render_script("run_shell_command", &["echo $HOME && ls".to_string()]).unwrap();
        assert!(script.contains("deskpilot run run_shell_command -- 'echo $HOME && ls'"));
    }

    #[test]
    fn plain_params_stay_readable() {
        let script = render_script("create_text_file", &["example.txt".to_string()]).unwrap();
        assert!(script.contains("deskpilot run create_text_file -- example.txt"));
    }

    #[test]
    fn hostile_action_names_cannot_break_out() {
        let script = render_script("rm -rf; open_chrome", &[]).unwrap();
        assert!(script.contains("deskpilot run 'rm -rf; open_chrome'"));
    }
}
