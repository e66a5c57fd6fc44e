//! Parameter inference for resolved actions.
//!
//! Rules are declared per action and evaluated in order; the first rule
//! that fires supplies the argument list. Actions without declared
//! parameters never get arguments, whatever the prompt says.

use crate::history::ConversationHistory;
use deskpilot_registry::ActionDescriptor;

const DEFAULT_LIST_COMMAND: &str = if cfg!(windows) { "dir" } else { "ls" };

#[derive(Clone, Copy)]
enum Rule {
    /// Fixed value supplied when the prompt mentions the trigger word.
    TriggeredValue {
        trigger: &'static str,
        value: &'static str,
    },
    /// Token repeated verbatim when it appears in the prompt, or failing
    /// that in the previous prompt.
    CarriedToken { token: &'static str },
}

fn rules_for(name: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    if name == "create_text_file" {
        rules.push(Rule::TriggeredValue {
            trigger: "file",
            value: "example.txt",
        });
    }
    if name == "run_shell_command" {
        rules.push(Rule::TriggeredValue {
            trigger: "command",
            value: DEFAULT_LIST_COMMAND,
        });
    }
    if name.contains("say_hello") {
        rules.push(Rule::CarriedToken { token: "world" });
    }
    rules
}

/// Infers argument values for a resolved action from the prompt and, for
/// carried tokens, the previous prompt. Returns `None` when the action
/// takes no parameters or no rule fires.
#[must_use]
pub fn infer_params(
    descriptor: &ActionDescriptor,
    prompt: &str,
    history: &ConversationHistory,
) -> Option<Vec<String>> {
    let declared = descriptor.params.as_ref()?;
    if declared.is_empty() {
        return None;
    }

    let prompt_lower = prompt.to_lowercase();
    for rule in rules_for(&descriptor.name) {
        match rule {
            Rule::TriggeredValue { trigger, value } => {
                if prompt_lower.contains(trigger) {
                    return Some(vec![value.to_string()]);
                }
            }
            Rule::CarriedToken { token } => {
                if prompt_lower.contains(token) {
                    return Some(vec![token.to_string()]);
                }
                if let Some(last) = history.last() {
                    if last.prompt.to_lowercase().contains(token) {
                        return Some(vec![token.to_string()]);
                    }
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shell_action() -> ActionDescriptor {
        ActionDescriptor::new("run_shell_command", "Executes a shell command")
            .with_params(vec!["command".to_string()])
    }

    #[test]
    fn shell_command_gets_a_listing_default() {
        let history = ConversationHistory::new();
        let params = infer_params(&shell_action(), "Run a shell command", &history);
        assert_eq!(params, Some(vec![DEFAULT_LIST_COMMAND.to_string()]));
    }

    #[test]
    fn file_creation_gets_a_sample_name() {
        let descriptor = ActionDescriptor::new("create_text_file", "Creates a new text file")
            .with_params(vec!["filename".to_string()]);
        let history = ConversationHistory::new();
        let params = infer_params(&descriptor, "Create a text file for me", &history);
        assert_eq!(params, Some(vec!["example.txt".to_string()]));
    }

    #[test]
    fn greeting_token_carries_over_from_history() {
        let descriptor = ActionDescriptor::new("say_hello", "Greets the given name")
            .with_params(vec!["name".to_string()]);

        let history = ConversationHistory::new();
        assert_eq!(
            infer_params(&descriptor, "Say hello to the world", &history),
            Some(vec!["world".to_string()])
        );

        let mut history = ConversationHistory::new();
        history.push("Say hello to the world");
        assert_eq!(
            infer_params(&descriptor, "Say it again", &history),
            Some(vec!["world".to_string()])
        );
    }

    #[test]
    fn actions_without_declared_params_get_none() {
        let descriptor = ActionDescriptor::new("open_chrome", "Opens the Chrome browser");
        let history = ConversationHistory::new();
        assert_eq!(
            infer_params(&descriptor, "open a file with chrome", &history),
            None
        );
    }

    #[test]
    fn unmatched_rules_yield_none() {
        let history = ConversationHistory::new();
        assert_eq!(infer_params(&shell_action(), "Do the thing", &history), None);
    }

    #[test]
    fn rules_do_not_cross_actions() {
        // A prompt mentioning "file" must not feed a filename to the shell
        // runner.
        let history = ConversationHistory::new();
        let params = infer_params(&shell_action(), "Run a command on that file", &history);
        assert_eq!(params, Some(vec![DEFAULT_LIST_COMMAND.to_string()]));
    }
}
