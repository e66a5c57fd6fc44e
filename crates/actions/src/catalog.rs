use deskpilot_registry::ActionDescriptor;

/// The built-in automation actions, in the order they are indexed.
///
/// Descriptions double as the embedding corpus, so they are phrased the
/// way a user would ask for the action rather than as implementation
/// notes.
#[must_use]
pub fn builtin_catalog() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::new(
            "open_chrome",
            "Launches the Google Chrome web browser to a default page",
        ),
        ActionDescriptor::new("open_calculator", "Starts the system calculator application"),
        ActionDescriptor::new("open_notepad", "Opens the Notepad text editor"),
        ActionDescriptor::new(
            "get_cpu_usage",
            "Measures and displays the current CPU utilization percentage",
        ),
        ActionDescriptor::new(
            "get_ram_usage",
            "Measures and displays the current RAM utilization percentage",
        ),
        ActionDescriptor::new(
            "run_shell_command",
            "Executes a specified command in the system shell and displays output",
        )
        .with_params(vec!["command".to_string()]),
        ActionDescriptor::new("create_text_file", "Generates a new text file with a given name")
            .with_params(vec!["filename".to_string()]),
    ]
}
