use crate::catalog::builtin_catalog;
use crate::error::{ActionError, Result};
use std::fs;
use std::path::Path;
use std::process::Command;
use sysinfo::System;

/// What an executed action produced. `output` is the line worth showing
/// to the user; launch-style actions have nothing to say on success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionReport {
    pub action: String,
    pub output: Option<String>,
}

/// Executes a built-in action by name.
///
/// Arity is checked against the catalog before anything runs. Launches
/// are fire-and-forget; monitors and the shell runner report a line of
/// output.
pub fn run_action(name: &str, args: &[String]) -> Result<ActionReport> {
    let catalog = builtin_catalog();
    let Some(descriptor) = catalog.iter().find(|d| d.name == name) else {
        return Err(ActionError::UnknownAction(name.to_string()));
    };

    let expected = descriptor.arity();
    if args.len() != expected {
        return Err(ActionError::WrongArity {
            action: name.to_string(),
            expected,
            given: args.len(),
        });
    }

    log::info!("Running action '{name}'");
    let output = match name {
        "open_chrome" => {
            open_url("https://www.google.com")?;
            None
        }
        "open_calculator" => {
            launch_app(if cfg!(windows) { "calc" } else { "gnome-calculator" })?;
            None
        }
        "open_notepad" => {
            launch_app(if cfg!(windows) { "notepad" } else { "gedit" })?;
            None
        }
        "get_cpu_usage" => Some(format!("CPU Usage: {:.1}%", cpu_usage_percent())),
        "get_ram_usage" => Some(format!("RAM Usage: {:.1}%", ram_usage_percent())),
        "run_shell_command" => Some(shell_capture(&args[0])?),
        "create_text_file" => {
            create_text_file(Path::new(&args[0]))?;
            None
        }
        other => return Err(ActionError::UnknownAction(other.to_string())),
    };

    Ok(ActionReport {
        action: name.to_string(),
        output,
    })
}

/// Opens a URL in the default browser via the platform opener.
fn open_url(url: &str) -> Result<()> {
    if cfg!(target_os = "windows") {
        // `start` needs an explicit window title slot before the URL.
        Command::new("cmd").args(["/C", "start", "", url]).spawn()?;
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()?;
    } else {
        Command::new("xdg-open").arg(url).spawn()?;
    }
    Ok(())
}

/// Starts a desktop application without waiting for it to exit.
fn launch_app(program: &str) -> Result<()> {
    Command::new(program).spawn()?;
    Ok(())
}

fn cpu_usage_percent() -> f32 {
    let mut system = System::new();
    // Usage is a delta between two samples; the first refresh only seeds it.
    system.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_usage();
    system.global_cpu_info().cpu_usage()
}

fn ram_usage_percent() -> f64 {
    let mut system = System::new();
    system.refresh_memory();
    let total = system.total_memory();
    if total == 0 {
        return 0.0;
    }
    (system.used_memory() as f64 / total as f64) * 100.0
}

/// Runs a command line through the system shell and captures stdout.
///
/// A failing exit status is logged, not raised; the caller still gets
/// whatever the command printed.
fn shell_capture(command: &str) -> Result<String> {
    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output()?
    } else {
        Command::new("sh").args(["-c", command]).output()?
    };

    if !output.status.success() {
        log::warn!(
            "Shell command exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim_end()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

fn create_text_file(path: &Path) -> Result<()> {
    fs::write(path, "New file created")?;
    log::info!("Created text file {}", path.display());
    Ok(())
}
