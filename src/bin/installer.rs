use std::io;

#[cfg(windows)]
#[path = "installer/actions.rs"]
mod actions;
#[cfg(windows)]
#[path = "installer/restart_explorer.rs"]
mod restart_explorer;

#[cfg(windows)]
use dialoguer::console::{Term, style};
#[cfg(windows)]
use dialoguer::theme::ColorfulTheme;
#[cfg(windows)]
use dialoguer::Select;
use folder_preview_win::log::log_cli;

fn main() -> io::Result<()> {
    log_cli("Installer started");
    run()
}

#[cfg(not(windows))]
fn run() -> io::Result<()> {
    eprintln!("The folder preview handler can only be installed on Windows.");
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Explorer preview handlers require Windows",
    ))
}

#[cfg(windows)]
fn run() -> io::Result<()> {
    loop {
        let action = choose_action()?;
        log_cli(format!("Menu selection: {}", action.title()));

        if action == Action::Exit {
            log_cli("Installer exiting");
            break;
        }

        match execute_action(action) {
            Ok(()) => log_cli(format!(
                "Action '{}' completed successfully",
                action.title()
            )),
            Err(err) => {
                log_cli(format!("Action '{}' failed: {}", action.title(), err));
                println!("{} failed: {}", action.title(), err);
            }
        }

        pause("\nPress Enter to return to the menu...");
    }
    Ok(())
}

/* ---------- Menu ---------- */

#[cfg(windows)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Install,
    Uninstall,
    Status,
    ToggleLogging,
    RestartExplorer,
    Exit,
}

#[cfg(windows)]
impl Action {
    const ALL: [Action; 6] = [
        Action::Install,
        Action::Uninstall,
        Action::Status,
        Action::ToggleLogging,
        Action::RestartExplorer,
        Action::Exit,
    ];

    fn title(self) -> &'static str {
        match self {
            Action::Install => "Install (all users)",
            Action::Uninstall => "Uninstall (all users)",
            Action::Status => "Status",
            Action::ToggleLogging => "Toggle logging",
            Action::RestartExplorer => "Restart Explorer",
            Action::Exit => "Exit",
        }
    }
}

#[cfg(windows)]
fn menu_theme() -> ColorfulTheme {
    let mut t = ColorfulTheme::default();
    t.active_item_prefix = style(">".to_string());
    t.inactive_item_prefix = style(" ".to_string());
    t.picked_item_prefix = style(">".to_string());
    t.unpicked_item_prefix = style(" ".to_string());
    t.prompt_prefix = style("$".to_string());
    t.success_prefix = style(">".to_string());
    t.error_prefix = style("!".to_string());
    t
}

#[cfg(windows)]
fn choose_action() -> io::Result<Action> {
    let items = Action::ALL.map(Action::title);

    let idx = Select::with_theme(&menu_theme())
        .with_prompt("Folder Preview Handler installer")
        .items(&items)
        .default(0)
        .interact_on(&Term::stdout())
        .map_err(io::Error::other)?;

    Ok(Action::ALL.get(idx).copied().unwrap_or(Action::Exit))
}

#[cfg(windows)]
fn execute_action(action: Action) -> io::Result<()> {
    match action {
        Action::Install => actions::install(),
        Action::Uninstall => actions::uninstall(),
        Action::Status => actions::status(),
        Action::ToggleLogging => actions::toggle_logging(),
        Action::RestartExplorer => restart_explorer::restart_explorer(),
        Action::Exit => Ok(()),
    }
}

#[cfg(windows)]
fn pause(msg: &str) {
    println!("{msg}");
    let _ = io::stdin().read_line(&mut String::new());
}
