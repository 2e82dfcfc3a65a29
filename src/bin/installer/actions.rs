use std::path::PathBuf;
use std::{env, fs, io};

use folder_preview_win::keys::{
    DLL_FILE_NAME, INSTALL_DIR_NAME, LOG_SETTINGS_SUBKEY, LOGGING_VALUE_NAME,
};
use folder_preview_win::log::{log_cli, log_file_path, log_ui};
use folder_preview_win::registration::{self, RegistryScope};
use folder_preview_win::settings::logging_enabled;
use winreg::RegKey;
use winreg::enums::HKEY_CURRENT_USER;

const SCOPES: [RegistryScope; 2] = [RegistryScope::LocalMachine, RegistryScope::CurrentUser];

/// The DLL shipped beside the installer executable.
fn bundled_dll() -> io::Result<PathBuf> {
    let exe = env::current_exe()?;
    let dll = exe
        .parent()
        .map(|dir| dir.join(DLL_FILE_NAME))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "installer has no parent directory"))?;
    if !dll.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found next to the installer", dll.display()),
        ));
    }
    Ok(dll)
}

fn install_dir() -> PathBuf {
    env::var_os("PROGRAMFILES")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"))
        .join(INSTALL_DIR_NAME)
}

fn materialize_dll() -> io::Result<PathBuf> {
    let source = bundled_dll()?;
    let dir = install_dir();
    log_cli(format!("Materialize DLL: ensuring directory {}", dir.display()));
    fs::create_dir_all(&dir)?;
    let target = dir.join(DLL_FILE_NAME);
    log_cli(format!(
        "Materialize DLL: copying {} -> {}",
        source.display(),
        target.display()
    ));
    fs::copy(&source, &target)?;
    Ok(target)
}

pub fn install() -> io::Result<()> {
    log_cli("Install (all users): start");
    let dll_path = materialize_dll()?;

    let mut warnings = Vec::new();
    for scope in SCOPES {
        if let Err(err) = registration::register(scope, &dll_path) {
            warnings.push(format!("{} registration failed: {}", scope.name(), err));
        }
    }

    registration::notify_shell();

    if !SCOPES.iter().any(|&s| registration::probe(s).is_ready()) {
        warnings.push("Verification reported issues; see Status".to_string());
    }

    if warnings.is_empty() {
        println!("Installed in HKLM and HKCU. Select a folder with the preview pane open.");
    } else {
        println!("Install completed with warnings:");
        for warn in warnings {
            log_cli(format!("Install warning: {}", warn));
            println!("  - {}", warn);
        }
    }
    Ok(())
}

pub fn uninstall() -> io::Result<()> {
    log_cli("Uninstall (all users): start");
    for scope in SCOPES {
        if let Err(err) = registration::unregister(scope) {
            println!("{} cleanup incomplete: {}", scope.name(), err);
        }
    }
    registration::notify_shell();

    let dll = install_dir().join(DLL_FILE_NAME);
    match fs::remove_file(&dll) {
        Ok(()) => log_cli(format!("Uninstall: removed {}", dll.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        // Explorer usually still has the DLL loaded.
        Err(e) => println!("Could not remove {} ({}); restart Explorer and retry.", dll.display(), e),
    }
    println!("Uninstalled from HKLM and HKCU.");
    Ok(())
}

fn mark(b: bool) -> &'static str {
    if b { "OK" } else { "--" }
}

pub fn status() -> io::Result<()> {
    log_cli("Status: probing");
    for scope in SCOPES {
        let report = registration::probe(scope);
        println!("[{}]", scope.name());
        println!("  CLSID key:                {}", mark(report.clsid));
        println!(
            "  InprocServer32:           {}",
            report
                .inproc_path
                .as_ref()
                .map_or("<missing>".to_string(), |p| p.display().to_string())
        );
        println!("  DLL on disk:              {}", mark(report.dll_exists()));
        println!("  ThreadingModel=Apartment: {}", mark(report.threading_apartment));
        println!("  Implemented Categories:   {}", mark(report.category));
        println!("  Directory shellex:        {}", mark(report.shellex));
        println!("  PreviewHandlers list:     {}", mark(report.preview_handlers));
        println!("  Approved list:            {}", mark(report.approved));
        println!("  Ready:                    {}", mark(report.is_ready()));
    }
    println!(
        "Logging: {}",
        if logging_enabled() { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Flips `HKCU\{LOG_SETTINGS_SUBKEY}\{LOGGING_VALUE_NAME}`. Disabling also
/// removes the current log file.
pub fn toggle_logging() -> io::Result<()> {
    let target = !logging_enabled();

    let root = RegKey::predef(HKEY_CURRENT_USER);
    let (key, _) = root.create_subkey(LOG_SETTINGS_SUBKEY)?;
    let value: u32 = if target { 1 } else { 0 };
    log_ui(format!(
        r"Writing HKCU\{}\{} = {}",
        LOG_SETTINGS_SUBKEY, LOGGING_VALUE_NAME, value
    ));
    key.set_value(LOGGING_VALUE_NAME, &value)?;

    if !target {
        if let Some(path) = log_file_path().filter(|p| p.exists()) {
            match fs::remove_file(&path) {
                Ok(()) => println!("Removed log file {}", path.display()),
                Err(e) => println!("Failed to remove log file {}: {}", path.display(), e),
            }
        }
    }

    println!(
        "Logging is now {}.",
        if target { "ENABLED" } else { "DISABLED" }
    );
    Ok(())
}
