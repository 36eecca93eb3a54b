//! desk-runner: headless driver for the complaint desk.
//!
//! Reads one JSON command per line on stdin and answers each with the
//! resulting view state as one JSON line on stdout.
//!
//! Usage:
//!   desk-runner --config desk.json
//!   desk-runner --api http://localhost:5000/api --db desk.db

use anyhow::Result;
use complaint_desk_core::{
    complaint::{ComplaintStatus, Language},
    config::{DeskConfig, StorageBackend},
    desk::Desk,
    error::DeskError,
    filter::{StatCard, StatusFilter},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Navigate {
        path: String,
    },
    CompleteTutorial,
    SkipTutorial,
    SubmitComplaint {
        text: String,
        #[serde(default)]
        language: Language,
    },
    NewClassification,
    SwitchAuthMode,
    SignUp {
        name: String,
        email: String,
        password: String,
        confirm: String,
    },
    LogIn {
        email: String,
        password: String,
    },
    LogOut,
    SetStatus {
        complaint_id: String,
        status: ComplaintStatus,
    },
    ClickComplaint {
        complaint_id: String,
    },
    Search {
        #[serde(default)]
        query: String,
        #[serde(default)]
        status: StatusFilter,
    },
    ClickStat {
        card: StatCard,
    },
    Refresh,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match arg_value(&args, "--config") {
        Some(path) => DeskConfig::load(path)?,
        None => DeskConfig::from_env(),
    };
    if let Some(api) = arg_value(&args, "--api") {
        config.api_base_url = api.to_string();
    }
    if let Some(db) = arg_value(&args, "--db") {
        config.storage = StorageBackend::Durable { path: db.to_string() };
    }
    log::info!(
        "desk-runner api={} storage={:?} source={:?}",
        config.api_base_url,
        config.storage,
        config.complaint_source
    );

    let mut desk = Desk::open(config)?;
    desk.refresh().unwrap_or_else(|e| log::warn!("initial refresh failed: {e}"));
    run_ipc_loop(&mut desk)
}

fn run_ipc_loop(desk: &mut Desk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let outcome = handle_command(desk, cmd);
        let mut reply = match desk.view_state() {
            Ok(state) => serde_json::to_value(state)?,
            Err(e) => serde_json::json!({ "error": e.inline_message("Dashboard") }),
        };
        if let Err((action, e)) = outcome {
            log::debug!("{action} failed: {e}");
            reply["error"] = serde_json::Value::String(e.inline_message(action));
        }
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Run one command. Errors come back tagged with the user-facing action
/// name so the reply can carry the inline message.
fn handle_command(desk: &mut Desk, cmd: IpcCommand) -> Result<(), (&'static str, DeskError)> {
    match cmd {
        IpcCommand::GetState | IpcCommand::Quit => {}
        IpcCommand::Navigate { path } => {
            desk.navigate_path(&path);
        }
        IpcCommand::CompleteTutorial => {
            desk.complete_tutorial().map_err(|e| ("Tutorial", e))?;
        }
        IpcCommand::SkipTutorial => {
            desk.skip_tutorial().map_err(|e| ("Tutorial", e))?;
        }
        IpcCommand::SubmitComplaint { text, language } => {
            desk.submit_complaint(&text, language)
                .map_err(|e| ("Classification", e))?;
        }
        IpcCommand::NewClassification => desk.new_classification(),
        IpcCommand::SwitchAuthMode => desk.switch_auth_mode(),
        IpcCommand::SignUp { name, email, password, confirm } => {
            desk.sign_up(&name, &email, &password, &confirm)
                .map_err(|e| ("Signup", e))?;
        }
        IpcCommand::LogIn { email, password } => {
            desk.log_in(&email, &password).map_err(|e| ("Login", e))?;
        }
        IpcCommand::LogOut => {
            desk.log_out().map_err(|e| ("Logout", e))?;
        }
        IpcCommand::SetStatus { complaint_id, status } => {
            desk.set_complaint_status(&complaint_id, status)
                .map_err(|e| ("Update", e))?;
        }
        IpcCommand::ClickComplaint { complaint_id } => {
            desk.click_complaint(&complaint_id)
                .map_err(|e| ("Update", e))?;
        }
        IpcCommand::Search { query, status } => desk.search(&query, status),
        IpcCommand::ClickStat { card } => desk.click_stat(card),
        IpcCommand::Refresh => {
            desk.refresh().map_err(|e| ("Refresh", e))?;
        }
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
