//! Entry point for the hostwatch CLI. Resolves connection parameters and runs one monitoring session.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use hostwatch::display;
use hostwatch::profiles::{
    load_profiles, save_profiles, ProfileEntry, ProfileRequest, ProfilesFile, ResolveProfile,
};
use hostwatch::ws::{validate_url, WsConnector};
use hostwatch::{
    ConnectionRequest, LatestData, PresentationForm, SessionController, SessionNotice,
    SessionState,
};
use tracing_subscriber::EnvFilter;

const USAGE_ARGS: &str = "[--tls-ca CERT_PEM|-t CERT_PEM] [--profile NAME|-P NAME] [--save] [--host HOST|-H HOST] [--user NAME|-u NAME] [--form dashboard|log|-f FORM] [--dry-run] [ws://GATEWAY:PORT/ws/monitor]";

const SECRET_NOTE: &str = "The SSH password is read from HOSTWATCH_PASSWORD, otherwise prompted on stdin (typed input is echoed).";

#[derive(Debug, Default)]
struct ParsedArgs {
    url: Option<String>,
    tls_ca: Option<String>,
    profile: Option<String>,
    host: Option<String>,
    user: Option<String>,
    form: PresentationForm,
    save: bool,
    dry_run: bool,
}

enum ArgsError {
    Help(String),
    Usage(String),
}

fn parse_form(v: &str) -> Result<PresentationForm, String> {
    match v.to_ascii_lowercase().as_str() {
        "dashboard" => Ok(PresentationForm::Dashboard),
        "log" => Ok(PresentationForm::Log),
        other => Err(format!("Unknown form '{other}', expected 'dashboard' or 'log'")),
    }
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, ArgsError> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "hostwatch".into());
    let usage = || format!("Usage: {prog} {USAGE_ARGS}\n{SECRET_NOTE}");
    let mut p = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(ArgsError::Help(usage())),
            "--tls-ca" | "-t" => p.tls_ca = it.next(),
            "--profile" | "-P" => p.profile = it.next(),
            "--host" | "-H" => p.host = it.next(),
            "--user" | "-u" => p.user = it.next(),
            "--form" | "-f" => {
                let v = it.next().unwrap_or_default();
                p.form = parse_form(&v).map_err(|e| ArgsError::Usage(format!("{e}\n{}", usage())))?;
            }
            "--save" => p.save = true,
            "--dry-run" => p.dry_run = true,
            _ if arg.starts_with("--") && arg.contains('=') => {
                let Some((k, v)) = arg.split_once('=') else { continue };
                if v.is_empty() {
                    continue;
                }
                match k {
                    "--tls-ca" => p.tls_ca = Some(v.to_string()),
                    "--profile" => p.profile = Some(v.to_string()),
                    "--host" => p.host = Some(v.to_string()),
                    "--user" => p.user = Some(v.to_string()),
                    "--form" => {
                        p.form = parse_form(v)
                            .map_err(|e| ArgsError::Usage(format!("{e}\n{}", usage())))?
                    }
                    _ => return Err(ArgsError::Usage(format!("Unknown option {k}. {}", usage()))),
                }
            }
            _ => {
                if p.url.is_none() {
                    p.url = Some(arg);
                } else {
                    return Err(ArgsError::Usage(format!("Unexpected argument. {}", usage())));
                }
            }
        }
    }
    Ok(p)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HOSTWATCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(ArgsError::Help(msg)) => {
            eprintln!("{msg}");
            return Ok(());
        }
        Err(ArgsError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let Some(entry) = resolve_entry(&parsed)? else {
        return Ok(());
    };

    validate_url(&entry.url)?;
    if entry.host.trim().is_empty() {
        bail!("no target host given (use --host HOST or a profile)");
    }
    if entry.username.trim().is_empty() {
        bail!("no username given (use --user NAME or a profile)");
    }

    if parsed.dry_run {
        eprintln!(
            "Resolved: gateway {} host {} user {}",
            entry.url, entry.host, entry.username
        );
        return Ok(());
    }

    let secret = read_secret(&entry)?;
    run_session(entry, parsed.form, secret).await
}

/// Turn args + saved profiles into one entry, persisting new or changed profiles.
fn resolve_entry(parsed: &ParsedArgs) -> anyhow::Result<Option<ProfileEntry>> {
    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        host: parsed.host.clone(),
        username: parsed.user.clone(),
        tls_ca: parsed.tls_ca.clone(),
    };

    let mut profiles_mut = profiles_file.clone();
    let entry = match req.resolve(&profiles_file) {
        ResolveProfile::Direct(entry) => {
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name).cloned() {
                    // New profile: auto-save immediately
                    None => store(&mut profiles_mut, name, &entry),
                    Some(existing) if existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!("Overwrite existing profile '{name}'? [y/N]: "));
                        if overwrite {
                            store(&mut profiles_mut, name, &entry);
                        }
                    }
                    Some(_) => {}
                }
            }
            entry
        }
        ResolveProfile::Loaded(entry) => entry,
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let picked = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| names.get(idx))
                .and_then(|name| profiles_mut.profiles.get(name));
            match picked {
                Some(entry) => entry.clone(),
                None => return Ok(None),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter gateway URL (ws://HOST:PORT/ws/monitor or wss://...): ")?;
            if url.trim().is_empty() {
                return Ok(None);
            }
            let host = prompt_string("Enter target host: ")?;
            let username = prompt_string("Enter username: ")?;
            let ca = prompt_string("Enter TLS CA path (or leave blank): ")?;
            let entry = ProfileEntry {
                url: url.trim().to_string(),
                host: host.trim().to_string(),
                username: username.trim().to_string(),
                tls_ca: Some(ca.trim().to_string()).filter(|c| !c.is_empty()),
            };
            store(&mut profiles_mut, &name, &entry);
            entry
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            return Ok(None);
        }
    };
    Ok(Some(entry))
}

fn store(pf: &mut ProfilesFile, name: &str, entry: &ProfileEntry) {
    pf.profiles.insert(name.to_string(), entry.clone());
    if let Err(e) = save_profiles(pf) {
        tracing::warn!(error = %e, "could not save profiles");
    }
}

fn read_secret(entry: &ProfileEntry) -> anyhow::Result<String> {
    if let Ok(secret) = env::var("HOSTWATCH_PASSWORD") {
        return Ok(secret);
    }
    let line = prompt_string(&format!(
        "Password for {}@{} (echoed; set HOSTWATCH_PASSWORD to skip): ",
        entry.username, entry.host
    ))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run_session(
    entry: ProfileEntry,
    form: PresentationForm,
    secret: String,
) -> anyhow::Result<()> {
    let connector = WsConnector::new(entry.url.clone(), entry.tls_ca.as_ref().map(PathBuf::from));
    let mut session = SessionController::new(connector, form);
    let mut notices = session.subscribe();
    session.start(ConnectionRequest::new(
        entry.host.clone(),
        entry.username.clone(),
        secret,
    ));

    let mut failure: Option<String> = None;
    loop {
        tokio::select! {
            _ = session.pump() => {}
            _ = tokio::signal::ctrl_c() => session.stop(),
        }
        while let Ok(notice) = notices.try_recv() {
            match notice {
                SessionNotice::StateChanged(state) => {
                    println!("{}", display::header(&entry.host, state))
                }
                SessionNotice::Failed(message) => failure = Some(message),
                SessionNotice::Updated => print_latest(session.latest_data()),
            }
        }
        if session.current_state() == SessionState::Idle {
            break;
        }
    }

    match failure {
        Some(message) => Err(anyhow!("connection failed: {message}")),
        None => Ok(()),
    }
}

fn print_latest(data: Option<&LatestData>) {
    match data {
        Some(LatestData::Snapshot(snapshot)) => {
            println!();
            for line in display::snapshot_lines(snapshot) {
                println!("{line}");
            }
        }
        Some(LatestData::Log(buf)) => {
            println!();
            for line in display::log_lines(buf) {
                println!("{line}");
            }
        }
        None => {}
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
