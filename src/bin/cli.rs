use std::io::{self, Write};
use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use shift_roster::export::ics::FILE_NAME;
use shift_roster::template::default_templates;
use shift_roster::{
    CommitOutcome, CommitProtocol, CommitState, ExtraHours, JsonDirKvStore, RestConflict,
    RestConflictKind, RestSide, RosterConfig, RosterError, RosterPersistence, RosterSnapshot,
    ShiftEntry, ShiftEntryStore, TemplateCatalog, TemplateLookup, generate_ics,
    google_calendar_link, load_roster_from_json, resolve_entry, save_entries_to_csv,
    save_roster_to_json,
};
use tracing_subscriber::EnvFilter;

struct Session {
    config: RosterConfig,
    catalog: TemplateCatalog,
    store: ShiftEntryStore,
    protocol: CommitProtocol,
    persistence: Option<RosterPersistence>,
}

impl Session {
    fn open(config: RosterConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let protocol = CommitProtocol::new(config.rest_guard());
        let Some(dir) = config.data_dir.clone() else {
            return Ok(Self {
                config,
                catalog: TemplateCatalog::default(),
                store: ShiftEntryStore::new(),
                protocol,
                persistence: None,
            });
        };

        let local = Arc::new(JsonDirKvStore::new(dir)?);
        let persistence = RosterPersistence::from_config(&config, local, None);
        let templates = persistence.load_templates(&default_templates())?;
        let entries = persistence.load_entries()?;
        tracing::info!(entries = entries.len(), templates = templates.len(), "roster loaded");

        let mut store = ShiftEntryStore::from_entries(entries);
        store.set_observer(Box::new(persistence.clone()));
        Ok(Self {
            config,
            catalog: TemplateCatalog::new(templates),
            store,
            protocol,
            persistence: Some(persistence),
        })
    }

    fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot::new(self.catalog.templates().to_vec(), self.store.entries_vec())
    }

    fn replace_roster(&mut self, snapshot: RosterSnapshot) {
        self.catalog = TemplateCatalog::new(snapshot.templates);
        if let Some(persistence) = &self.persistence {
            if let Err(err) = persistence.save_templates(self.catalog.templates()) {
                tracing::warn!(error = %err, "saving templates failed");
            }
        }
        self.store.replace_all(snapshot.entries);
        self.protocol = CommitProtocol::new(self.config.rest_guard());
    }

    fn describe(&self, entry: &ShiftEntry) -> String {
        let Some(template) = self.catalog.template(&entry.template_id) else {
            return format!("{}  (unknown template {})", entry.date, entry.template_id);
        };
        let label = format!("{} {}", template.icon, template.name);
        let mut line = if template.is_leave() {
            format!("{}  {}  Full Day Block", entry.date, label.trim_start())
        } else {
            match resolve_entry(entry, &self.catalog) {
                Some(interval) => format!(
                    "{}  {}  {} -> {}",
                    entry.date,
                    label.trim_start(),
                    interval.start.format("%Y-%m-%d %H:%M"),
                    interval.end.format("%Y-%m-%d %H:%M")
                ),
                None => format!("{}  {}", entry.date, label.trim_start()),
            }
        };
        if entry.extra_hours.is_extended() {
            line.push_str(&format!("  [extra {}]", entry.extra_hours.as_str()));
        }
        if entry.is_swapped {
            match &entry.swapped_with {
                Some(partner) => line.push_str(&format!("  [swapped with {partner}]")),
                None => line.push_str("  [swapped]"),
            }
        }
        if let Some(note) = &entry.note {
            line.push_str(&format!("  note: {note}"));
        }
        line
    }

    fn report(&self, outcome: CommitOutcome) {
        match outcome {
            CommitOutcome::Committed { entry, replaced } => {
                let verb = if replaced.is_some() { "Replaced" } else { "Saved" };
                println!("{verb}: {}", self.describe(&entry));
            }
            CommitOutcome::NeedsOverwriteConfirm {
                existing,
                pending_template_id,
            } => {
                println!("{} is already booked: {}", existing.date, self.describe(&existing));
                println!("Type 'yes' to replace it with {pending_template_id}, or 'cancel'.");
            }
            CommitOutcome::NeedsRestConfirm(conflict) => {
                println!("{}", rest_warning(&conflict, self.protocol.guard().min_rest_minutes()));
                println!("Type 'override' to save anyway, or 'cancel'.");
            }
            CommitOutcome::Deleted(entry) => println!("Deleted entry on {}.", entry.date),
            CommitOutcome::NotFound => println!("No entry to delete."),
            CommitOutcome::Cancelled => println!("Cancelled."),
        }
    }

    fn week_of(&self, anchor: NaiveDate) -> Vec<NaiveDate> {
        let offset = if self.config.week_starts_on_monday {
            anchor.weekday().num_days_from_monday()
        } else {
            anchor.weekday().num_days_from_sunday()
        };
        let Some(start) = anchor.checked_sub_signed(Duration::days(i64::from(offset))) else {
            return vec![anchor];
        };
        (0..7)
            .filter_map(|i| start.checked_add_signed(Duration::days(i)))
            .collect()
    }
}

fn rest_warning(conflict: &RestConflict, min_rest_minutes: i64) -> String {
    let neighbor = match conflict.side {
        RestSide::Previous => "the previous day",
        RestSide::Next => "the next day",
    };
    match conflict.kind {
        RestConflictKind::Overlap => format!(
            "Rest warning: this shift overlaps the shift on {neighbor} ({}) by {}.",
            conflict.neighbor.date,
            conflict.gap_label()
        ),
        RestConflictKind::ShortRest => format!(
            "Rest warning: only {} rest against the shift on {neighbor} ({}), minimum is {}h.",
            conflict.gap_label(),
            conflict.neighbor.date,
            min_rest_minutes / 60
        ),
    }
}

fn parse_date(input: Option<&str>) -> Option<NaiveDate> {
    input.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn print_help() {
    println!(
        "Commands:\n  help                     Show this help\n  templates                List shift templates\n  select <YYYY-MM-DD>      Select a date to edit\n  swap <name...>|off       Mark the shift as swapped (optionally with a partner)\n  extra <none|before|after>\n                           Extend the shift by 4 hours\n  note <text...>           Attach a note (no text clears it)\n  add <template_id>        Save the selected date\n  force <template_id>      Save without overwrite or rest prompts\n  yes                      Confirm a pending overwrite\n  override                 Save despite a rest warning\n  cancel                   Drop a pending prompt\n  delete <YYYY-MM-DD>      Delete the entry on a date\n  show                     List all entries\n  week                     Show the week around the selected date\n  save <json|csv> <path>   Write the roster to a file\n  load json <path>         Replace the roster from a file\n  export ics [path]        Write an iCalendar file\n  link <YYYY-MM-DD>        Print a Google Calendar link\n  quit|exit                Exit"
    );
}

fn form_unavailable(protocol: &CommitProtocol) {
    match protocol.state() {
        CommitState::Idle => println!("Select a date first."),
        other => println!("Finish the pending prompt first ({}).", other.name()),
    }
}

fn print_error(err: &RosterError) {
    match err {
        RosterError::NoDateSelected => println!("Select a date first."),
        other => println!("Error: {other}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match RosterConfig::load_or_default(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {e}");
                std::process::exit(2);
            }
        },
        None => RosterConfig::default(),
    };

    let mut session = match Session::open(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Startup error: {e}");
            std::process::exit(2);
        }
    };

    println!("Shift Roster (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "templates" => {
                for template in session.catalog.iter() {
                    println!(
                        "{:<12} {} {:<14} {}",
                        template.id,
                        template.icon,
                        template.name,
                        template.time_label()
                    );
                }
            }
            "select" => match parse_date(parts.next()) {
                Some(date) => {
                    session.protocol.select_date(date);
                    match session.store.by_date(date) {
                        Some(entry) => println!("Selected {date}: {}", session.describe(entry)),
                        None => println!("Selected {date} (empty)."),
                    }
                }
                None => println!("Usage: select <YYYY-MM-DD>"),
            },
            "swap" => {
                let rest: Vec<&str> = parts.collect();
                let Some(context) = session.protocol.context_mut() else {
                    form_unavailable(&session.protocol);
                    continue;
                };
                if rest.len() == 1 && rest[0] == "off" {
                    context.is_swapped = false;
                    context.swapped_with = None;
                    println!("Swap cleared.");
                } else {
                    context.is_swapped = true;
                    context.swapped_with = if rest.is_empty() { None } else { Some(rest.join(" ")) };
                    match &context.swapped_with {
                        Some(partner) => println!("Marked as swapped with {partner}."),
                        None => println!("Marked as swapped."),
                    }
                }
            }
            "extra" => {
                let Some(extra) = parts.next().and_then(|s| s.parse::<ExtraHours>().ok()) else {
                    println!("Usage: extra <none|before|after>");
                    continue;
                };
                let Some(context) = session.protocol.context_mut() else {
                    form_unavailable(&session.protocol);
                    continue;
                };
                context.extra_hours = extra;
                println!("Extra hours: {}.", extra.as_str());
            }
            "note" => {
                let rest: Vec<&str> = parts.collect();
                let Some(context) = session.protocol.context_mut() else {
                    form_unavailable(&session.protocol);
                    continue;
                };
                if rest.is_empty() {
                    context.note = None;
                    println!("Note cleared.");
                } else {
                    context.note = Some(rest.join(" "));
                    println!("Note set.");
                }
            }
            "add" | "force" => {
                let Some(template_id) = parts.next() else {
                    println!("Usage: {cmd} <template_id>");
                    continue;
                };
                let force = cmd == "force";
                match session.protocol.request_save(
                    template_id,
                    force,
                    &session.catalog,
                    &mut session.store,
                ) {
                    Ok(outcome) => session.report(outcome),
                    Err(e) => print_error(&e),
                }
            }
            "yes" => match session
                .protocol
                .confirm_overwrite(&session.catalog, &mut session.store)
            {
                Ok(outcome) => session.report(outcome),
                Err(e) => print_error(&e),
            },
            "override" => match session.protocol.override_rest(&mut session.store) {
                Ok(outcome) => session.report(outcome),
                Err(e) => print_error(&e),
            },
            "cancel" => {
                let outcome = session.protocol.cancel();
                session.report(outcome);
            }
            "delete" => {
                let Some(date) = parse_date(parts.next()) else {
                    println!("Usage: delete <YYYY-MM-DD>");
                    continue;
                };
                let Some(id) = session.store.by_date(date).map(|entry| entry.id.clone()) else {
                    println!("No entry on {date}.");
                    continue;
                };
                let outcome = session.protocol.delete(&id, &mut session.store);
                session.report(outcome);
            }
            "show" => {
                if session.store.is_empty() {
                    println!("No entries.");
                }
                for entry in session.store.all() {
                    println!("{}", session.describe(entry));
                }
            }
            "week" => {
                let anchor = session
                    .protocol
                    .selected_date()
                    .unwrap_or_else(|| Local::now().date_naive());
                for date in session.week_of(anchor) {
                    match session.store.by_date(date) {
                        Some(entry) => println!("{}", session.describe(entry)),
                        None => println!("{date}  -"),
                    }
                }
            }
            "save" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match save_roster_to_json(&session.snapshot(), path) {
                    Ok(()) => println!("Roster saved to {path}."),
                    Err(e) => println!("Save error: {e}"),
                },
                (Some("csv"), Some(path)) => {
                    match save_entries_to_csv(&session.store.entries_vec(), &session.catalog, path) {
                        Ok(()) => println!("Entries saved to {path}."),
                        Err(e) => println!("Save error: {e}"),
                    }
                }
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "load" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match load_roster_from_json(path) {
                    Ok(snapshot) => {
                        session.replace_roster(snapshot);
                        println!("Roster loaded from {path}.");
                    }
                    Err(e) => println!("Load error: {e}"),
                },
                _ => println!("Usage: load json <path>"),
            },
            "export" => match (parts.next(), parts.next()) {
                (Some("ics"), path) => {
                    let path = path.unwrap_or(FILE_NAME);
                    let text =
                        generate_ics(&session.store.entries_vec(), &session.catalog, Utc::now());
                    match std::fs::write(path, text) {
                        Ok(()) => println!("Calendar exported to {path}."),
                        Err(e) => println!("Export error: {e}"),
                    }
                }
                _ => println!("Usage: export ics [path]"),
            },
            "link" => {
                let Some(date) = parse_date(parts.next()) else {
                    println!("Usage: link <YYYY-MM-DD>");
                    continue;
                };
                let Some(entry) = session.store.by_date(date) else {
                    println!("No entry on {date}.");
                    continue;
                };
                match session.catalog.template(&entry.template_id) {
                    Some(template) => match google_calendar_link(entry, template) {
                        Some(link) => println!("{link}"),
                        None => println!("Entry on {date} is outside the supported date range."),
                    },
                    None => println!("Entry on {date} refers to unknown template {}.", entry.template_id),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
