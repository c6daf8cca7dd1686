//! `smoc session`: line-oriented editing over a list of records.
//!
//! ```text
//! <value>      submit the focused field (confirm key), focus advances on success
//! b <value>    leave the focused field with <value> (asks before saving)
//! f <pos>      focus field at 1-based position
//! l            list fields
//! q            quit
//! ```

use std::collections::HashSet;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use smoc_field::{
    shared_registry, Confirm, FieldAttrs, FieldController, FieldKey, FieldStatus,
    SharedRegistry, Transport,
};

use super::{describe, load_reorder_config, status_label, transport_for};

// ---------------------------------------------------------------------------
// Fields file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FieldsFile {
    fields: Vec<FieldRow>,
}

#[derive(Debug, Deserialize)]
struct FieldRow {
    #[serde(default)]
    post_id: Option<Scalar>,
    #[serde(default)]
    nonce: Option<String>,
    #[serde(default)]
    menu_order: i64,
}

/// YAML scalars arrive as ints or strings depending on quoting.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn load_fields(path: &str) -> Result<SharedRegistry> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("failed to read fields file: {path}"))?;
    let file: FieldsFile =
        serde_yaml::from_str(&raw).with_context(|| format!("invalid fields file: {path}"))?;

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(file.fields.len());
    for (i, row) in file.fields.into_iter().enumerate() {
        let record_id = row.post_id.map(Scalar::into_string);
        let key = match &record_id {
            Some(id) if !id.trim().is_empty() => FieldKey::new(format!("smoc-{}", id.trim())),
            _ => FieldKey::new(format!("smoc-row-{}", i + 1)),
        };
        if !seen.insert(key.clone()) {
            bail!("duplicate post_id in fields file {path}: row {} repeats {key}", i + 1);
        }
        let attrs = FieldAttrs {
            record_id,
            auth_token: row.nonce,
            value: row.menu_order.to_string(),
        };
        rows.push((key, attrs));
    }
    Ok(shared_registry(rows))
}

// ---------------------------------------------------------------------------
// Input shared between the command loop and the confirmation prompt
// ---------------------------------------------------------------------------

type SharedInput = Arc<Mutex<Box<dyn BufRead + Send>>>;

fn read_line(input: &SharedInput) -> io::Result<Option<String>> {
    let mut line = String::new();
    let n = input
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Asks on stdout, answers from the session input. Anything but y/yes declines.
struct PromptConfirm {
    input: SharedInput,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();
        match read_line(&self.input) {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Command loop
// ---------------------------------------------------------------------------

enum Command<'a> {
    Submit(&'a str),
    Blur(&'a str),
    Focus(&'a str),
    List,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    match head {
        "" => Command::Empty,
        "q" | "quit" => Command::Quit,
        "l" | "list" => Command::List,
        "b" | "blur" => Command::Blur(rest),
        "f" | "focus" => Command::Focus(rest),
        _ => Command::Submit(line),
    }
}

pub async fn run(config_paths: &[String], fields_path: &str) -> Result<()> {
    let cfg = load_reorder_config(config_paths)?;
    let registry = load_fields(fields_path)?;

    let stdin: Box<dyn BufRead + Send> = Box::new(BufReader::new(io::stdin()));
    let input: SharedInput = Arc::new(Mutex::new(stdin));
    let ctl = FieldController::with_confirm(
        cfg.controller_config(),
        registry,
        transport_for(&cfg),
        PromptConfirm {
            input: Arc::clone(&input),
        },
    );

    focus_first(&ctl);
    list(&ctl);

    loop {
        match ctl.focused() {
            Some(key) => print!("{key}> "),
            None => print!("> "),
        }
        io::stdout().flush()?;

        let Some(line) = read_line(&input)? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::List => list(&ctl),
            Command::Focus(pos) => focus_at(&ctl, pos),
            Command::Submit(value) => {
                let Some(key) = ctl.focused() else {
                    println!("no field focused");
                    continue;
                };
                let outcome = ctl.on_confirm_key(&key, value).await;
                println!("{key} {}", describe(&outcome));
            }
            Command::Blur(value) => {
                let Some(key) = ctl.focused() else {
                    println!("no field focused");
                    continue;
                };
                let outcome = ctl.on_blur(&key, value).await;
                println!("{key} {}", describe(&outcome));
            }
        }
    }

    Ok(())
}

fn registered_keys(registry: &SharedRegistry) -> Vec<FieldKey> {
    registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|f| f.key.clone())
        .collect()
}

fn focus_first<T: Transport, C: Confirm>(ctl: &FieldController<T, C>) {
    let focused = registered_keys(&ctl.registry())
        .iter()
        .any(|key| ctl.on_focus(key));
    if !focused {
        println!("no editable fields");
    }
}

fn focus_at<T: Transport, C: Confirm>(ctl: &FieldController<T, C>, pos: &str) {
    let key = pos
        .parse::<usize>()
        .ok()
        .and_then(|p| p.checked_sub(1))
        .and_then(|i| registered_keys(&ctl.registry()).into_iter().nth(i));
    match key {
        Some(key) if ctl.on_focus(&key) => {}
        Some(key) => println!("{key} cannot take focus"),
        None => println!("no field at position {pos:?}"),
    }
}

fn list<T: Transport, C: Confirm>(ctl: &FieldController<T, C>) {
    let registry = ctl.registry();
    let rows: Vec<(FieldKey, String)> = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|f| (f.key.clone(), f.attrs.value.clone()))
        .collect();
    let focused = ctl.focused();

    for (i, (key, rendered)) in rows.iter().enumerate() {
        let marker = if focused.as_ref() == Some(key) { '*' } else { ' ' };
        let line = match ctl.field(key) {
            Some(field) => {
                let mut line = format!(
                    "{marker} {:>2} {key} menu_order={} status={}",
                    i + 1,
                    field.current_value(),
                    status_label(&field.status())
                );
                if let (FieldStatus::Disabled(_), Some(title)) = (field.status(), field.title()) {
                    line.push_str(&format!(" title=\"{title}\""));
                } else if let Some(kind) = field
                    .record_id()
                    .and_then(|id| ctl.indicators(id))
                    .and_then(|set| set.visible())
                {
                    line.push_str(&format!(" indicator=\"{}\"", kind.aria_label()));
                }
                line
            }
            None => format!("{marker} {:>2} {key} menu_order={rendered}", i + 1),
        };
        println!("{line}");
    }
}
