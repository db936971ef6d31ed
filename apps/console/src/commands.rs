use domain::{
    catalog::{find_medication, Route},
    prescriptions::DraftField,
    MedicationId,
};

pub const HELP: &str = "\
Commands:
  open                   open a new prescription form
  set <field> <value>    set drug|dose|frequency|duration|route|notes
  submit                 check & submit the draft
  justify <text>         enter the override justification
  override               override conflicts & save
  cancel                 discard the draft and conflicts
  delete <id>            delete a medication
  refresh                reload the medication list
  allergies              list recorded allergies
  catalog                list known medications, routes and allergens
  show                   redraw the panel
  history                show applied events
  quit";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConsoleCommand {
    Open,
    Set(DraftField, String),
    Submit,
    Justify(String),
    Override,
    Cancel,
    Delete(MedicationId),
    Refresh,
    Allergies,
    Catalog,
    Show,
    History,
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "open" | "new" => ConsoleCommand::Open,
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map(|(f, v)| (f, v.trim()))
                .unwrap_or((rest, ""));
            if field.is_empty() {
                return Err("usage: set <field> <value>".to_string());
            }
            let field = field.parse::<DraftField>().map_err(|e| e.to_string())?;
            ConsoleCommand::Set(field, value.to_string())
        }
        "submit" => ConsoleCommand::Submit,
        "justify" => ConsoleCommand::Justify(rest.to_string()),
        "override" => ConsoleCommand::Override,
        "cancel" => ConsoleCommand::Cancel,
        "delete" | "rm" => {
            let id = rest
                .parse::<MedicationId>()
                .map_err(|_| "usage: delete <medication id>".to_string())?;
            ConsoleCommand::Delete(id)
        }
        "refresh" => ConsoleCommand::Refresh,
        "allergies" => ConsoleCommand::Allergies,
        "catalog" => ConsoleCommand::Catalog,
        "show" => ConsoleCommand::Show,
        "history" => ConsoleCommand::History,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(command))
}

/// Catalog spelling for known drug names, plus a note for values outside the
/// drug catalog or the route list. Unknown values are kept as typed.
pub fn check_value(field: DraftField, value: String) -> (String, Option<String>) {
    match field {
        DraftField::DrugName if !value.is_empty() => match find_medication(&value) {
            Some(known) => (known.to_string(), None),
            None => {
                let note = format!("Note: `{value}` is not in the medication catalog");
                (value, Some(note))
            }
        },
        DraftField::Route if !value.is_empty() && value.parse::<Route>().is_err() => {
            let note = format!("Note: `{value}` is not one of the standard routes");
            (value, Some(note))
        }
        _ => (value, None),
    }
}
