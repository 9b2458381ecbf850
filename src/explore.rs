use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::bail;
use chrono::Utc;
use tracing::warn;

use crate::aggregate;
use crate::cache::DatasetCache;
use crate::cohort::FilterSelection;
use crate::models::{CategoricalAttribute, NumericAttribute};
use crate::report;

const HELP: &str = "\
Commands:
  occupations <a, b, ...>  select occupations (empty selects none)
  bmi <a, b, ...>          select BMI categories (empty selects none)
  reset                    select every occupation and BMI category
  reload                   re-read the data file
  show                     print the full dashboard
  help                     print this help
  quit                     leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Occupations(BTreeSet<String>),
    Bmi(BTreeSet<String>),
    Reset,
    Reload,
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Command> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        let command = match verb.to_ascii_lowercase().as_str() {
            "occupations" | "occupation" => Command::Occupations(parse_values(rest)),
            "bmi" => Command::Bmi(parse_values(rest)),
            "reset" => Command::Reset,
            "reload" => Command::Reload,
            "" | "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command \"{other}\", try \"help\""),
        };
        Ok(command)
    }
}

fn parse_values(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// An interactive filter session. The session owns the filter selection;
/// every command re-runs load, select and aggregate from scratch.
pub struct Session {
    source: PathBuf,
    cache: DatasetCache,
    selection: Option<FilterSelection>,
}

impl Session {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            cache: DatasetCache::new(),
            selection: None,
        }
    }

    pub fn selection(&self) -> Option<&FilterSelection> {
        self.selection.as_ref()
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> anyhow::Result<()> {
        writeln!(output, "{HELP}")?;
        for line in input.lines() {
            let line = line?;
            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(err) => {
                    writeln!(output, "{err}")?;
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            match self.handle(command) {
                Ok(text) => write!(output, "{text}")?,
                Err(err) => {
                    warn!(error = %err, "render aborted");
                    writeln!(output, "Error: {err:#}")?;
                }
            }
            output.flush()?;
        }
        Ok(())
    }

    /// Applies one command and renders the result. On error the previous
    /// selection is kept.
    pub fn handle(&mut self, command: Command) -> anyhow::Result<String> {
        match command {
            Command::Help => return Ok(format!("{HELP}\n")),
            Command::Quit => return Ok(String::new()),
            Command::Reload => {
                self.cache.invalidate(&self.source);
            }
            _ => {}
        }
        let dataset = self.cache.load(&self.source)?;
        let mut selection = self
            .selection
            .clone()
            .unwrap_or_else(|| FilterSelection::all(&dataset));

        match command {
            Command::Occupations(values) => selection.occupations = values,
            Command::Bmi(values) => selection.bmi_categories = values,
            Command::Reset => selection = FilterSelection::all(&dataset),
            Command::Show => {
                let dashboard = report::build_dashboard(
                    &dataset,
                    &selection,
                    report::FEATURED_OCCUPATION,
                    Utc::now(),
                );
                self.selection = Some(selection);
                return Ok(report::render_markdown(&dashboard));
            }
            Command::Reload | Command::Help | Command::Quit => {}
        }

        let view = selection.apply(&dataset);
        let mut output = String::new();
        let _ = writeln!(
            output,
            "{} of {} records selected",
            view.len(),
            dataset.len()
        );
        if view.is_empty() {
            let _ = writeln!(output, "No records match the current filters.");
        } else {
            let sleep = aggregate::group_means(
                &view,
                CategoricalAttribute::Occupation,
                NumericAttribute::SleepDuration,
            );
            for entry in sleep.iter() {
                let _ = writeln!(output, "- {}: {:.2} h sleep", entry.category, entry.value);
            }
            if let Some(steps) = aggregate::mean_of(&view, NumericAttribute::DailySteps) {
                let _ = writeln!(output, "Avg Daily Steps: {steps:.0}");
            }
        }

        self.selection = Some(selection);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::loader::fixtures::six_rows;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse("occupations Engineer, Sales Representative").unwrap(),
            Command::Occupations(set(&["Engineer", "Sales Representative"]))
        );
        assert_eq!(Command::parse("bmi").unwrap(), Command::Bmi(BTreeSet::new()));
        assert_eq!(Command::parse("  ").unwrap(), Command::Show);
        assert_eq!(Command::parse("QUIT").unwrap(), Command::Quit);
        assert_eq!(Command::parse("reload").unwrap(), Command::Reload);
        assert!(Command::parse("plot everything").is_err());
    }

    #[test]
    fn selection_changes_rerun_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleep.csv");
        fs::write(&path, six_rows()).unwrap();
        let mut session = Session::new(path);

        let text = session.handle(Command::Occupations(set(&["Engineer"]))).unwrap();
        assert!(text.starts_with("2 of 6 records selected"));
        assert!(text.contains("- Engineer: 6.95 h sleep"));
        assert!(text.contains("Avg Daily Steps: 5600"));

        let text = session.handle(Command::Bmi(BTreeSet::new())).unwrap();
        assert!(text.starts_with("0 of 6 records selected"));
        assert!(text.contains("No records match"));

        session.handle(Command::Reset).unwrap();
        assert_eq!(session.selection().unwrap().occupations.len(), 3);
    }

    #[test]
    fn help_works_without_a_data_file() {
        let mut session = Session::new(PathBuf::from("no/such/sleep.csv"));

        assert_eq!(session.handle(Command::Help).unwrap(), format!("{HELP}\n"));
        assert_eq!(session.handle(Command::Quit).unwrap(), "");
        assert!(session.handle(Command::Show).is_err());
        assert!(session.selection().is_none());
    }

    #[test]
    fn failed_render_keeps_previous_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleep.csv");
        fs::write(&path, six_rows()).unwrap();
        let mut session = Session::new(path.clone());
        session.handle(Command::Occupations(set(&["Nurse"]))).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(session.handle(Command::Occupations(set(&["Doctor"]))).is_err());
        assert_eq!(session.selection().unwrap().occupations, set(&["Nurse"]));
    }

    #[test]
    fn run_reads_until_quit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleep.csv");
        fs::write(&path, six_rows()).unwrap();
        let mut session = Session::new(path);

        let input = "occupations Doctor\nfrobnicate\nquit\noccupations Nurse\n";
        let mut output = Vec::new();
        session.run(input.as_bytes(), &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("2 of 6 records selected"));
        assert!(output.contains("unknown command \"frobnicate\""));
        assert_eq!(session.selection().unwrap().occupations, set(&["Doctor"]));
    }
}
