//! Output rendering and formatting

use banker_resources::safety::snapshot_safe_sequence;
use banker_sim::SimulationReport;
use banker_types::{ColorChoice, DemandPolicy, LedgerSnapshot, OutputFormat, RequesterId};
use comfy_table::presets::{ASCII_FULL, UTF8_FULL};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use serde::Serialize;
use std::io;

/// State of the ledger at one point, as printed by `check`
#[derive(Debug, Serialize)]
pub struct StateView<'a> {
    pub policy: DemandPolicy,
    pub snapshot: &'a LedgerSnapshot,
    pub safe_sequence: Option<&'a [RequesterId]>,
}

impl StateView<'_> {
    fn is_safe(&self) -> bool {
        self.safe_sequence.is_some()
    }
}

#[derive(Serialize)]
struct RunDocument<'a> {
    initial: &'a StateView<'a>,
    report: &'a SimulationReport,
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    format: OutputFormat,
    color_choice: ColorChoice,
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(format: OutputFormat, color_choice: ColorChoice) -> Self {
        Self {
            format,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render the result of `check`
    pub fn render_check(&self, state: &StateView<'_>) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return render_json(state);
        }
        self.render_state("Initial state", state)?;
        self.render_verdict(state.is_safe());
        Ok(())
    }

    /// Print the state a run starts from (JSON output waits for the report)
    pub fn render_initial_state(&self, state: &StateView<'_>) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        self.render_state("Initial state", state)
    }

    /// Render the outcome of `run`
    pub fn render_report(
        &self,
        initial: &StateView<'_>,
        report: &SimulationReport,
    ) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return render_json(&RunDocument { initial, report });
        }

        println!();
        println!(
            "{}",
            self.style_heading(&format!(
                "Requesters ({:.1}s)",
                report.elapsed.as_secs_f64()
            ))
        );
        let mut table = self.new_table();
        table.set_header(vec![
            self.header("Requester"),
            self.header("Grants"),
            self.header("Denials"),
        ]);
        for stats in &report.requesters {
            table.add_row(vec![
                Cell::new(stats.requester),
                Cell::new(stats.grants),
                Cell::new(stats.denials),
            ]);
        }
        table.add_row(vec![
            Cell::new("total").add_attribute(Attribute::Bold),
            Cell::new(report.grants()),
            Cell::new(report.denials()),
        ]);
        println!("{table}");

        let final_sequence = snapshot_safe_sequence(&report.final_snapshot);
        self.render_state(
            "Final state",
            &StateView {
                policy: initial.policy,
                snapshot: &report.final_snapshot,
                safe_sequence: final_sequence.as_deref(),
            },
        )?;
        self.render_verdict(report.final_safe);
        Ok(())
    }

    fn render_state(&self, title: &str, state: &StateView<'_>) -> io::Result<()> {
        let snapshot = state.snapshot;
        println!();
        println!(
            "{} (policy: {})",
            self.style_heading(title),
            state.policy
        );

        let mut table = self.new_table();
        table.set_header(vec![
            self.header("Requester"),
            self.header("Maximum"),
            self.header("Allocation"),
            self.header("Need"),
        ]);
        for i in 0..snapshot.requesters() {
            table.add_row(vec![
                Cell::new(RequesterId(i)),
                Cell::new(&snapshot.maximum[i]),
                Cell::new(&snapshot.allocation[i]),
                Cell::new(&snapshot.need[i]),
            ]);
        }
        println!("{table}");
        println!("Available: {} of {}", snapshot.available, snapshot.total);

        if let Some(sequence) = state.safe_sequence {
            println!("Safe sequence: {}", format_sequence(sequence));
        }
        Ok(())
    }

    fn render_verdict(&self, safe: bool) {
        let (text, style) = if safe {
            ("[OK] State is safe", Style::new().green())
        } else {
            ("[ERROR] State is unsafe", Style::new().red())
        };
        if self.supports_color() {
            println!("{}", style.apply_to(text));
        } else {
            println!("{text}");
        }
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        let preset = if self.format == OutputFormat::Plain {
            ASCII_FULL
        } else {
            UTF8_FULL
        };
        table
            .load_preset(preset)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.supports_color() {
            table.force_no_tty();
        }
        table
    }

    fn header(&self, name: &str) -> Cell {
        let cell = Cell::new(name).add_attribute(Attribute::Bold);
        if self.supports_color() {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }

    fn style_heading(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        if self.format == OutputFormat::Plain {
            return false;
        }
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn render_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}

/// `C1 -> C3 -> C0`
pub fn format_sequence(sequence: &[RequesterId]) -> String {
    sequence
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
