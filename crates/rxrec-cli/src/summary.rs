use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use rxrec_match::CheckpointStore;
use rxrec_model::{Match, MatchScore};
use rxrec_ops::git::{PullAction, RepoStatus};
use rxrec_ops::server::ConfigureReport;

use rxrec_cli::pipeline::{RunReport, StageReport};

pub fn print_summary(report: &RunReport, store: &CheckpointStore) {
    for line in resume_notices(report, store) {
        println!("{line}");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Input"),
        header_cell("Matched"),
        header_cell("Remaining"),
        header_cell("Source"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=3 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    table.add_row(stage_row(&report.local));
    table.add_row(stage_row(&report.dictionary));
    if let Some(choice) = &report.choice {
        table.add_row(vec![
            stage_cell("choice"),
            Cell::new(choice.input),
            Cell::new(choice.matches.len()),
            count_cell(choice.skipped + choice.pending, Color::Yellow),
            if choice.resumed {
                dim_cell("resumed")
            } else {
                dim_cell("operator")
            },
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.source_records).add_attribute(Attribute::Bold),
        Cell::new(report.matched()).add_attribute(Attribute::Bold),
        count_cell(report.unmatched(), Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");

    match &report.choice {
        Some(choice) if choice.interrupted => {
            println!(
                "Input ended with {} record(s) undecided; run again to resume.",
                choice.pending
            );
            println!("Progress: {}", store.intermediates_dir().display());
        }
        Some(_) => {
            println!("Matches: {}", store.final_choice_path().display());
            println!("Unmatched: {}", store.final_unmatched_path().display());
        }
        None => {
            println!(
                "Unmatched after automatic stages: {}",
                store.unmatched_path(report.dictionary.stage).display()
            );
        }
    }
}

/// Print one table per stage listing its matches.
pub fn print_matches(report: &RunReport) {
    print_match_table(report.local.stage.as_str(), &report.local.matches);
    print_match_table(report.dictionary.stage.as_str(), &report.dictionary.matches);
    if let Some(choice) = &report.choice {
        print_match_table("choice", &choice.matches);
    }
}

fn print_match_table(title: &str, matches: &[Match]) {
    println!("{title}: {} match(es)", matches.len());
    if matches.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Name"),
        header_cell("Attribute"),
        header_cell("Reference"),
        header_cell("Matched name"),
        header_cell("Score"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 5, CellAlignment::Right);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(12)),
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
        ]);
    }
    for found in matches {
        table.add_row(vec![
            Cell::new(&found.source_code).fg(Color::Blue),
            Cell::new(&found.display_name),
            Cell::new(&found.attribute),
            Cell::new(&found.reference_code),
            Cell::new(&found.matched_name),
            score_cell(found.score),
        ]);
    }
    println!("{table}");
}

pub fn print_configure(report: &ConfigureReport) {
    println!("{}", report.properties_path.display());
    print!("{}", report.before);
    if report.config_files.is_empty() {
        println!("No JSON files found in the PIH config directory.");
    } else {
        println!("Config files: {}", report.config_files.join(", "));
    }
    if report.appended.is_empty() {
        println!("Runtime properties already point at the PIH config.");
        return;
    }
    for line in &report.appended {
        println!("+ {line}");
    }
    print!("{}", report.after);
}

pub fn print_repo_status(statuses: &[RepoStatus]) {
    if statuses.is_empty() {
        println!("All checkouts are clean and on the main branch.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Checkout"),
        header_cell("Branch"),
        header_cell("Changes"),
    ]);
    apply_table_style(&mut table);
    for status in statuses {
        let changes = status.changes.trim_end();
        table.add_row(vec![
            Cell::new(&status.dir).fg(Color::Blue),
            Cell::new(&status.branch),
            if changes.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(changes).fg(Color::Yellow)
            },
        ]);
    }
    println!("{table}");
}

pub fn print_pull(actions: &[(String, PullAction)]) {
    for (dir, action) in actions {
        let verb = match action {
            PullAction::Pulled => "pulled",
            PullAction::Fetched => "fetched",
        };
        println!("{dir}: {verb}");
    }
}

/// Print checkout names, one per line, or a note when there are none.
pub fn print_dirs(dirs: &[String], none: &str) {
    if dirs.is_empty() {
        println!("{none}");
    }
    for dir in dirs {
        println!("{dir}");
    }
}

/// One line per stage that was picked up from disk instead of computed.
pub fn resume_notices(report: &RunReport, store: &CheckpointStore) -> Vec<String> {
    let mut notices = Vec::new();
    for stage in [&report.local, &report.dictionary] {
        if stage.resumed {
            notices.push(format!(
                "{}: checkpoint found, skipped stage ({})",
                stage.stage.as_str(),
                store.matches_path(stage.stage).display()
            ));
        }
    }
    if report.choice.as_ref().is_some_and(|choice| choice.resumed) {
        notices.push(format!(
            "choice: resumed operator session ({})",
            store.choice_pending_path().display()
        ));
    }
    notices
}

fn stage_row(stage: &StageReport) -> Vec<Cell> {
    vec![
        stage_cell(stage.stage.as_str()),
        Cell::new(stage.input),
        Cell::new(stage.matches.len()),
        count_cell(stage.remaining, Color::Yellow),
        if stage.resumed {
            dim_cell("checkpoint")
        } else {
            dim_cell("computed")
        },
    ]
}

fn stage_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn score_cell(score: MatchScore) -> Cell {
    match score.value() {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn count_cell(value: usize, color: Color) -> Cell {
    if value == 0 {
        dim_cell(value)
    } else {
        Cell::new(value).fg(color)
    }
}
