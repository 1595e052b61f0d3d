//! CLI for moving presentation text to spreadsheets and back.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slidetext_core::{sheet, ColumnTransplant, Extractor, ReinsertReport, Reinserter, Table};
use slidetext_pptx::PptxDocument;
use std::path::{Path, PathBuf};

/// Extract slide text for translation and put translations back.
#[derive(Parser, Debug)]
#[command(name = "slidetext")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output directory (default: same as input file)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract all text to spreadsheets
    Extract {
        /// Input presentation (.pptx)
        pptx: PathBuf,
    },
    /// Apply translations from a spreadsheet to a presentation
    Apply {
        /// Input presentation (.pptx)
        pptx: PathBuf,
        /// Spreadsheet with Slide, ShapeIndex and TranslatedText columns
        xlsx: PathBuf,
    },
    /// Copy the third column of one spreadsheet into the fourth of another
    Transplant {
        /// Spreadsheet providing the translated column
        source: PathBuf,
        /// Spreadsheet receiving it
        target: PathBuf,
    },
}

#[derive(Serialize, Debug)]
struct ExtractSummary {
    slides: usize,
    rows: usize,
    filtered_rows: usize,
    all_text: PathBuf,
    filtered: PathBuf,
}

#[derive(Serialize, Debug)]
struct ApplySummary {
    output: PathBuf,
    #[serde(flatten)]
    report: ReinsertReport,
}

#[derive(Serialize, Debug)]
struct TransplantSummary {
    rows: usize,
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Extract { pptx } => {
            let summary = extract(pptx, args.output.as_deref())?;
            if args.json {
                print_json(&summary)?;
            } else {
                println!(
                    "Extracted {} text rows ({} matched) from {} slides",
                    summary.rows, summary.filtered_rows, summary.slides
                );
                println!("  {}", summary.all_text.display());
                println!("  {}", summary.filtered.display());
            }
        }
        Command::Apply { pptx, xlsx } => {
            let summary = apply(pptx, xlsx, args.output.as_deref())?;
            if args.json {
                print_json(&summary)?;
            } else {
                let report = &summary.report;
                println!(
                    "Applied {} translations ({} skipped, {} blank)",
                    report.applied.len(),
                    report.skipped.len(),
                    report.blank
                );
                for skipped in &report.skipped {
                    println!(
                        "  row {}: slide {} shape {}: {}",
                        skipped.row + 2,
                        skipped.slide,
                        skipped.address,
                        skipped.reason
                    );
                }
                println!("  {}", summary.output.display());
            }
        }
        Command::Transplant { source, target } => {
            let summary = transplant(source, target, args.output.as_deref())?;
            if args.json {
                print_json(&summary)?;
            } else {
                println!("Copied {} rows", summary.rows);
                println!("  {}", summary.output.display());
            }
        }
    }

    Ok(())
}

fn extract(pptx: &Path, output_dir: Option<&Path>) -> Result<ExtractSummary> {
    log::debug!("Extracting: {}", pptx.display());
    let document = PptxDocument::open(pptx)
        .with_context(|| format!("Failed to open {}", pptx.display()))?;
    let extraction = document.extract(&Extractor::new());

    let all_bytes = slidetext_xlsx::table_to_bytes(&sheet::all_text_table(&extraction.all))?;
    let filtered_bytes =
        slidetext_xlsx::table_to_bytes(&sheet::translation_table(&extraction.filtered))?;

    let all_text = get_output_path(pptx, output_dir, "_all_text.xlsx")?;
    let filtered = get_output_path(pptx, output_dir, "_vietnamese_only.xlsx")?;
    write_outputs(&[
        (all_text.as_path(), all_bytes.as_slice()),
        (filtered.as_path(), filtered_bytes.as_slice()),
    ])?;

    Ok(ExtractSummary {
        slides: document.presentation().slides.len(),
        rows: extraction.all.len(),
        filtered_rows: extraction
            .filtered
            .iter()
            .filter(|r| !r.source_text.is_empty())
            .count(),
        all_text,
        filtered,
    })
}

fn apply(pptx: &Path, xlsx: &Path, output_dir: Option<&Path>) -> Result<ApplySummary> {
    log::debug!("Applying {} to {}", xlsx.display(), pptx.display());
    let mut document = PptxDocument::open(pptx)
        .with_context(|| format!("Failed to open {}", pptx.display()))?;
    let table = read_table(xlsx)?;
    let input = sheet::read_translation_rows(&table)
        .with_context(|| format!("Failed to read translations from {}", xlsx.display()))?;

    let mut report = input.report;
    let applied = document.apply(
        &Reinserter::new(),
        input.rows.iter().map(|(row, translation)| (*row, translation)),
    )?;
    report.merge(applied);

    let bytes = document.to_bytes()?;
    let output = get_output_path(pptx, output_dir, "_translated.pptx")?;
    write_output(&output, &bytes)?;

    Ok(ApplySummary { output, report })
}

fn transplant(
    source: &Path,
    target: &Path,
    output_dir: Option<&Path>,
) -> Result<TransplantSummary> {
    log::debug!(
        "Transplanting from {} into {}",
        source.display(),
        target.display()
    );
    let source_table = read_table(source)?;
    let target_table = read_table(target)?;

    let table = ColumnTransplant::new()
        .apply(&source_table, &target_table)
        .context("Failed to copy translated column")?;

    let output = get_output_path(target, output_dir, "_modified.xlsx")?;
    slidetext_xlsx::save_table(&table, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(TransplantSummary {
        rows: table.height(),
        output,
    })
}

fn read_table(path: &Path) -> Result<Table> {
    slidetext_xlsx::read_table(path)
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Determine the output path for a processed file.
fn get_output_path(
    input_path: &Path,
    output_dir: Option<&Path>,
    suffix: &str,
) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}{}", stem, suffix);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create output directory: {}", dir.display())
            })?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Written to: {}", path.display());
    Ok(())
}

/// Write several outputs; if one fails, the ones already written are removed.
fn write_outputs(outputs: &[(&Path, &[u8])]) -> Result<()> {
    for (idx, (path, content)) in outputs.iter().enumerate() {
        if let Err(e) = write_output(path, content) {
            for (written, _) in &outputs[..idx] {
                if let Err(remove_err) = std::fs::remove_file(written) {
                    log::warn!("Failed to remove {}: {}", written.display(), remove_err);
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidetext_core::{CellValue, Column};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("slidetext-cli-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn column(header: &str, cells: &[&str]) -> Column {
        Column::new(header, cells.iter().map(|&c| CellValue::from(c)).collect())
    }

    #[test]
    fn test_output_path_next_to_input() {
        let path =
            get_output_path(Path::new("/decks/sermon.pptx"), None, "_all_text.xlsx").unwrap();
        assert_eq!(path, PathBuf::from("/decks/sermon_all_text.xlsx"));
    }

    #[test]
    fn test_output_path_in_output_dir() {
        let dir = std::env::temp_dir().join("slidetext-cli-test-out");
        let path = get_output_path(Path::new("sheet.xlsx"), Some(&dir), "_modified.xlsx").unwrap();
        assert_eq!(path, dir.join("sheet_modified.xlsx"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_failed_write_removes_earlier_outputs() {
        let dir = scratch_dir("rollback");
        let first = dir.join("deck_all_text.xlsx");
        let blocked = dir.join("deck_vietnamese_only.xlsx");
        std::fs::create_dir_all(&blocked).unwrap();

        let result = write_outputs(&[
            (first.as_path(), b"one".as_slice()),
            (blocked.as_path(), b"two".as_slice()),
        ]);

        assert!(result.is_err());
        assert!(!first.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_transplant_schema_error_writes_nothing() {
        let dir = scratch_dir("transplant");
        let source = dir.join("source.xlsx");
        let target = dir.join("target.xlsx");
        let narrow = Table::new(vec![column("Slide", &["1"]), column("ShapeIndex", &["0"])]);
        let wide = Table::new(vec![
            column("Slide", &["1"]),
            column("ShapeIndex", &["0"]),
            column("OriginalText", &["Xin chào"]),
            column("TranslatedText", &[""]),
        ]);
        slidetext_xlsx::save_table(&narrow, &source).unwrap();
        slidetext_xlsx::save_table(&wide, &target).unwrap();

        let result = transplant(&source, &target, None);

        assert!(result.is_err());
        assert!(!dir.join("target_modified.xlsx").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_transplant_writes_modified_copy() {
        let dir = scratch_dir("transplant-ok");
        let source = dir.join("source.xlsx");
        let target = dir.join("target.xlsx");
        let translated = Table::new(vec![
            column("Slide", &["1"]),
            column("ShapeIndex", &["0"]),
            column("Anything", &["Hello"]),
        ]);
        let wide = Table::new(vec![
            column("Slide", &["1"]),
            column("ShapeIndex", &["0"]),
            column("OriginalText", &["Xin chào"]),
            column("Old", &["x"]),
        ]);
        slidetext_xlsx::save_table(&translated, &source).unwrap();
        slidetext_xlsx::save_table(&wide, &target).unwrap();

        let summary = transplant(&source, &target, None).unwrap();

        assert_eq!(summary.output, dir.join("target_modified.xlsx"));
        let written = slidetext_xlsx::read_table(&summary.output).unwrap();
        assert_eq!(written.headers()[3], "TranslatedText");
        assert_eq!(written.cell(0, 3), &CellValue::from("Hello"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_escaped_attributes_parse_alongside_spreadsheet_backend() {
        let xml = r#"<a:t lang="a&amp;b">x</a:t>"#;
        let doc = slidetext_pptx::xml::XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().unwrap().attribute("lang"), Some("a&b"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "slidetext", "apply", "a.pptx", "b.xlsx", "--json", "-o", "out",
        ]);
        assert!(args.json);
        assert_eq!(args.output, Some(PathBuf::from("out")));
        match args.command {
            Command::Apply { pptx, xlsx } => {
                assert_eq!(pptx, PathBuf::from("a.pptx"));
                assert_eq!(xlsx, PathBuf::from("b.xlsx"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
