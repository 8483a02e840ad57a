use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "novelshelf")]
#[command(bin_name = "novelshelf")]
#[command(version)]
#[command(about = "A local library for scraped serial novels")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "NOVELSHELF_DB_PATH",
        default_value = ".novelshelf/library.sqlite",
        help = "Path to the library SQLite database."
    )]
    pub db: String,

    #[arg(
        short = 'c',
        long,
        env = "NOVELSHELF_CONFIG",
        default_value = ".novelshelf/config.toml",
        help = "Path to the optional TOML config file."
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Import a scraped book payload (JSON file, or - for stdin).")]
    Import(FileArgs),
    #[command(about = "Print the reading order of a payload without saving it.")]
    Order(FileArgs),
    #[command(about = "List books, most recently read first.")]
    Books(JsonArgs),
    #[command(about = "Show one book with its reading position.")]
    Show(BookArgs),
    #[command(about = "List a book's chapters in reading order.")]
    Chapters(BookArgs),
    #[command(about = "Print one chapter.")]
    Chapter(ChapterArgs),
    #[command(about = "Attach a summary to a chapter.")]
    Summary(SummaryArgs),
    #[command(about = "Show the reading position of a book.")]
    Position(BookArgs),
    #[command(about = "Move the reading position to a chapter.")]
    Goto(ChapterArgs),
    #[command(about = "Advance to the next chapter.")]
    Next(BookArgs),
    #[command(about = "Go back to the previous chapter.")]
    Prev(BookArgs),
    #[command(about = "Mark a book as completed.")]
    Complete(BookArgs),
    #[command(about = "Clear a book's completed mark.")]
    Uncomplete(BookArgs),
    #[command(about = "Delete a book with its chapters and reading state.")]
    Remove(BookArgs),
    #[command(about = "List the import runs recorded for a book.")]
    History(BookArgs),
    #[command(about = "Print the canonical matching key for a string.")]
    Canon(CanonArgs),
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FileArgs {
    pub path: String,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    pub book_id: String,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ChapterArgs {
    pub book_id: String,
    pub chapter_id: String,

    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    pub book_id: String,
    pub chapter_id: String,

    #[arg(help = "Summary text.")]
    pub text: String,
}

#[derive(Debug, Args)]
pub struct CanonArgs {
    pub text: String,
}
