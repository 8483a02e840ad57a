mod app;
mod canonical;
mod cli;
mod config;
mod db;
mod domain;
mod imports;
mod linearize;
mod logging;
mod navigation;
mod numbering;
mod resolver;
mod store;

use app::{App, AppError};
use domain::book::{BookRecord, CurrentPosition};
use domain::chapter::Direction;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    if let Commands::Canon(args) = &cli.command {
        println!("{}", canonical::canonicalize(&args.text));
        return Ok(());
    }

    let config = config::Config::load(&cli.config)?;
    logging::init(&config.log.filter).map_err(|err| AppError::Logging(err.to_string()))?;
    tracing::debug!(db = %cli.db, config = %cli.config.display(), "starting");

    if let Commands::Order(args) = &cli.command {
        let patterns = config.numbering_patterns()?;
        let payload = imports::read_payload(&args.path)?;
        let sequence = imports::plan_order(payload, &patterns);
        if args.json {
            print_json(&serde_json::json!({
                "head_rule": sequence.head_rule,
                "chained": sequence.chained,
                "orphaned": sequence.orphaned,
                "discarded": sequence.discarded,
                "order": sequence.ids(),
            }));
        } else {
            for (index, chapter) in sequence.chapters.iter().enumerate() {
                println!("{:>4}  {}  {}", index + 1, chapter.self_id, chapter.title);
            }
        }
        return Ok(());
    }

    let mut app = App::open(&cli.db, &config)?;
    match cli.command {
        Commands::Import(args) => {
            let summary = app.import_file(&args.path)?;
            if args.json {
                print_json(&summary);
            } else {
                println!(
                    "imported {} ({} chapters, head: {}): inserted={} updated={} unchanged={} retained={} summaries_kept={}",
                    summary.book_id,
                    summary.chapters,
                    summary.head_rule.as_str(),
                    summary.saved.inserted,
                    summary.saved.updated,
                    summary.saved.unchanged,
                    summary.saved.retained,
                    summary.saved.preserved_summaries,
                );
            }
        }
        Commands::Books(args) => {
            let books = app.books()?;
            if args.json {
                print_json(&books);
            } else if books.is_empty() {
                println!("no books");
            } else {
                for book in &books {
                    println!("{}", book_line(book));
                }
            }
        }
        Commands::Show(args) => {
            let view = app.show_book(&args.book_id)?;
            if args.json {
                print_json(&view);
            } else {
                println!("{}", book_line(&view.book));
                if !view.book.author_name.is_empty() {
                    println!("author: {}", view.book.author_name);
                }
                println!("chapters: {}", view.book.chapter_count);
                match &view.position {
                    Some(position) => println!("position: {}", position_line(position)),
                    None => println!("position: not started"),
                }
            }
        }
        Commands::Chapters(args) => {
            let chapters = app.chapters(&args.book_id)?;
            if args.json {
                print_json(&chapters);
            } else {
                for row in &chapters {
                    let marker = if row.has_summary { "*" } else { " " };
                    println!("{:>4}{} {}  {}", row.index, marker, row.id, row.title);
                }
            }
        }
        Commands::Chapter(args) => {
            let chapter = app.chapter(&args.book_id, &args.chapter_id)?;
            if args.json {
                print_json(&chapter);
            } else {
                println!("{}\n", chapter.title);
                println!("{}", chapter.body);
                if let Some(summary) = &chapter.summary {
                    println!("\nsummary: {}", summary);
                }
            }
        }
        Commands::Summary(args) => {
            let chapter = app.save_summary(&args.book_id, &args.chapter_id, &args.text)?;
            println!("saved summary for {}", chapter.self_id);
        }
        Commands::Position(args) => {
            let position = app.position(&args.book_id)?;
            if args.json {
                print_json(&position);
            } else {
                match position {
                    Some(position) => println!("{}", position_line(&position)),
                    None => println!("no position recorded for {}", args.book_id),
                }
            }
        }
        Commands::Goto(args) => {
            let position = app.goto(&args.book_id, &args.chapter_id)?;
            if args.json {
                print_json(&position);
            } else {
                println!("now at {}", position_line(&position));
            }
        }
        Commands::Next(args) => step(&mut app, &args.book_id, Direction::Next, args.json)?,
        Commands::Prev(args) => step(&mut app, &args.book_id, Direction::Prev, args.json)?,
        Commands::Complete(args) => {
            let book = app.complete(&args.book_id)?;
            if args.json {
                print_json(&book);
            } else {
                println!("completed {}", book.id);
            }
        }
        Commands::Uncomplete(args) => {
            let book = app.uncomplete(&args.book_id)?;
            if args.json {
                print_json(&book);
            } else {
                println!("reopened {}", book.id);
            }
        }
        Commands::Remove(args) => {
            let removed = app.remove(&args.book_id)?;
            if args.json {
                print_json(&serde_json::json!({ "book_id": args.book_id, "removed": removed }));
            } else if removed {
                println!("removed {}", args.book_id);
            } else {
                println!("no book {}", args.book_id);
            }
        }
        Commands::History(args) => {
            let runs = app.history(&args.book_id)?;
            if args.json {
                print_json(&runs);
            } else {
                for run in &runs {
                    println!(
                        "{}  {}  chapters={} inserted={} updated={} unchanged={} retained={}",
                        run.ran_at,
                        run.run_id,
                        run.chapter_count,
                        run.inserted,
                        run.updated,
                        run.unchanged,
                        run.retained,
                    );
                }
            }
        }
        Commands::Order(_) | Commands::Canon(_) => unreachable!("handled before opening the library"),
    }
    Ok(())
}

fn step(app: &mut App, book_id: &str, direction: Direction, json: bool) -> Result<(), AppError> {
    let view = app.step(book_id, direction)?;
    if json {
        print_json(&view);
    } else if view.moved {
        println!("{}  {}", view.chapter.self_id, view.chapter.title);
    } else {
        println!(
            "no {} chapter; staying at {}",
            direction.as_str(),
            view.chapter.self_id
        );
    }
    Ok(())
}

fn book_line(book: &BookRecord) -> String {
    let status = if book.is_completed() { " [done]" } else { "" };
    format!("{}  {}{}", book.id, book.title, status)
}

fn position_line(position: &CurrentPosition) -> String {
    match &position.chapter_title {
        Some(title) => format!("{} ({})", position.chapter_id, title),
        None => position.chapter_id.clone(),
    }
}
