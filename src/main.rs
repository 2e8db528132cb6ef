//! folio - inspect packaged documents and exercise overlay selection

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use folio::io::FileSource;
use folio::reader::{Point, Rect, SurfaceLayout};
use folio::{
    EngineConfig, LoadState, MemoryClipboard, PageKind, PointerTarget, ReaderSession,
    TableOfContents,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Packaged-document reader engine", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio info scan.epub                 Show package metadata
    folio toc scan.epub                  List pages in reading order
    folio render scan.epub --page 3      Print the rendered markup of page 3
    folio select scan.epub --page 1 --rect 0,0,400,300
                                         Drag-select over page 1 and print the text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show package metadata
    Info {
        #[arg(value_name = "FILE")]
        file: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List pages with their titles
    Toc {
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Render one page (1-based)
    Render {
        #[arg(value_name = "FILE")]
        file: String,

        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Drag a rectangle over a page's text layer and print the selection
    Select {
        #[arg(value_name = "FILE")]
        file: String,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Drag rectangle in pixels: LEFT,TOP,RIGHT,BOTTOM
        #[arg(long, value_parser = parse_rect)]
        rect: Rect,

        /// Page container width in pixels
        #[arg(long, default_value_t = 1000.0)]
        width: f64,

        /// Page container height in pixels
        #[arg(long, default_value_t = 1400.0)]
        height: f64,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "folio=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Info { file, json } => show_info(&file, json).await,
        Command::Toc { file } => show_toc(&file).await,
        Command::Render { file, page } => show_page(&file, page).await,
        Command::Select {
            file,
            page,
            rect,
            width,
            height,
        } => select(&file, page, rect, width, height).await,
    }
}

async fn open(path: &str) -> Result<ReaderSession, String> {
    let source = FileSource::open(path).map_err(|e| format!("{path}: {e}"))?;
    let mut session = ReaderSession::new(EngineConfig::from_env());
    if let LoadState::Failed(message) = session.open(Arc::new(source)).await.clone() {
        return Err(message);
    }
    Ok(session)
}

async fn open_at(path: &str, page: usize) -> Result<ReaderSession, String> {
    let mut session = open(path).await?;
    let index = page
        .checked_sub(1)
        .filter(|&i| i < session.page_count())
        .ok_or_else(|| format!("page {page} out of range (1-{})", session.page_count()))?;
    session.go_to(index).await;
    Ok(session)
}

async fn show_info(path: &str, json: bool) -> Result<(), String> {
    let session = open(path).await?;
    let book = session.book().ok_or("no book loaded")?;
    let meta = book.metadata();

    if json {
        let value = serde_json::json!({
            "metadata": meta,
            "spine": book.spine(),
            "pages": book.pages().len(),
            "toc": book.toc(),
        });
        let text = serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("File: {path}");
    println!("Title: {}", meta.title);
    println!("Author: {}", meta.creator);
    println!("Language: {}", meta.language);
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    let desc = meta.description.trim();
    if !desc.is_empty() {
        match desc.char_indices().nth(200) {
            Some((cut, _)) => println!("Description: {}...", &desc[..cut]),
            None => println!("Description: {desc}"),
        }
    }
    println!("Spine items: {}", book.spine().len());
    println!("Pages: {}", book.pages().len());
    println!("TOC entries: {}", book.toc().len());

    Ok(())
}

async fn show_toc(path: &str) -> Result<(), String> {
    let session = open(path).await?;
    let toc: TableOfContents = session.toc();
    for entry in toc.entries() {
        println!("{:>4}  {}  ({})", entry.index + 1, entry.title, entry.path);
    }
    Ok(())
}

async fn show_page(path: &str, page: usize) -> Result<(), String> {
    let session = open_at(path, page).await?;
    let model = session.page().ok_or("page could not be rendered")?;

    let kind = match model.kind {
        PageKind::Overlay => "overlay",
        PageKind::Flowed => "flowed",
    };
    println!("Page {page}: {} [{kind}]", model.title);
    if let Some(layer) = &model.text_layer {
        println!("Text elements: {}", layer.len());
    }
    for asset in &model.unresolved_assets {
        println!("Unresolved: {asset}");
    }
    println!();
    println!("{}", model.markup);
    Ok(())
}

async fn select(path: &str, page: usize, rect: Rect, width: f64, height: f64) -> Result<(), String> {
    let mut session = open_at(path, page).await?;
    if session.selection().layer().is_none() {
        return Err(format!("page {page} has no text layer"));
    }

    session.set_layout(SurfaceLayout::new(Rect::new(0.0, 0.0, width, height)));
    session.pointer_down(PointerTarget::Surface, Point::new(rect.left, rect.top));
    session.pointer_move(Point::new(rect.right, rect.bottom), false);
    session.pointer_up(PointerTarget::Surface, false);

    let clipboard = MemoryClipboard::new();
    match session.copy(&clipboard).await {
        Some(text) => println!("{text}"),
        None => eprintln!("nothing selected"),
    }
    for notice in session.take_notices() {
        tracing::info!(?notice, "notice");
    }
    Ok(())
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match values.as_slice() {
        &[left, top, right, bottom] => Ok(Rect::new(left, top, right, bottom)),
        _ => Err("expected LEFT,TOP,RIGHT,BOTTOM".to_string()),
    }
}
