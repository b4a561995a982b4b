//! Command-line operations over the book API.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;

use crate::books::{next_available_id, Book, BookApi, BookDraft, Transport};

/// Fields shared by add and the update commands
#[derive(Debug, Clone, clap::Args)]
pub struct DraftArgs {
  /// Book title
  #[arg(long)]
  pub title: String,

  /// Book author
  #[arg(long)]
  pub author: String,

  /// Link to the book (URL)
  #[arg(long)]
  pub link: Option<String>,
}

impl From<DraftArgs> for BookDraft {
  fn from(args: DraftArgs) -> Self {
    Self {
      title: args.title,
      author: args.author,
      link: args.link,
    }
  }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
  /// List every book
  #[command(alias = "ls")]
  List,
  /// Show a book by id
  Get { id: u64 },
  /// Show a book by exact title
  Title { title: String },
  /// List books by an author
  Author { author: String },
  /// Add a book
  Add(DraftArgs),
  /// Add every book in a JSON file (an array of {title, author, link})
  Import { file: PathBuf },
  /// Delete a book by id
  #[command(alias = "rm")]
  Delete { id: u64 },
  /// Delete a book by exact title
  DeleteTitle { title: String },
  /// Replace a book's fields by id
  Update {
    id: u64,
    #[command(flatten)]
    draft: DraftArgs,
  },
  /// Replace a book's fields by its current title
  UpdateTitle {
    /// Current title
    current: String,
    #[command(flatten)]
    draft: DraftArgs,
  },
  /// Show the smallest unused id (a hint; the server assigns ids)
  NextId,
}

/// Execute `command` against `api`, writing human-readable output to `out`.
pub async fn run<T: Transport>(api: &BookApi<T>, command: Command, out: &mut impl Write) -> Result<()> {
  match command {
    Command::List => {
      let books = api.list_all().await?;
      write_books(out, &books)?;
    }
    Command::Get { id } => {
      let book = api.get_by_id(id).await?;
      writeln!(out, "{}", format_book(&book))?;
    }
    Command::Title { title } => {
      let book = api.get_by_title(&title).await?;
      writeln!(out, "{}", format_book(&book))?;
    }
    Command::Author { author } => {
      let books = api.list_by_author(&author).await?;
      write_books(out, &books)?;
    }
    Command::Add(draft) => {
      let book = api.add(&draft.into()).await?;
      writeln!(out, "Added {}", format_book(&book))?;
    }
    Command::Import { file } => {
      let contents = std::fs::read_to_string(&file)
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
      let drafts: Vec<BookDraft> = serde_json::from_str(&contents)
        .map_err(|e| eyre!("Failed to parse {}: {}", file.display(), e))?;

      let books = api.add_many(&drafts).await?;
      writeln!(out, "Added {} books", books.len())?;
      write_books(out, &books)?;
    }
    Command::Delete { id } => {
      let deleted = api.delete_by_id(id).await?;
      write_deleted(out, deleted, &format!("book {}", id))?;
    }
    Command::DeleteTitle { title } => {
      let deleted = api.delete_by_title(&title).await?;
      write_deleted(out, deleted, &format!("{:?}", title))?;
    }
    Command::Update { id, draft } => {
      let book = api.update_by_id(id, &draft.into()).await?;
      writeln!(out, "Updated {}", format_book(&book))?;
    }
    Command::UpdateTitle { current, draft } => {
      let book = api.update_by_title(&current, &draft.into()).await?;
      writeln!(out, "Updated {}", format_book(&book))?;
    }
    Command::NextId => {
      let books = api.list_all().await?;
      writeln!(out, "Next available id: {}", next_available_id(&books))?;
    }
  }

  Ok(())
}

/// One line per book: id, title, author and the link when there is one.
pub fn format_book(book: &Book) -> String {
  let mut line = format!("#{} {:?} by {}", book.id, book.title, book.author);
  if let Some(link) = &book.link {
    line.push_str(&format!(" <{}>", link));
  }
  line
}

fn write_books(out: &mut impl Write, books: &[Book]) -> Result<()> {
  if books.is_empty() {
    writeln!(out, "No books found.")?;
  }
  for book in books {
    writeln!(out, "{}", format_book(book))?;
  }
  Ok(())
}

fn write_deleted(out: &mut impl Write, deleted: bool, what: &str) -> Result<()> {
  if deleted {
    writeln!(out, "Deleted {}", what)?;
  } else {
    writeln!(out, "Server did not delete {}", what)?;
  }
  Ok(())
}
