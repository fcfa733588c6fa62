// Command dispatcher
// ------------------
// Maps a menu code to a handler. Handlers read what they need through a
// `Prompt`, call into the active `CatalogStore`, and print to any `Write`
// sink. Domain errors are turned into messages here so the menu loop only
// stops on an explicit exit or when the terminal itself fails.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::api::MovieLookup;
use crate::catalog::{Catalog, Record};
use crate::site::SiteGenerator;
use crate::storage::{CatalogStore, StorageError};

/// Menu commands, numbered as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    List,
    Add,
    Delete,
    Update,
    Stats,
    Random,
    Search,
    SortByRating,
    GenerateWebsite,
    OpenWebsite,
}

impl Command {
    /// Every command in menu order.
    pub const ALL: [Command; 11] = [
        Command::Exit,
        Command::List,
        Command::Add,
        Command::Delete,
        Command::Update,
        Command::Stats,
        Command::Random,
        Command::Search,
        Command::SortByRating,
        Command::GenerateWebsite,
        Command::OpenWebsite,
    ];

    pub fn code(self) -> u8 {
        match self {
            Command::Exit => 0,
            Command::List => 1,
            Command::Add => 2,
            Command::Delete => 3,
            Command::Update => 4,
            Command::Stats => 5,
            Command::Random => 6,
            Command::Search => 7,
            Command::SortByRating => 8,
            Command::GenerateWebsite => 9,
            Command::OpenWebsite => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Command::Exit => "Exit",
            Command::List => "List movies",
            Command::Add => "Add movie",
            Command::Delete => "Delete movie",
            Command::Update => "Update movie",
            Command::Stats => "Stats",
            Command::Random => "Random movie",
            Command::Search => "Search movie",
            Command::SortByRating => "Movies sorted by rating",
            Command::GenerateWebsite => "Generate website",
            Command::OpenWebsite => "Open website",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.code() == code)
    }
}

/// Input that does not name a menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid choice '{0}'")]
pub struct InvalidChoice(pub String);

impl FromStr for Command {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Command::from_code)
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

/// The numbered menu, one line per command.
pub fn menu_text() -> String {
    let mut text = String::from("\nMenu:\n");
    for cmd in Command::ALL {
        text.push_str(&format!("{}. {}\n", cmd.code(), cmd.label()));
    }
    text
}

/// Source of user answers. The terminal front end uses dialoguer; tests
/// feed scripted lines.
pub trait Prompt {
    fn ask(&mut self, label: &str) -> Result<String>;
}

/// Whether the menu loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Dispatcher<'a, R = StdRng> {
    store: &'a dyn CatalogStore,
    lookup: &'a dyn MovieLookup,
    site: &'a SiteGenerator,
    rng: R,
}

impl<'a> Dispatcher<'a, StdRng> {
    pub fn new(
        store: &'a dyn CatalogStore,
        lookup: &'a dyn MovieLookup,
        site: &'a SiteGenerator,
    ) -> Self {
        Self::with_rng(store, lookup, site, StdRng::from_entropy())
    }
}

impl<'a, R: Rng> Dispatcher<'a, R> {
    pub fn with_rng(
        store: &'a dyn CatalogStore,
        lookup: &'a dyn MovieLookup,
        site: &'a SiteGenerator,
        rng: R,
    ) -> Self {
        Self {
            store,
            lookup,
            site,
            rng,
        }
    }

    /// Show the menu and run commands until the user exits.
    pub fn run(&mut self, prompt: &mut dyn Prompt, out: &mut dyn Write) -> Result<()> {
        loop {
            write!(out, "{}", menu_text())?;
            let choice = prompt.ask("Choose an option")?;
            match choice.parse::<Command>() {
                Ok(command) => {
                    if self.dispatch(command, prompt, out)? == Flow::Exit {
                        return Ok(());
                    }
                }
                Err(err) => {
                    debug!("{}", err);
                    writeln!(out, "Invalid choice.")?;
                }
            }
        }
    }

    /// Run a single command.
    pub fn dispatch(
        &mut self,
        command: Command,
        prompt: &mut dyn Prompt,
        out: &mut dyn Write,
    ) -> Result<Flow> {
        debug!(?command, "dispatching");
        match command {
            Command::Exit => {
                writeln!(out, "Bye!")?;
                return Ok(Flow::Exit);
            }
            Command::List => self.list(out)?,
            Command::Add => self.add(prompt, out)?,
            Command::Delete => self.delete(prompt, out)?,
            Command::Update => self.update(prompt, out)?,
            Command::Stats => self.stats(out)?,
            Command::Random => self.random(out)?,
            Command::Search => self.search(prompt, out)?,
            Command::SortByRating => self.sort_by_rating(out)?,
            Command::GenerateWebsite => self.generate_website(out)?,
            Command::OpenWebsite => self.open_website(out)?,
        }
        Ok(Flow::Continue)
    }

    fn list(&self, out: &mut dyn Write) -> Result<()> {
        let movies = self.store.list();
        writeln!(out, "{} movies in total", movies.len())?;
        for (title, record) in &movies {
            writeln!(out, "\n{}", title)?;
            writeln!(out, "year: {}", record.year)?;
            writeln!(out, "rating: {}", record.rating)?;
            writeln!(out, "poster: {}", record.poster)?;
        }
        Ok(())
    }

    fn add(&self, prompt: &mut dyn Prompt, out: &mut dyn Write) -> Result<()> {
        let title = prompt.ask("Enter movie title")?.trim().to_string();
        if title.is_empty() {
            writeln!(out, "Title cannot be empty.")?;
            return Ok(());
        }

        // A failed lookup must not touch storage.
        let record = match self.lookup.lookup(&title) {
            Ok(record) => record,
            Err(err) => {
                writeln!(out, "Could not add movie: {}", err)?;
                return Ok(());
            }
        };

        match self.store.add(&title, record) {
            Ok(()) => writeln!(out, "Movie '{}' added!", title)?,
            Err(StorageError::AlreadyExists(existing)) => {
                writeln!(out, "Movie '{}' already exists!", existing)?
            }
            Err(err) => writeln!(out, "Could not save movie: {}", err)?,
        }
        Ok(())
    }

    fn delete(&self, prompt: &mut dyn Prompt, out: &mut dyn Write) -> Result<()> {
        let title = prompt.ask("Enter movie title to delete")?;
        let title = title.trim();
        match self.store.delete(title) {
            Ok(stored) => writeln!(out, "Movie '{}' deleted!", stored)?,
            Err(StorageError::NotFound(_)) => writeln!(out, "Movie '{}' not found.", title)?,
            Err(err) => writeln!(out, "Could not delete movie: {}", err)?,
        }
        Ok(())
    }

    fn update(&self, prompt: &mut dyn Prompt, out: &mut dyn Write) -> Result<()> {
        let title = prompt.ask("Enter movie title to update")?;
        let rating = prompt.ask("Enter new rating")?;
        let (title, rating) = (title.trim(), rating.trim());
        if rating.is_empty() {
            writeln!(out, "Rating cannot be empty.")?;
            return Ok(());
        }
        match self.store.update(title, rating) {
            Ok(stored) => writeln!(out, "Movie '{}' updated!", stored)?,
            Err(StorageError::NotFound(_)) => writeln!(out, "Movie '{}' not found.", title)?,
            Err(err) => writeln!(out, "Could not update movie: {}", err)?,
        }
        Ok(())
    }

    fn stats(&self, out: &mut dyn Write) -> Result<()> {
        let movies = self.store.list();
        if movies.is_empty() {
            writeln!(out, "No movies in database.")?;
            return Ok(());
        }
        writeln!(out, "Total movies: {}", movies.len())?;
        match movies.average_rating() {
            Some(avg) => writeln!(out, "Average rating: {:.1}", avg)?,
            None => writeln!(out, "No numeric ratings to average.")?,
        }
        Ok(())
    }

    fn random(&mut self, out: &mut dyn Write) -> Result<()> {
        let movies = self.store.list();
        let entries: Vec<(&str, &Record)> = movies.iter().collect();
        match entries.choose(&mut self.rng) {
            Some((title, record)) => {
                writeln!(out, "\nRandom movie: {}", title)?;
                print_summary(out, record)?;
            }
            None => writeln!(out, "No movies found.")?,
        }
        Ok(())
    }

    fn search(&self, prompt: &mut dyn Prompt, out: &mut dyn Write) -> Result<()> {
        let needle = prompt.ask("Search title")?;
        let movies = self.store.list();
        let found = movies.search(needle.trim());
        if found.is_empty() {
            writeln!(out, "No matching movie found.")?;
            return Ok(());
        }
        print_entries(out, found)
    }

    fn sort_by_rating(&self, out: &mut dyn Write) -> Result<()> {
        let movies = self.store.list();
        if movies.is_empty() {
            writeln!(out, "No movies in database.")?;
            return Ok(());
        }
        print_entries(out, movies.sorted_by_rating())
    }

    fn generate_website(&self, out: &mut dyn Write) -> Result<()> {
        let movies: Catalog = self.store.list();
        match self.site.generate(&movies) {
            Ok(path) => writeln!(
                out,
                "Website was generated successfully: {}",
                path.display()
            )?,
            Err(err) => writeln!(
                out,
                "Something went wrong while generating the website: {}",
                err
            )?,
        }
        Ok(())
    }

    fn open_website(&self, out: &mut dyn Write) -> Result<()> {
        match self.site.open() {
            Ok(_) => writeln!(out, "Opening website in the browser...")?,
            Err(err) => writeln!(out, "Could not open website: {}", err)?,
        }
        Ok(())
    }
}

fn print_summary(out: &mut dyn Write, record: &Record) -> Result<()> {
    writeln!(out, "Rating: {}", record.rating)?;
    writeln!(out, "Year: {}", record.year)?;
    Ok(())
}

fn print_entries(out: &mut dyn Write, entries: Vec<(&str, &Record)>) -> Result<()> {
    for (title, record) in entries {
        writeln!(out, "\n{}", title)?;
        print_summary(out, record)?;
    }
    Ok(())
}
