//! Shared helpers for the integration tests: scripted terminal input, a
//! controllable lookup, and a temp-dir fixture that wires a dispatcher to
//! either storage backend.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use movie_catalog::api::{LookupError, MovieLookup};
use movie_catalog::dispatcher::{Command, Dispatcher, Flow, Prompt};
use movie_catalog::site::{SiteConfig, SiteGenerator};
use movie_catalog::{open_store, CatalogStore, Record, StorageKind};

/// Answers prompts from a fixed script; running out is an error, like a
/// closed terminal.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, label: &str) -> Result<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for '{}'", label))
    }
}

/// Lookup that answers from a fixed record or fails, remembering queries.
#[derive(Debug, Default)]
pub struct StubLookup {
    record: Option<Record>,
    pub queries: RefCell<Vec<String>>,
}

impl StubLookup {
    pub fn returning(record: Record) -> Self {
        Self {
            record: Some(record),
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

impl MovieLookup for StubLookup {
    fn lookup(&self, title: &str) -> Result<Record, LookupError> {
        self.queries.borrow_mut().push(title.to_string());
        self.record
            .clone()
            .ok_or_else(|| LookupError::NotFound(title.to_string()))
    }
}

/// Temp directory holding a catalog file, template and output page.
pub struct Fixture {
    pub dir: TempDir,
    pub store: Box<dyn CatalogStore>,
    pub site: SiteGenerator,
}

impl Fixture {
    pub fn new(kind: StorageKind) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let file = match kind {
            StorageKind::Json => "movies.json",
            StorageKind::Csv => "movies.csv",
        };
        let store = open_store(kind, dir.path().join("data").join(file));
        let site = SiteGenerator::new(SiteConfig {
            template: dir.path().join("template.html"),
            output: dir.path().join("index.html"),
            title: "Test Movies".to_string(),
        });
        Self { dir, store, site }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn seed(&self, movies: &[(&str, &str, &str, &str)]) {
        for (title, year, rating, poster) in movies {
            self.store
                .add(title, Record::new(*year, *rating, *poster))
                .expect("seed movie");
        }
    }

    /// Put a directory where the store writes its temp file, so every
    /// save fails while reads keep working.
    pub fn block_writes(&self) {
        let mut tmp = self.store.path().as_os_str().to_owned();
        tmp.push(".tmp");
        std::fs::create_dir_all(&tmp).expect("block temp path");
    }

    /// Run one command with scripted answers and return what it printed.
    pub fn run(&self, lookup: &StubLookup, command: Command, answers: &[&str]) -> (Flow, String) {
        let mut dispatcher =
            Dispatcher::with_rng(self.store.as_ref(), lookup, &self.site, StdRng::seed_from_u64(7));
        let mut prompt = ScriptedPrompt::new(answers);
        let mut out = Vec::new();
        let flow = dispatcher
            .dispatch(command, &mut prompt, &mut out)
            .expect("dispatch");
        (flow, String::from_utf8(out).expect("utf8 output"))
    }

    /// Drive the full menu loop with scripted answers.
    pub fn run_menu(&self, lookup: &StubLookup, answers: &[&str]) -> Result<String> {
        let mut dispatcher =
            Dispatcher::with_rng(self.store.as_ref(), lookup, &self.site, StdRng::seed_from_u64(7));
        let mut prompt = ScriptedPrompt::new(answers);
        let mut out = Vec::new();
        dispatcher.run(&mut prompt, &mut out)?;
        Ok(String::from_utf8(out).expect("utf8 output"))
    }
}

pub const BACKENDS: [StorageKind; 2] = [StorageKind::Json, StorageKind::Csv];
