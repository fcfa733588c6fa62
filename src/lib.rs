// Library root
// ------------
// This crate exposes the pieces of the interactive movie catalog. The
// binary (`main.rs`) wires them together and hands control to the menu.
//
// Module responsibilities:
// - `catalog`: the title -> record mapping and its case-insensitive rules.
// - `storage`: the `CatalogStore` interface with JSON and CSV backends.
// - `api`: movie lookup against the OMDb web service.
// - `dispatcher`: menu commands and their handlers.
// - `site`: static website generation from the catalog.
// - `config`: layered configuration (defaults, TOML file, environment).
// - `ui`: terminal prompts and the interactive loop.
pub mod api;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod site;
pub mod storage;
pub mod ui;

pub use catalog::{Catalog, Record};
pub use storage::{open_store, CatalogStore, CsvStore, JsonStore, StorageError, StorageKind};
