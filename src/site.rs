// Static website generation: fills an HTML template with one tile per movie
// and writes the result next to the catalog. Only reads the catalog.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::storage::write_atomic;

const TITLE_TOKEN: &str = "__TEMPLATE_TITLE__";
const GRID_TOKEN: &str = "__TEMPLATE_MOVIE_GRID__";

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("template file not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("generated page not found: {} (generate the website first)", .0.display())]
    PageMissing(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not launch browser: {0}")]
    Opener(#[source] io::Error),

    #[error("browser launcher failed: {0}")]
    OpenerExit(ExitStatus),
}

/// Where the template lives, where the page goes and what it is called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_template")]
    pub template: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            output: default_output(),
            title: default_title(),
        }
    }
}

fn default_template() -> PathBuf {
    PathBuf::from("templates/index_template.html")
}

fn default_output() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_title() -> String {
    "My Movie Website".to_string()
}

#[derive(Debug, Clone)]
pub struct SiteGenerator {
    config: SiteConfig,
}

impl SiteGenerator {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    pub fn output_path(&self) -> &Path {
        &self.config.output
    }

    /// Substitute both template tokens.
    pub fn render(&self, template: &str, catalog: &Catalog) -> String {
        template
            .replace(TITLE_TOKEN, &escape_html(&self.config.title))
            .replace(GRID_TOKEN, &movie_grid(catalog))
    }

    /// Render the catalog into the configured output file.
    pub fn generate(&self, catalog: &Catalog) -> Result<PathBuf, SiteError> {
        let template_path = &self.config.template;
        let template = fs::read_to_string(template_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SiteError::TemplateMissing(template_path.clone())
            } else {
                SiteError::Io {
                    path: template_path.clone(),
                    source,
                }
            }
        })?;

        let page = self.render(&template, catalog);
        let output = &self.config.output;
        write_atomic(output, page.as_bytes()).map_err(|source| SiteError::Io {
            path: output.clone(),
            source,
        })?;
        info!(path = %output.display(), movies = catalog.len(), "website generated");
        Ok(output.clone())
    }

    /// Open the generated page in the default browser.
    pub fn open(&self) -> Result<PathBuf, SiteError> {
        let output = &self.config.output;
        let absolute =
            fs::canonicalize(output).map_err(|_| SiteError::PageMissing(output.clone()))?;
        debug!(path = %absolute.display(), "opening website");
        run_opener(opener(&absolute))?;
        Ok(absolute)
    }
}

fn movie_grid(catalog: &Catalog) -> String {
    let mut grid = String::new();
    for (title, record) in catalog {
        let year = if record.year.is_empty() {
            "N/A"
        } else {
            record.year.as_str()
        };
        grid.push_str(&format!(
            "\n        <li>\n            <div class=\"movie\">\n                <img class=\"movie-poster\" src=\"{}\" />\n                <div class=\"movie-title\">{}</div>\n                <div class=\"movie-year\">{}</div>\n            </div>\n        </li>\n",
            escape_html(&record.poster),
            escape_html(title),
            escape_html(year),
        ));
    }
    grid
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Run the launcher to completion. The platform launchers hand the page to
/// the browser and exit, so waiting here does not block on the browser and
/// leaves no unreaped child behind.
fn run_opener(mut launcher: Command) -> Result<(), SiteError> {
    let status = launcher.status().map_err(SiteError::Opener)?;
    if !status.success() {
        return Err(SiteError::OpenerExit(status));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Record;
    use tempfile::tempdir;

    fn generator(dir: &Path) -> SiteGenerator {
        SiteGenerator::new(SiteConfig {
            template: dir.join("template.html"),
            output: dir.join("out").join("index.html"),
            title: "Movies & More".to_string(),
        })
    }

    #[test]
    fn render_fills_both_tokens_and_escapes_text() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new();
        catalog.insert("<Heat>", Record::new("1995", "8.3", "h.jpg"));
        let page = generator(dir.path()).render(
            "<title>__TEMPLATE_TITLE__</title><ul>__TEMPLATE_MOVIE_GRID__</ul>",
            &catalog,
        );
        assert!(page.contains("<title>Movies &amp; More</title>"));
        assert!(page.contains("<div class=\"movie-title\">&lt;Heat&gt;</div>"));
        assert!(page.contains("src=\"h.jpg\""));
        assert!(!page.contains("__TEMPLATE_"));
    }

    #[test]
    fn empty_year_renders_placeholder() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new();
        catalog.insert("Heat", Record::new("", "8.3", ""));
        let page = generator(dir.path()).render("__TEMPLATE_MOVIE_GRID__", &catalog);
        assert!(page.contains("<div class=\"movie-year\">N/A</div>"));
    }

    #[test]
    fn generate_writes_page_to_output() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("template.html"), "<ul>__TEMPLATE_MOVIE_GRID__</ul>").unwrap();
        let mut catalog = Catalog::new();
        catalog.insert("Heat", Record::new("1995", "8.3", ""));
        let site = generator(dir.path());
        let written = site.generate(&catalog).unwrap();
        assert_eq!(written, site.output_path());
        assert!(fs::read_to_string(written).unwrap().contains("Heat"));
    }

    #[test]
    fn missing_template_is_reported() {
        let dir = tempdir().unwrap();
        let err = generator(dir.path()).generate(&Catalog::new()).unwrap_err();
        assert!(matches!(err, SiteError::TemplateMissing(_)));
    }

    #[test]
    fn opening_before_generating_is_reported() {
        let dir = tempdir().unwrap();
        let err = generator(dir.path()).open().unwrap_err();
        assert!(matches!(err, SiteError::PageMissing(_)));
    }

    #[cfg(unix)]
    #[test]
    fn launcher_that_exits_cleanly_is_success() {
        assert!(run_opener(Command::new("true")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn launcher_failure_status_is_reported() {
        let err = run_opener(Command::new("false")).unwrap_err();
        assert!(matches!(err, SiteError::OpenerExit(status) if !status.success()));
        assert!(err.to_string().starts_with("browser launcher failed:"));
    }

    #[test]
    fn missing_launcher_is_reported() {
        let err = run_opener(Command::new("movie-catalog-no-such-launcher")).unwrap_err();
        assert!(matches!(err, SiteError::Opener(_)));
    }
}
