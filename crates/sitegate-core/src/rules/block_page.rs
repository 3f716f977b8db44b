//! The static notice page blocked navigations are redirected to.

use std::path::{Path, PathBuf};

use indoc::indoc;
use url::Url;

use crate::error::{ConfigError, Result};
use crate::storage::Config;

const FILE_NAME: &str = "block.html";

const PAGE: &str = indoc! {r#"
    <!DOCTYPE html>
    <html lang="en">
    <head>
      <meta charset="utf-8">
      <title>Blocked</title>
      <style>
        body { font-family: sans-serif; display: flex; align-items: center;
               justify-content: center; height: 100vh; margin: 0; background: #111; color: #eee; }
        main { text-align: center; }
      </style>
    </head>
    <body>
      <main>
        <h1>This site is blocked right now.</h1>
        <p>It will be available again when the block window ends.</p>
      </main>
    </body>
    </html>
"#};

pub fn path(data_dir: &Path) -> PathBuf {
    data_dir.join(FILE_NAME)
}

/// Write the notice page if it does not exist yet.
pub fn ensure(data_dir: &Path) -> Result<PathBuf> {
    let path = path(data_dir);
    if !path.exists() {
        std::fs::write(&path, PAGE)?;
    }
    Ok(path)
}

/// Redirect target for generated rules.
///
/// Uses `rules.redirect_url` when configured, otherwise the `file://` URL of
/// the page inside `data_dir`.
pub fn url(config: &Config, data_dir: &Path) -> Result<String> {
    let configured = config.rules.redirect_url.trim();
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }

    let absolute = if data_dir.is_absolute() {
        path(data_dir)
    } else {
        std::env::current_dir()?.join(path(data_dir))
    };
    let url = Url::from_file_path(&absolute).map_err(|_| ConfigError::InvalidValue {
        key: "rules.redirect_url".to_string(),
        message: format!("cannot build file URL for {}", absolute.display()),
    })?;
    Ok(url.to_string())
}
