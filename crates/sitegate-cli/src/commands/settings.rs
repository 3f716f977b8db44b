use clap::Subcommand;
use sitegate_core::{load_settings, App, SettingsForm};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one or more fields; unspecified fields keep their current text
    Edit {
        /// Comma-separated list of sites, e.g. "example.com, news.site"
        #[arg(long)]
        sites: Option<String>,
        /// Window start hour
        #[arg(long, allow_hyphen_values = true)]
        start: Option<String>,
        /// Window end hour
        #[arg(long, allow_hyphen_values = true)]
        end: Option<String>,
    },
}

pub async fn run(app: App, action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = app.store.as_ref();
    match action {
        SettingsAction::Show { json } => {
            let settings = load_settings(store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                println!("blocked_sites: {}", settings.blocked_sites.join(", "));
                println!("start_hour: {}", settings.start_hour);
                println!("end_hour: {}", settings.end_hour);
            }
        }
        SettingsAction::Edit { sites, start, end } => {
            let mut form = SettingsForm::load(store).await?;
            if let Some(sites) = sites {
                form.blocked_sites = sites;
            }
            if let Some(start) = start {
                form.start_hour = start;
            }
            if let Some(end) = end {
                form.end_hour = end;
            }
            form.submit(store).await?;
            println!("Settings saved!");
        }
    }
    Ok(())
}
