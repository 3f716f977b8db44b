use clap::Args;
use serde::Serialize;
use sitegate_core::{is_blocking, load_settings, App, Clock, IdRange, RuleEngine, Settings};

use super::run::clock;

#[derive(Args)]
pub struct RulesArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Evaluate the window at this hour instead of the local time
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    hour: Option<u8>,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Status {
    settings: Settings,
    window: String,
    hour: u8,
    should_block: bool,
    owned: IdRange,
    held_rules: usize,
}

pub async fn list(app: App, args: RulesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rules = app.engine.rules().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("no rules");
    }
    for rule in rules {
        println!(
            "{:>6}  {:<40}  -> {}",
            rule.id,
            rule.url_filter(),
            rule.redirect_url().unwrap_or("(block)")
        );
    }
    Ok(())
}

pub async fn status(app: App, args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(app.store.as_ref()).await?;
    let window = settings.window()?;
    let hour = clock(args.hour).current_hour();
    let should_block = is_blocking(window.start_hour(), window.end_hour(), hour)?;
    let owned = IdRange::owned_within(
        &app.config.rules.reserved_range(),
        settings.blocked_sites.len(),
    )?;
    let held_rules = app.engine.rule_ids().await?.len();

    let status = Status {
        window: window.to_string(),
        settings,
        hour,
        should_block,
        owned,
        held_rules,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("window: {}", status.window);
        println!("hour: {:02}:00", status.hour);
        println!("blocking: {}", if status.should_block { "yes" } else { "no" });
        println!("sites: {}", status.settings.blocked_sites.len());
        println!("owned ids: {}", status.owned);
        println!("rules held by engine: {}", status.held_rules);
    }
    Ok(())
}
