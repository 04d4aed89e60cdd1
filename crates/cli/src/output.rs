//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use kiosk_errors::KioskError;
use kiosk_profile::LlmMenu;
use kiosk_profile_repository::{CommitId, HistoryEntry};
use kiosk_schemas::Profile;
use serde_json::{Value, json};

use crate::error::error_type;

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let mut body = json!({
        "message": format!("{error:#}"),
        "type": error_type(error),
    });
    let issues = error
        .downcast_ref::<KioskError>()
        .and_then(KioskError::validation_issues);
    if let (Some(issues), Some(map)) = (issues, body.as_object_mut()) {
        let issues: Vec<Value> = issues
            .iter()
            .map(|issue| json!({ "path": issue.path, "message": issue.message }))
            .collect();
        map.insert("issues".to_string(), Value::Array(issues));
    }
    print_json(&json!({ "success": false, "error": body }));
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }

    if let Some(issues) = error
        .downcast_ref::<KioskError>()
        .and_then(KioskError::validation_issues)
    {
        for issue in issues {
            eprintln!("  {} {}", "-".red(), issue);
        }
    }
}

/// Print success message
pub fn print_success(message: &str, json: bool) {
    if json {
        print_json(&json!({ "success": true, "message": message }));
    } else {
        println!("{} {}", "✓".green(), message);
    }
}

/// Print a profile summary, or the whole document when `full`.
pub fn print_profile(profile: &Profile, full: bool, json: bool) {
    if json {
        let document = if full {
            serde_json::to_value(profile).unwrap_or(Value::Null)
        } else {
            profile_summary(profile)
        };
        print_json(&json!({ "success": true, "profile": document }));
        return;
    }
    if full {
        match serde_json::to_string_pretty(profile) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format profile: {e}"),
        }
        return;
    }

    let store = &profile.store_info;
    println!("{} {}", store.name.bold(), format!("({})", store.currency).dimmed());
    println!("  Profile: {} v{}", profile.id.cyan(), profile.version);
    println!("  Updated: {}", profile.updated_at);
    if let Some(phone) = &store.phone {
        println!("  Phone:   {phone}");
    }
    if let Some(address) = &store.address {
        println!("  Address: {address}");
    }

    println!("\n{}", "Menu:".bold());
    let mut categories: Vec<_> = profile.menu.categories.iter().collect();
    categories.sort_by_key(|category| category.display_order);
    for category in categories {
        let available = category.items.iter().filter(|item| item.available).count();
        let marker = if category.available {
            "●".green()
        } else {
            "○".red()
        };
        println!(
            "  {} {} {}",
            marker,
            category.name,
            format!("{available}/{} items available", category.items.len()).dimmed()
        );
    }

    let active = profile.promotions.iter().filter(|p| p.active).count();
    println!(
        "\n{} {active} active / {} total",
        "Promotions:".bold(),
        profile.promotions.len()
    );
    println!(
        "{} theme {:?}, language {}, voice {}",
        "Settings:".bold(),
        profile.settings.theme,
        profile.settings.language,
        if profile.settings.voice_enabled {
            "on"
        } else {
            "off"
        }
    );
}

fn profile_summary(profile: &Profile) -> Value {
    json!({
        "id": profile.id,
        "version": profile.version,
        "updatedAt": profile.updated_at,
        "storeName": profile.store_info.name,
        "currency": profile.store_info.currency,
        "categories": profile.menu.categories.len(),
        "items": profile.menu.categories.iter().map(|c| c.items.len()).sum::<usize>(),
        "promotions": profile.promotions.len(),
    })
}

/// Print a newly created commit.
pub fn print_commit(verb: &str, entry: &HistoryEntry, json: bool) {
    if json {
        print_json(&json!({ "success": true, "commit": entry }));
    } else {
        println!(
            "{} {} {} {}",
            "✓".green(),
            verb,
            entry.id.short().yellow(),
            entry.message
        );
    }
}

/// Print history entries, newest first.
pub fn print_history(entries: &[HistoryEntry], total: usize, json: bool) {
    if json {
        print_json(&json!({ "success": true, "total": total, "commits": entries }));
        return;
    }
    if entries.is_empty() {
        println!("{}", "No commits".yellow());
        return;
    }
    for entry in entries {
        let author = entry
            .author
            .as_deref()
            .map(|author| format!(" <{author}>"))
            .unwrap_or_default();
        println!(
            "{} {}{} {}",
            entry.id.short().yellow(),
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            author.cyan(),
            entry.message
        );
    }
    if total > entries.len() {
        println!("{}", format!("({} of {total} commits)", entries.len()).dimmed());
    }
}

/// Print change lines between two commits, or of one commit.
pub fn print_changes(from: Option<&CommitId>, to: &CommitId, lines: &[String], json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "from": from,
            "to": to,
            "changes": lines,
        }));
        return;
    }
    match from {
        Some(from) => println!(
            "{} {} → {}",
            "Changes".bold(),
            from.short().yellow(),
            to.short().yellow()
        ),
        None => println!("{} {}", "Commit".bold(), to.short().yellow()),
    }
    if lines.is_empty() {
        println!("  {}", "No changes".dimmed());
    }
    for line in lines {
        let colored = match line.split_whitespace().next() {
            Some("add") => line.green(),
            Some("remove") => line.red(),
            _ => line.normal(),
        };
        println!("  {colored}");
    }
}

/// Print the orderable menu.
pub fn print_menu(menu: &LlmMenu, json: bool) {
    if json {
        print_json(&json!({ "success": true, "menu": menu }));
        return;
    }
    println!("{} {}", menu.store_name.bold(), format!("({})", menu.currency).dimmed());
    if menu.categories.is_empty() {
        println!("{}", "Nothing available to order".yellow());
    }
    for category in &menu.categories {
        println!("\n{}", category.name.bold());
        for item in &category.items {
            let popular = if item.popular == Some(true) {
                " ★".yellow().to_string()
            } else {
                String::new()
            };
            println!("  {} {}{}", item.name, format_price(item.price).cyan(), popular);
            for group in &item.option_groups {
                let options: Vec<String> = group
                    .options
                    .iter()
                    .map(|option| {
                        if option.price > 0.0 {
                            format!("{} +{}", option.name, format_price(option.price))
                        } else {
                            option.name.clone()
                        }
                    })
                    .collect();
                let required = if group.required { "*" } else { "" };
                println!(
                    "    {}{}: {}",
                    group.name.dimmed(),
                    required.red(),
                    options.join(", ")
                );
            }
        }
    }
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}
