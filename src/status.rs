use anyhow::Result;

use crate::config::Config;
use crate::processed;

/// Print the configuration summary. Reads state files but never creates them.
pub fn print_status(config: &Config) -> Result<()> {
    let processed_path = &config.state.processed_path;
    let processed_count = match processed::count_keys(processed_path)? {
        Some(n) => format!("({} records)", n),
        None => "(not created)".to_string(),
    };

    println!("{:<16} {}", "SETTING", "VALUE");
    println!("{:<16} {}", "registry", config.registry.index_url());
    println!("{:<16} {}", "token", config.registry.token_url());
    println!("{:<16} {}", "award search", config.awards.search_url());
    println!(
        "{:<16} {}",
        "funders",
        if config.matching.funder_ids.is_empty() {
            "(any)".to_string()
        } else {
            config.matching.funder_ids.join(", ")
        }
    );
    println!(
        "{:<16} borderline {}..={}, accept >= {}, author trust >= {}",
        "thresholds",
        config.matching.borderline_floor,
        config.matching.accept_threshold,
        config.matching.accept_threshold,
        config.matching.author_trust_threshold
    );
    println!(
        "{:<16} {} {}",
        "processed",
        processed_path.display(),
        processed_count
    );
    println!("{:<16} {}", "findings", config.state.findings_path.display());

    Ok(())
}
