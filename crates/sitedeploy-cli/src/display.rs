//! Display formatting for CLI output

use console::{StyledObject, style};

use sitedeploy_core::{DeploymentOutcome, DeploymentRequest, DeploymentStatus, PublishedVersion};

fn status_style(status: DeploymentStatus) -> StyledObject<&'static str> {
    match status {
        DeploymentStatus::Skipped => style(status.as_str()).dim(),
        DeploymentStatus::Success => style(status.as_str()).green(),
        DeploymentStatus::Failed => style(status.as_str()).red(),
    }
}

/// Print the parameters of a request, secret masked
pub fn print_request(request: &DeploymentRequest) {
    println!("{}", style("REQUEST").bold().underlined());
    for line in request.to_string().lines() {
        match line.split_once(": ") {
            Some((name, value)) => println!("  {:<22}{}", format!("{}:", name), style(value).cyan()),
            None => println!("  {}", line),
        }
    }
    println!();
}

pub fn print_outcome(outcome: &DeploymentOutcome) {
    println!("{}", style("OUTCOME").bold().underlined());
    println!("  Status:     {}", status_style(outcome.status));
    if let Some(version) = &outcome.resulting_version {
        println!("  Version:    {}", style(version).yellow());
    }
    if outcome.status == DeploymentStatus::Success {
        println!("  Published:  {} file(s)", outcome.files_published);
    }
    if let Some(failure) = &outcome.error {
        println!("  Error:      {}", style(failure.kind).red());
        println!("  Message:    {}", failure.message);
    }
    println!(
        "  Finished:   {}",
        outcome.finished_at.format("%Y-%m-%d %H:%M:%S")
    );
}

/// Print the published version, and whether it is the desired one
pub fn print_published(published: &PublishedVersion, desired: Option<&str>) {
    println!("{}", style("PUBLISHED").bold().underlined());
    println!("  Marker:     {}", published.marker);
    println!("  Version:    {}", style(&published.version).yellow());

    if let Some(desired) = desired {
        let verdict = if published.matches(desired) {
            style("up to date".to_string()).green()
        } else {
            style(format!("differs from {}", desired)).yellow()
        };
        println!("  Desired:    {}", verdict);
    }
}
