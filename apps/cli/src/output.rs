use console::style;
use video_interpreter_core::{AnalysisResult, OptionsCatalog, render_plain};

pub fn print_catalog(catalog: &OptionsCatalog) {
    if let Some(notice) = catalog.notice() {
        eprintln!("{} {}", style("Error:").red().bold(), notice);
        return;
    }

    println!("\n{}", style("Analysis types").cyan().bold());
    for option in catalog.options() {
        println!(
            "  {:<24} {}",
            style(&option.key).green(),
            style(&option.description).dim()
        );
    }
    println!();
}

pub fn print_result(result: &AnalysisResult) {
    let heading = result
        .analysis_description
        .as_deref()
        .or(result.analysis_type.as_deref())
        .unwrap_or("Analysis");

    println!("\n{}", style(heading).cyan().bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("{}\n", render_plain(result.text(), "  "));
}

pub fn print_failure(result: &AnalysisResult, message: Option<&str>) {
    let message = message
        .or(result.error.as_deref())
        .unwrap_or("Analysis failed");
    eprintln!("\n{} {}", style("Error:").red().bold(), message);

    // Keep the raw backend error visible when the message replaced it.
    if let Some(raw) = result.error.as_deref()
        && raw != message
    {
        eprintln!("  {}", style(raw).dim());
    }
}
