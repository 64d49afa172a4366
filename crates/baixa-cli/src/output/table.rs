use baixa_core::model::Layout;
use baixa_core::report::{AutoCompleteReport, BatchReport, LayoutTestReport, RunStatus};
use baixa_core::select::status::StatusReport;

pub fn print_layout_test(report: &LayoutTestReport) {
    println!("=== {} (layout {}) ===\n", report.layout_name, report.layout_id);

    let width = report
        .per_field
        .iter()
        .map(|f| f.kind.as_str().len())
        .max()
        .unwrap_or(10);

    for field in &report.per_field {
        let marker = if field.passed { "ok" } else { "--" };
        let check = match field.satisfied {
            Some(true) => "self-test pass",
            Some(false) => "self-test fail",
            None => "no criteria",
        };
        match (&field.resolved_value, field.matched_via) {
            (Some(value), Some(via)) => println!(
                "  [{marker}] {:<width$}  {}  ({}; {check})",
                field.kind.as_str(),
                value,
                via,
                width = width
            ),
            _ => println!(
                "  [{marker}] {:<width$}  not found  ({check})",
                field.kind.as_str(),
                width = width
            ),
        }
    }

    println!("\nLines:");
    print_tokens(&report.raw_lines);
}

pub fn print_auto_complete(report: &AutoCompleteReport) {
    let extracted = &report.extracted;
    let done = &report.activity_completed;

    println!(
        "Layout: {} (score {})\n",
        report.layout_used.name, report.layout_used.score
    );
    println!("  Obrigação:   {}", extracted.obligation.as_deref().unwrap_or("-"));
    println!("  Inscrição:   {}", extracted.tax_id.as_deref().unwrap_or("-"));
    println!("  Competência: {}", extracted.period.as_deref().unwrap_or("-"));
    println!();
    println!(
        "  Completed: '{}' for {} ({}) at {}",
        done.activity_text, done.client_name, done.period, done.completed_at
    );
    if let Some(ref department) = done.department {
        println!("  Department: {department}");
    }
    if !done.archived {
        println!("  Warning: the document could not be archived");
    }
    if !done.notified {
        println!("  Warning: the tenant could not be notified");
    }
}

pub fn print_batch(report: &BatchReport) {
    println!(
        "{} file(s): {} completed, {} failed\n",
        report.total_files, report.success_count, report.failure_count
    );

    for result in &report.per_file_results {
        match result.status {
            RunStatus::Completed => {
                if let Some(ref r) = result.report {
                    println!(
                        "  ok    {}  -> {} ({}, {})",
                        result.filename,
                        r.activity_completed.activity_text,
                        r.activity_completed.client_name,
                        r.activity_completed.period
                    );
                }
            }
            RunStatus::Failed => println!(
                "  FAIL  {}  [{}] {}",
                result.filename,
                result.error_code.unwrap_or("error"),
                result.message.as_deref().unwrap_or("")
            ),
        }
    }
}

pub fn print_status(layout_id: i64, report: &StatusReport) {
    println!(
        "Layout {}: {} ({}/{} fields pass)",
        layout_id, report.status, report.fields_passed, report.fields_total
    );
}

pub fn print_layouts(layouts: &[Layout]) {
    if layouts.is_empty() {
        println!("No layouts configured.");
        return;
    }

    let width = layouts.iter().map(|l| l.name.len()).max().unwrap_or(10);
    for layout in layouts {
        let reference = layout
            .source_document
            .as_ref()
            .map(|d| d.filename.as_str())
            .unwrap_or("-");
        println!(
            "  {:>4}  {:<width$}  {:<10}  {}",
            layout.id,
            layout.name,
            layout.status.as_str(),
            reference,
            width = width
        );
    }
}

pub fn print_tokens(lines: &[String]) {
    for (i, line) in lines.iter().enumerate() {
        println!("  {:>3}  {}", i + 1, line);
    }
}
