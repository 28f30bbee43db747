use console::{Style, StyledObject};
use parley_core::ComparisonResult;
use parley_core::completion::ModelResponse;
use parley_core::metrics::Metrics;

/// Kind of output line, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Provider heading above a response.
    Heading,
    /// Metrics or status information.
    Footer,
    Success,
    Error,
}

pub fn style_text(text: &str, style: MessageType) -> StyledObject<&str> {
    let style_obj = match style {
        MessageType::Heading => Style::new().blue().bold(),
        MessageType::Footer => Style::new().white().dim(),
        MessageType::Success => Style::new().green(),
        MessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

/// Formats the metrics of one response into a single plain-text line.
pub fn format_metrics(metrics: &Metrics) -> String {
    let mut details = vec![format!("{:.2}s", metrics.response_time_ms / 1000.0)];

    if metrics.tokens_per_second > 0.0 {
        details.push(format!("{:.2} tokens/s", metrics.tokens_per_second));
    }
    if let Some(tokens) = metrics.completion_tokens {
        details.push(format!("{tokens} completion tokens"));
    }
    if let Some(tokens) = metrics.prompt_tokens {
        details.push(format!("{tokens} prompt tokens"));
    }
    if let Some(cost) = metrics.cost {
        details.push(format!("${cost:.4}"));
    }
    if let Some(ctx) = metrics.context_size {
        details.push(format!("{ctx} ctx"));
    }
    if let Some(mb) = metrics.memory_usage_mb {
        details.push(format!("{mb:.0} MB"));
    }

    format!("◼ {}", details.join(". "))
}

fn format_response(response: &ModelResponse) -> String {
    let heading = format!("▶ {} ({} · {})", response.config_id, response.provider, response.model);
    format!(
        "{}\n{}\n{}\n",
        style_text(&heading, MessageType::Heading),
        response.text.trim(),
        style_text(&format_metrics(&response.metrics), MessageType::Footer)
    )
}

/// Renders a whole comparison: successful responses fastest first, then one
/// notice per failed provider and a summary line.
pub fn format_comparison(result: &ComparisonResult) -> String {
    let mut successful: Vec<_> = result.successful().collect();
    successful.sort_by(|a, b| {
        a.metrics
            .response_time_ms
            .total_cmp(&b.metrics.response_time_ms)
    });

    let mut sections: Vec<String> = successful.into_iter().map(format_response).collect();

    let failures: Vec<String> = result
        .failed()
        .map(|r| {
            let notice = format!(
                "✗ {} ({}): {}",
                r.config_id,
                r.provider,
                r.error.as_deref().unwrap_or_default()
            );
            style_text(&notice, MessageType::Error).to_string()
        })
        .collect();
    if !failures.is_empty() {
        sections.push(failures.join("\n"));
    }

    let failed = result.failed().count();
    let mut summary = format!(
        "Compared {} providers in {:.2}s",
        result.responses.len(),
        result.total_time_ms / 1000.0
    );
    if failed > 0 {
        summary.push_str(&format!(" ({failed} failed)"));
    }
    summary.push('.');
    sections.push(style_text(&summary, MessageType::Footer).to_string());

    sections.join("\n")
}
