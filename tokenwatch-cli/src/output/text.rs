//! Text output formatting with colors.

use tokenwatch_core::{ConsumptionSummary, CostSummary, Period, Platform};

use super::{PlatformSummary, PlatformTotals};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats a per-model usage report for one platform.
    pub fn format_usage(
        &self,
        platform: Platform,
        period: Period,
        combined: &ConsumptionSummary,
        per_model: &[ConsumptionSummary],
    ) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} Token Usage - last {}",
            self.bold(platform.display_name()),
            period.label()
        ));
        lines.push("─".repeat(56));

        if combined.is_empty() {
            lines.push(self.dim("No usage in this period"));
            return lines.join("\n");
        }

        lines.push(format!(
            "{:<28} {:>10} {:>10} {:>6}",
            self.bold("Model"),
            self.bold("Input"),
            self.bold("Output"),
            self.bold("Reqs")
        ));
        for summary in per_model {
            let name = if summary.model.is_empty() {
                "(unattributed)"
            } else {
                summary.model.as_str()
            };
            lines.push(format!(
                "{:<28} {:>10} {:>10} {:>6}",
                name,
                format_number(summary.total_input_tokens),
                format_number(summary.total_output_tokens),
                summary.total_requests
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Total tokens:   {} ({} in / {} out)",
            self.cyan(&format_number(combined.total_tokens)),
            format_number(combined.total_input_tokens),
            format_number(combined.total_output_tokens)
        ));
        lines.push(format!("Total requests: {}", combined.total_requests));

        lines.join("\n")
    }

    /// Formats a per-model cost report for one platform.
    pub fn format_cost(
        &self,
        platform: Platform,
        period: Period,
        combined: &CostSummary,
        per_model: &[CostSummary],
    ) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} Cost Report - last {}",
            self.bold(platform.display_name()),
            period.label()
        ));
        lines.push("─".repeat(56));

        if combined.is_empty() {
            lines.push(self.dim("No costs in this period"));
            return lines.join("\n");
        }

        lines.push(format!(
            "{:<28} {:>12}",
            self.bold("Model"),
            self.bold("Cost")
        ));
        for summary in per_model {
            let name = if summary.model.is_empty() {
                "(unattributed)"
            } else {
                summary.model.as_str()
            };
            lines.push(format!(
                "{:<28} {:>12}",
                name,
                format_money(summary.total_cost, &summary.currency)
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Total cost: {}",
            self.green(&format_money(combined.total_cost, &combined.currency))
        ));

        lines.join("\n")
    }

    /// Formats the combined summary across platforms.
    pub fn format_summary(&self, period: Period, summaries: &[PlatformSummary]) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} - last {}",
            self.bold("tokenwatch Summary"),
            period.label()
        ));
        lines.push("─".repeat(56));

        let mut combined = PlatformTotals {
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            requests: 0,
            total_cost: 0.0,
            currency: String::new(),
        };
        let mut successes = 0;

        for summary in summaries {
            let name = summary.platform.display_name();
            match &summary.result {
                Ok(totals) => {
                    successes += 1;
                    lines.push(format!(
                        "{:<10} {:>12} tokens {:>6} reqs {:>12}",
                        name,
                        format_number(totals.total_tokens),
                        totals.requests,
                        format_money(totals.total_cost, &totals.currency)
                    ));
                    combined.input_tokens += totals.input_tokens;
                    combined.output_tokens += totals.output_tokens;
                    combined.total_tokens += totals.total_tokens;
                    combined.requests += totals.requests;
                    combined.total_cost += totals.total_cost;
                    if combined.currency.is_empty() {
                        combined.currency = totals.currency.clone();
                    }
                }
                Err(e) => {
                    lines.push(format!("{:<10} {} - {}", name, self.red("Error"), e));
                }
            }
        }

        // Failed platforms are excluded from the combined totals.
        if successes > 1 {
            lines.push(String::new());
            lines.push(format!(
                "Combined: {} tokens, {} requests, {}",
                self.cyan(&format_number(combined.total_tokens)),
                combined.requests,
                self.green(&format_money(combined.total_cost, &combined.currency))
            ));
        }

        lines.join("\n")
    }

    /// Formats an error message for one platform.
    pub fn format_error(&self, platform: &str, error: &str) -> String {
        format!("{}: {} - {}", self.bold(platform), self.red("Error"), error)
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            format!("{BOLD}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.use_colors {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        if self.use_colors {
            format!("{GREEN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.use_colors {
            format!("{RED}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn cyan(&self, text: &str) -> String {
        if self.use_colors {
            format!("{CYAN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Formats a token count with thousands grouping above 10k.
fn format_number(n: i64) -> String {
    let abs = n.abs() as f64;
    if abs >= 1_000_000.0 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Formats a monetary amount with its currency code.
fn format_money(amount: f64, currency: &str) -> String {
    match currency {
        "" => format!("{amount:.2}"),
        "usd" | "USD" => format!("${amount:.2}"),
        other => format!("{amount:.2} {}", other.to_uppercase()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokenwatch_core::Consumption;

    fn sample_summary() -> (ConsumptionSummary, Vec<ConsumptionSummary>) {
        let start = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 11, 8, 0, 0, 0).unwrap();

        let records = vec![
            Consumption::new(Platform::OpenAi, "gpt-4o", 1552, 330, 12, start, end),
            Consumption::new(Platform::OpenAi, "gpt-4o-mini", 2000, 800, 1, start, end),
        ];

        let mut combined =
            ConsumptionSummary::new(Platform::OpenAi, "", Period::Week, start, end);
        for r in &records {
            combined.add_consumption(r);
        }
        let per_model = tokenwatch_core::summarize_consumption_by_model(
            Platform::OpenAi,
            Period::Week,
            (start, end),
            &records,
        );
        (combined, per_model)
    }

    #[test]
    fn test_format_usage_plain() {
        let (combined, per_model) = sample_summary();
        let formatter = TextFormatter::new(false);
        let output = formatter.format_usage(Platform::OpenAi, Period::Week, &combined, &per_model);

        assert!(output.contains("OpenAI Token Usage"));
        assert!(output.contains("gpt-4o"));
        assert!(output.contains("gpt-4o-mini"));
        assert!(output.contains("4682"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_format_usage_empty() {
        let start = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let combined = ConsumptionSummary::new(Platform::OpenAi, "", Period::Week, start, start);
        let formatter = TextFormatter::new(false);
        let output = formatter.format_usage(Platform::OpenAi, Period::Week, &combined, &[]);
        assert!(output.contains("No usage in this period"));
    }

    #[test]
    fn test_format_summary_reports_failures() {
        let formatter = TextFormatter::new(false);
        let summaries = vec![PlatformSummary {
            platform: Platform::OpenAi,
            result: Err("authentication failed".to_string()),
        }];
        let output = formatter.format_summary(Period::Week, &summaries);
        assert!(output.contains("OpenAI"));
        assert!(output.contains("authentication failed"));
        assert!(!output.contains("Combined:"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(500), "500");
        assert_eq!(format_number(9999), "9999");
        assert_eq!(format_number(15_000), "15.0K");
        assert_eq!(format_number(1_500_000), "1.5M");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(3.25, "usd"), "$3.25");
        assert_eq!(format_money(3.25, "eur"), "3.25 EUR");
        assert_eq!(format_money(0.0, ""), "0.00");
    }
}
