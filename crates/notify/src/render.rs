use kawase_core::common::time::format_start_time;
use kawase_core::notify::entity::AlertReport;
use kawase_core::notify::error::NotifyError;

/// 报告标题，例如 `kawase: 2 pairs moved in the last 5 minutes`。
pub fn subject(report: &AlertReport) -> String {
    let count = report.alert_count();
    format!(
        "kawase: {} pair{} moved in the last {} minutes",
        count,
        if count == 1 { "" } else { "s" },
        report.interval.minutes()
    )
}

/// # Summary
/// 渲染纯文本正文，每个交易对一段。
///
/// # Logic
/// 1. 首行为报告时间与持仓数量。
/// 2. 按交易所分组输出涨跌幅、价格区间与持仓价值。
pub fn render_text(report: &AlertReport) -> String {
    let mut out = format!(
        "Report at {} (position: {} BTC)\n",
        format_start_time(&report.generated_at),
        report.bitcoin_amount
    );

    for (exchange, alerts) in &report.exchanges {
        out.push_str(&format!("\n[{}]\n", exchange));
        for alert in alerts {
            out.push_str(&format!(
                "{}: exchange rate {} changed by {:.4} percent in the last {} minutes\n",
                exchange,
                alert.symbol,
                alert.percent_change,
                report.interval.minutes()
            ));
            out.push_str(&format!(
                "  price {:.2} (min {:.2}, max {:.2}), difference {:.2}, total amount {:.2}\n",
                alert.price, alert.min_price, alert.max_price, alert.value_delta, alert.total_value
            ));
        }
    }
    out
}

/// Telegram 使用的 Markdown 正文。
pub fn render_markdown(report: &AlertReport) -> String {
    let mut out = format!("*{}*\n", subject(report));
    for (exchange, alerts) in &report.exchanges {
        out.push_str(&format!("\n*{}*\n", exchange));
        for alert in alerts {
            out.push_str(&format!(
                "`{}` {:+.4}% price {:.2} total {:.2}\n",
                alert.symbol, alert.percent_change, alert.price, alert.total_value
            ));
        }
    }
    out
}

/// 报告的 JSON 形式，作为邮件附件。
pub fn render_json(report: &AlertReport) -> Result<String, NotifyError> {
    serde_json::to_string_pretty(report).map_err(|e| NotifyError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kawase_core::common::Interval;
    use kawase_core::notify::entity::PairAlert;
    use std::collections::BTreeMap;

    fn report() -> AlertReport {
        let mut exchanges = BTreeMap::new();
        exchanges.insert(
            "Binance".to_string(),
            vec![PairAlert {
                symbol: "BTC-USDT".to_string(),
                price: 100.5,
                min_price: 99.5,
                max_price: 101.0,
                percent_change: 0.5,
                value_delta: 1.5,
                total_value: 301.5,
            }],
        );
        AlertReport {
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 5, 0).unwrap(),
            interval: Interval::Minute5,
            bitcoin_amount: 3.0,
            exchanges,
        }
    }

    #[test]
    fn test_subject() {
        assert_eq!(subject(&report()), "kawase: 1 pair moved in the last 5 minutes");
    }

    #[test]
    fn test_text_body() {
        let text = render_text(&report());
        assert!(text.starts_with("Report at 2026-03-01 12:05:00 (position: 3 BTC)"));
        assert!(text.contains("[Binance]"));
        assert!(text.contains("Binance: exchange rate BTC-USDT changed by 0.5000 percent in the last 5 minutes"));
        assert!(text.contains("total amount 301.50"));
    }

    #[test]
    fn test_markdown_body() {
        let md = render_markdown(&report());
        assert!(md.contains("*Binance*"));
        assert!(md.contains("`BTC-USDT` +0.5000%"));
    }

    #[test]
    fn test_json_attachment() {
        let json = render_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["interval_minutes"], 5);
        assert_eq!(value["exchanges"]["Binance"][0]["total_value"], 301.5);
    }
}
