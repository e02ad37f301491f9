use chrono::NaiveDate;
use portfolio_stats::{
    TimeSeries, Window, compute_drawdown, compute_monthly_returns, compute_yearly_returns,
    max_drawdown, top_drawdowns,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Build a simple fake daily return series for ~6 months
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let mut dates = Vec::new();
    let mut returns = Vec::new();

    for i in 0..180 {
        let date = start + chrono::Days::new(i);
        dates.push(date);

        // Simple pattern: small positive drift with some noise-like variation
        let r = match i % 7 {
            0 => 0.004,
            1 => -0.006,
            2 => 0.003,
            3 => -0.001,
            4 => 0.005,
            5 => -0.002,
            _ => 0.001,
        };
        returns.push(r);
    }

    let series = TimeSeries::new(dates, returns, Some("Demo Strategy".to_string()))?;

    let curves = compute_drawdown(&series, true)?;
    let worst = max_drawdown(&series, true)?;
    println!(
        "Final holdings {:.4}, max drawdown {:.2}%",
        curves.holdings.values.last().copied().unwrap_or(1.0),
        worst * 100.0
    );

    println!("Worst drawdown episodes:");
    for dd in top_drawdowns(&series, true, 3)? {
        println!(
            "  {} -> {} (trough {}): {:.2}% over {} observations",
            dd.start,
            dd.end,
            dd.trough,
            dd.depth * 100.0,
            dd.duration
        );
    }

    println!("Monthly returns:");
    let table = compute_monthly_returns(&series, Window::All)?;
    for row in table.rows() {
        print!("  {}:", row.year);
        for value in row.months.iter() {
            match value {
                Some(v) => print!(" {:6.2}%", v * 100.0),
                None => print!("      --"),
            }
        }
        println!();
    }

    println!("Yearly returns:");
    for (year, ret) in compute_yearly_returns(&series, Window::All)? {
        println!("  {}: {:.2}%", year, ret * 100.0);
    }

    Ok(())
}
