use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum DataError {
    Empty,
    LengthMismatch { dates: usize, values: usize },
    NonFinite { index: usize },
    DuplicateDate { date: NaiveDate },
    NonPositive { index: usize, value: f64 },
    UnknownWindow(String),
    EmptyWindow,
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Empty => write!(f, "time series is empty"),
            DataError::LengthMismatch { dates, values } => write!(
                f,
                "time series length mismatch: {} dates vs {} values",
                dates, values
            ),
            DataError::NonFinite { index } => {
                write!(f, "non-finite value at index {}", index)
            }
            DataError::DuplicateDate { date } => {
                write!(f, "duplicate date in time series: {}", date)
            }
            DataError::NonPositive { index, value } => write!(
                f,
                "holdings value must be positive: {} at index {}",
                value, index
            ),
            DataError::UnknownWindow(token) => {
                write!(f, "unknown window token: {:?}", token)
            }
            DataError::EmptyWindow => write!(f, "no observations inside the window"),
        }
    }
}

impl std::error::Error for DataError {}

/// A dated series of values or period returns, sorted by date.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub name: Option<String>,
}

impl TimeSeries {
    pub fn new(
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
        name: Option<String>,
    ) -> Result<Self, DataError> {
        if dates.is_empty() || values.is_empty() {
            return Err(DataError::Empty);
        }

        if dates.len() != values.len() {
            return Err(DataError::LengthMismatch {
                dates: dates.len(),
                values: values.len(),
            });
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(DataError::NonFinite { index });
        }

        let mut paired: Vec<(NaiveDate, f64)> = dates.into_iter().zip(values.into_iter()).collect();
        paired.sort_by_key(|(d, _)| *d);

        for pair in paired.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(DataError::DuplicateDate { date: pair[0].0 });
            }
        }

        let (sorted_dates, sorted_values): (Vec<_>, Vec<_>) = paired.into_iter().unzip();

        Ok(Self {
            dates: sorted_dates,
            values: sorted_values,
            name,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        if self.dates.is_empty() {
            None
        } else {
            Some((
                *self.dates.first().expect("len checked"),
                *self.dates.last().expect("len checked"),
            ))
        }
    }

    /// Restrict the series to a trailing window anchored at its last date.
    pub fn window(&self, window: Window) -> Result<TimeSeries, DataError> {
        let (_, last) = self.date_range().ok_or(DataError::Empty)?;

        let cutoff = match window.cutoff(last) {
            Some(cutoff) => cutoff,
            None => return Ok(self.clone()),
        };

        let start = self.dates.partition_point(|d| *d < cutoff);
        if start == self.dates.len() {
            return Err(DataError::EmptyWindow);
        }

        Ok(TimeSeries {
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
            name: self.name.clone(),
        })
    }
}

/// A trailing time restriction applied before aggregation.
///
/// Month and year windows subtract calendar months from the last observation
/// date; the to-date windows snap to the first day of the last date's month,
/// quarter, or year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    All,
    MonthToDate,
    QuarterToDate,
    YearToDate,
    ThreeMonths,
    SixMonths,
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
}

impl Default for Window {
    fn default() -> Self {
        Window::All
    }
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::All => "all",
            Window::MonthToDate => "mtd",
            Window::QuarterToDate => "qtd",
            Window::YearToDate => "ytd",
            Window::ThreeMonths => "3m",
            Window::SixMonths => "6m",
            Window::OneYear => "1y",
            Window::ThreeYears => "3y",
            Window::FiveYears => "5y",
            Window::TenYears => "10y",
        }
    }

    /// First date kept by this window for a series ending at `last`.
    ///
    /// `None` means no restriction, either for `All` or when the cutoff
    /// would fall before the calendar's supported range.
    pub fn cutoff(&self, last: NaiveDate) -> Option<NaiveDate> {
        match self {
            Window::All => None,
            Window::MonthToDate => NaiveDate::from_ymd_opt(last.year(), last.month(), 1),
            Window::QuarterToDate => {
                let month = ((last.month() - 1) / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(last.year(), month, 1)
            }
            Window::YearToDate => NaiveDate::from_ymd_opt(last.year(), 1, 1),
            Window::ThreeMonths => last.checked_sub_months(Months::new(3)),
            Window::SixMonths => last.checked_sub_months(Months::new(6)),
            Window::OneYear => last.checked_sub_months(Months::new(12)),
            Window::ThreeYears => last.checked_sub_months(Months::new(36)),
            Window::FiveYears => last.checked_sub_months(Months::new(60)),
            Window::TenYears => last.checked_sub_months(Months::new(120)),
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Window {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Window::All),
            "mtd" => Ok(Window::MonthToDate),
            "qtd" => Ok(Window::QuarterToDate),
            "ytd" => Ok(Window::YearToDate),
            "3m" => Ok(Window::ThreeMonths),
            "6m" => Ok(Window::SixMonths),
            "1y" => Ok(Window::OneYear),
            "3y" => Ok(Window::ThreeYears),
            "5y" => Ok(Window::FiveYears),
            "10y" => Ok(Window::TenYears),
            _ => Err(DataError::UnknownWindow(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn new_sorts_by_date() {
        let series = TimeSeries::new(
            vec![date(2023, 3, 1), date(2023, 1, 1), date(2023, 2, 1)],
            vec![3.0, 1.0, 2.0],
            None,
        )
        .expect("valid series");

        assert_eq!(series.dates[0], date(2023, 1, 1));
        assert_eq!(series.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn new_rejects_empty() {
        let err = TimeSeries::new(vec![], vec![], None).unwrap_err();
        assert!(matches!(err, DataError::Empty));
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = TimeSeries::new(vec![date(2023, 1, 1)], vec![1.0, 2.0], None).unwrap_err();
        assert!(matches!(
            err,
            DataError::LengthMismatch { dates: 1, values: 2 }
        ));
    }

    #[test]
    fn new_rejects_non_finite() {
        let err = TimeSeries::new(
            vec![date(2023, 1, 1), date(2023, 1, 2)],
            vec![0.01, f64::NAN],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::NonFinite { index: 1 }));

        let err = TimeSeries::new(vec![date(2023, 1, 1)], vec![f64::INFINITY], None).unwrap_err();
        assert!(matches!(err, DataError::NonFinite { index: 0 }));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let err = TimeSeries::new(
            vec![date(2023, 1, 2), date(2023, 1, 1), date(2023, 1, 2)],
            vec![1.0, 2.0, 3.0],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::DuplicateDate { .. }));
    }

    #[test]
    fn window_tokens_parse() {
        assert_eq!("all".parse::<Window>().unwrap(), Window::All);
        assert_eq!("mtd".parse::<Window>().unwrap(), Window::MonthToDate);
        assert_eq!("qtd".parse::<Window>().unwrap(), Window::QuarterToDate);
        assert_eq!("ytd".parse::<Window>().unwrap(), Window::YearToDate);
        assert_eq!("3m".parse::<Window>().unwrap(), Window::ThreeMonths);
        assert_eq!("6m".parse::<Window>().unwrap(), Window::SixMonths);
        assert_eq!("1y".parse::<Window>().unwrap(), Window::OneYear);
        assert_eq!("3y".parse::<Window>().unwrap(), Window::ThreeYears);
        assert_eq!("5y".parse::<Window>().unwrap(), Window::FiveYears);
        assert_eq!("10y".parse::<Window>().unwrap(), Window::TenYears);
        assert_eq!("YTD".parse::<Window>().unwrap(), Window::YearToDate);
    }

    #[test]
    fn window_unknown_token_fails() {
        let err = "2w".parse::<Window>().unwrap_err();
        assert!(matches!(err, DataError::UnknownWindow(token) if token == "2w"));
    }

    #[test]
    fn window_round_trips_through_display() {
        for window in [
            Window::All,
            Window::MonthToDate,
            Window::QuarterToDate,
            Window::YearToDate,
            Window::ThreeMonths,
            Window::SixMonths,
            Window::OneYear,
            Window::ThreeYears,
            Window::FiveYears,
            Window::TenYears,
        ] {
            assert_eq!(window.as_str().parse::<Window>().unwrap(), window);
        }
    }

    #[test]
    fn cutoff_calendar_aligned() {
        let last = date(2023, 8, 17);
        assert_eq!(Window::All.cutoff(last), None);
        assert_eq!(Window::MonthToDate.cutoff(last), Some(date(2023, 8, 1)));
        assert_eq!(Window::QuarterToDate.cutoff(last), Some(date(2023, 7, 1)));
        assert_eq!(Window::YearToDate.cutoff(last), Some(date(2023, 1, 1)));
    }

    #[test]
    fn cutoff_trailing_months() {
        let last = date(2023, 3, 15);
        assert_eq!(Window::ThreeMonths.cutoff(last), Some(date(2022, 12, 15)));
        assert_eq!(Window::OneYear.cutoff(last), Some(date(2022, 3, 15)));
        assert_eq!(Window::ThreeYears.cutoff(last), Some(date(2020, 3, 15)));

        // Month-end arithmetic clamps to the shorter month.
        assert_eq!(
            Window::ThreeMonths.cutoff(date(2023, 5, 31)),
            Some(date(2023, 2, 28))
        );
    }

    #[test]
    fn window_keeps_cutoff_date() {
        let series = TimeSeries::new(
            vec![
                date(2022, 3, 14),
                date(2022, 3, 15),
                date(2022, 9, 1),
                date(2023, 3, 15),
            ],
            vec![1.0, 2.0, 3.0, 4.0],
            None,
        )
        .expect("valid series");

        let windowed = series.window(Window::OneYear).expect("windowed");
        assert_eq!(
            windowed.dates,
            vec![date(2022, 3, 15), date(2022, 9, 1), date(2023, 3, 15)]
        );
        assert_eq!(windowed.values, vec![2.0, 3.0, 4.0]);

        let all = series.window(Window::All).expect("windowed");
        assert_eq!(all.len(), series.len());
    }
}
