mod stats;
mod utils;

pub use crate::stats::{
    Drawdown, DrawdownCurves, MonthlyReturnTable, MonthlyRow, all_drawdowns, compute_drawdown,
    compute_monthly_returns, compute_yearly_returns, max_drawdown, top_drawdowns,
};
pub use crate::utils::{DataError, TimeSeries, Window};
