pub mod formatter;

pub use formatter::{
    format_allocation_table, format_audit, format_money, format_percent, format_portfolio_table,
    format_portfolio_tsv, format_score, format_sweep, should_use_colors, to_json,
};
