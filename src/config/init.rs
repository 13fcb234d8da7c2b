use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::schema::{validate_allocation, AllocationConfig};
use super::{get_config_path, save_config, Config};
use crate::scoring::{validate_scoring, Factor, ScoringConfig, WeightVector};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Parse a number and check it against `accept`, returning the reason on failure
fn parse_number(input: &str, accept: impl Fn(f64) -> bool, rule: &str) -> Result<f64, String> {
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() && accept(v) => Ok(v),
        Ok(_) => Err(format!("must be {}", rule)),
        Err(_) => Err(format!("not a number, must be {}", rule)),
    }
}

/// Keep asking until the answer parses and passes `accept`
fn prompt_number(
    message: &str,
    default: f64,
    accept: impl Fn(f64) -> bool,
    rule: &str,
) -> Result<f64> {
    loop {
        let input = prompt_with_default(message, &default.to_string())?;
        match parse_number(&input, &accept, rule) {
            Ok(v) => return Ok(v),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("charge-roi configuration wizard");
    println!("===============================");
    println!();

    // 1. Dataset
    println!("Point the tool at a JSON or YAML file with one record per country.");
    println!("Leave empty to use the built-in sample snapshot.");
    let dataset_input = prompt("Dataset file: ")?;
    let dataset = if dataset_input.is_empty() {
        None
    } else {
        Some(PathBuf::from(dataset_input))
    };

    // 2. Scoring
    println!();
    let configure_scoring = prompt_yes_no("Configure scoring? (n accepts defaults)", true)?;
    let scoring = if configure_scoring {
        println!();
        println!("Weights are exponents: 0 ignores a factor, 1 takes it as measured, 2 squares it.");
        let defaults = WeightVector::neutral();
        let mut weights = defaults;
        for factor in Factor::ALL {
            let value = prompt_number(
                &format!("Weight: {}", factor),
                defaults.get(factor),
                |v| v >= 0.0,
                "a non-negative number",
            )?;
            weights = weights.with(factor, value);
        }

        println!();
        println!("The margin of safety is the survival probability a market needs to be deployable.");
        let margin = prompt_number(
            "Margin of safety (0-1)",
            crate::scoring::DEFAULT_MARGIN_OF_SAFETY,
            |v| (0.0..=1.0).contains(&v),
            "between 0 and 1",
        )?;

        println!();
        println!("Markets below the stage threshold (adoption share in percent) are in takeoff.");
        let stage = prompt_number(
            "Stage threshold (%)",
            crate::scoring::DEFAULT_STAGE_THRESHOLD,
            |v| (0.0..=100.0).contains(&v),
            "between 0 and 100",
        )?;

        ScoringConfig {
            weights: Some(weights),
            scale: Some(crate::scoring::DEFAULT_SCALE),
            stage_threshold: Some(stage),
            margin_of_safety: Some(margin),
        }
    } else {
        ScoringConfig::default()
    };

    // 3. Allocation
    println!();
    let defaults = AllocationConfig::default();
    let total_capital = prompt_number(
        "Capital mandate (millions)",
        defaults.total_capital(),
        |v| v > 0.0,
        "a positive number",
    )?;
    let top_n = prompt_number(
        "Number of markets in the portfolio",
        defaults.top_n() as f64,
        |v| v >= 1.0 && v.fract() == 0.0,
        "a whole number of at least 1",
    )? as usize;
    let deployable_only = prompt_yes_no("Only allocate to markets that clear the margin of safety?", false)?;

    let allocation = AllocationConfig {
        total_capital: Some(total_capital),
        top_n: Some(top_n),
        deployable_only: Some(deployable_only),
    };

    // Prompts already enforce these, but the file must load cleanly later
    if let Err(errors) = validate_scoring(&scoring) {
        anyhow::bail!("Invalid scoring settings: {}", errors.join("; "));
    }
    if let Err(errors) = validate_allocation(&allocation) {
        anyhow::bail!("Invalid allocation settings: {}", errors.join("; "));
    }

    // 4. Config path
    let default_config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 5. Write config
    let config = Config {
        dataset,
        scoring: Some(scoring),
        allocation: Some(allocation),
        intel: None,
    };
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `charge-roi` to rank markets.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_accepts_valid() {
        assert_eq!(parse_number("1.5", |v| v >= 0.0, "non-negative"), Ok(1.5));
    }

    #[test]
    fn test_parse_number_rejects_rule_violation() {
        let err = parse_number("-1", |v| v >= 0.0, "non-negative").unwrap_err();
        assert_eq!(err, "must be non-negative");
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        let err = parse_number("lots", |v| v >= 0.0, "non-negative").unwrap_err();
        assert!(err.starts_with("not a number"));
    }

    #[test]
    fn test_parse_number_rejects_infinity() {
        assert!(parse_number("inf", |_| true, "finite").is_err());
    }
}
