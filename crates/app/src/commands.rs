use std::{fs, path::Path};

use api_types::{
    expense::ExpenseRecord,
    plaid::{PlaidTransaction, ScopeId, SubmitTransactions},
};
use expenses::{
    Aggregator, amount_of, category_of,
    dates::{format_short_date, month_name},
    format::{format_currency, snake_to_title_case, truncate_text},
    plaid::{known_keys, partition_new},
};
use link::{Client, FileTokenStore, LinkSession, LinkState, LinkToken, Url};
use serde::de::DeserializeOwned;

use crate::{
    config::{AppConfig, Command, DailyArgs, LinkArgs, SubmitArgs, SummaryArgs},
    error::{AppError, Result},
};

const DEFAULT_CURRENCY: &str = "USD";

pub async fn run(settings: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Link(args) => link(settings, args).await,
        Command::Status => status(settings).await,
        Command::Summary(args) => summary(settings, args),
        Command::Daily(args) => daily(settings, args),
        Command::Submit(args) => submit(settings, args).await,
    }
}

/// Reads a JSON document, treating `null` as the empty value.
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let value: Option<T> = serde_json::from_str(&content)?;
    Ok(value.unwrap_or_default())
}

fn currency_of(expense: &ExpenseRecord) -> &str {
    expense.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
}

async fn link(settings: &AppConfig, args: LinkArgs) -> Result<()> {
    let url = Url::parse(&args.url)
        .map_err(|err| AppError::InvalidInput(format!("page url {}: {err}", args.url)))?;
    let client = Client::new(&settings.base_url)?;
    let server = client.base_url().to_string();
    let store = FileTokenStore::new(&settings.token_store);
    let mut session = LinkSession::new(client, store);

    session.initialize(&url).await;

    println!("session:  {}", session.id());
    println!("server:   {server}");
    println!("store:    {}", session.store().path().display());
    print_state(session.state());
    Ok(())
}

fn print_state(state: &LinkState) {
    println!(
        "backend:  {}",
        if state.backend { "reachable" } else { "unreachable" }
    );
    println!("products: {}", state.products.join(", "));
    let flow = if state.is_payment_initiation {
        "payment initiation"
    } else if state.is_user_token_flow {
        "user token"
    } else {
        "standard"
    };
    println!("flow:     {flow}");
    if let Some(item_id) = &state.item_id {
        println!("item:     {item_id}");
    }
    match &state.link_token {
        LinkToken::Issued(token) => println!("link token: {token}"),
        LinkToken::Failed => println!("link token: failed, check the backend logs"),
        LinkToken::Unset => println!("link token: not issued"),
    }
    if !state.link_token_error.is_empty() {
        let error = &state.link_token_error;
        println!(
            "error:    {} {}: {}",
            snake_to_title_case(&error.error_type),
            error.error_code,
            error.message()
        );
    }
}

async fn status(settings: &AppConfig) -> Result<()> {
    let client = Client::new(&settings.base_url)?;
    let status = client.auth_status().await?;

    if !status.authenticated {
        println!("not authenticated");
        return Ok(());
    }
    let name = status
        .display_name
        .or(status.username)
        .unwrap_or_else(|| "unknown user".to_string());
    match status.email {
        Some(email) => println!("authenticated as {name} <{email}>"),
        None => println!("authenticated as {name}"),
    }
    Ok(())
}

fn summary(settings: &AppConfig, args: SummaryArgs) -> Result<()> {
    let expenses: Vec<ExpenseRecord> = read_json(&args.file)?;
    let aggregator = Aggregator::new(settings.tz()?);
    tracing::debug!(rows = expenses.len(), period = %args.period, "summarizing");

    let currency = expenses.first().map_or(DEFAULT_CURRENCY, currency_of);

    println!("Months");
    let groups = aggregator.to_month_groups(aggregator.group_by_month(&expenses));
    for group in &groups {
        println!(
            "  {:<16} {:>14}  ({} expenses)",
            group.month,
            format_currency(group.total, currency),
            group.expenses.len()
        );
    }

    let in_period: Vec<ExpenseRecord> = aggregator
        .filter_by_period(&expenses, args.period)
        .into_iter()
        .cloned()
        .collect();

    println!();
    println!(
        "Total ({}): {}",
        args.period,
        format_currency(aggregator.total_for_period(&expenses, args.period), currency)
    );

    println!();
    println!("Categories");
    for total in aggregator.category_totals(&in_period, args.limit) {
        println!(
            "  {:<24} {:>14}",
            truncate_text(&total.category, 24),
            format_currency(total.amount, currency)
        );
    }

    println!();
    println!("Top expenses");
    for expense in aggregator.top_expenses(&in_period, args.limit) {
        print_expense(&aggregator, expense);
    }

    println!();
    println!("Recent expenses");
    for expense in aggregator.recent_expenses(&expenses, args.limit) {
        print_expense(&aggregator, expense);
    }

    Ok(())
}

fn print_expense(aggregator: &Aggregator, expense: &ExpenseRecord) {
    let date = aggregator.date_of(expense).date();
    println!(
        "  {:<13} {:<24} {:>14}",
        format_short_date(date),
        truncate_text(&category_of(expense), 24),
        format_currency(amount_of(expense), currency_of(expense))
    );
}

fn daily(settings: &AppConfig, args: DailyArgs) -> Result<()> {
    let name = month_name(args.month)
        .ok_or_else(|| AppError::InvalidInput(format!("month {} is not 1-12", args.month)))?;
    let expenses: Vec<ExpenseRecord> = read_json(&args.file)?;
    let aggregator = Aggregator::new(settings.tz()?);
    let currency = expenses.first().map_or(DEFAULT_CURRENCY, currency_of);

    let totals = aggregator.daily_totals(&expenses, args.year, args.month);
    println!("{name} {}", args.year);
    for (day, total) in totals.iter().enumerate() {
        println!("  {:>2}  {:>14}", day + 1, format_currency(*total, currency));
    }
    println!("  total {}", format_currency(totals.iter().sum(), currency));
    Ok(())
}

async fn submit(settings: &AppConfig, args: SubmitArgs) -> Result<()> {
    let transactions: Vec<PlaidTransaction> = read_json(&args.file)?;
    let known = match &args.known {
        Some(path) => known_keys(&read_json::<Vec<ExpenseRecord>>(path)?),
        None => Default::default(),
    };

    let (fresh, summary) = partition_new(&transactions, &known);
    println!(
        "{} new, {} already imported",
        summary.new_transactions, summary.skipped
    );
    if fresh.is_empty() {
        return Ok(());
    }

    let payload = SubmitTransactions {
        scope_id: ScopeId::from(args.scope.as_str()),
        plaid_transactions: fresh.into_iter().cloned().collect(),
    };
    let client = Client::new(&settings.base_url)?;
    let ack = client.submit_plaid_transactions(&payload).await?;
    println!("{}", serde_json::to_string_pretty(&ack)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn scratch(content: &str) -> PathBuf {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_files");
        fs::create_dir_all(&root).unwrap();
        let path = root.join(format!("input_{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn null_document_reads_as_empty() {
        let path = scratch("null");
        let rows: Vec<ExpenseRecord> = read_json(&path).unwrap();
        assert!(rows.is_empty());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn reads_expense_rows() {
        let path = scratch(r#"[{"ExpenseDate": "2024-01-15", "Amount": "12.50", "Currency": "EUR"}]"#);
        let rows: Vec<ExpenseRecord> = read_json(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(currency_of(&rows[0]), "EUR");
        assert_eq!(amount_of(&rows[0]), 12.5);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_document_is_an_error() {
        let path = scratch("{not json");
        let result: Result<Vec<ExpenseRecord>> = read_json(&path);
        assert!(matches!(result, Err(AppError::Json(_))));
        fs::remove_file(path).unwrap();
    }
}
