use clap::Parser;
use sheet_directory::core::export::{write_records, ExportFormat};
use sheet_directory::utils::error::ErrorCategory;
use sheet_directory::utils::logger;
use sheet_directory::{loader_from_config, CliConfig, Command, LookupError, SessionState, TomlConfig};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(cli.verbose, None);
            exit_with(&e);
        }
    };

    if cli.json_logs || config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("Starting sheet-directory");
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = run(cli.command, &config).await {
        exit_with(&e);
    }
}

fn exit_with(e: &LookupError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.category() {
        ErrorCategory::Input => 1,
        ErrorCategory::Retrieval => 2,
        ErrorCategory::Source => 3,
        ErrorCategory::Configuration => 4,
        ErrorCategory::System => 5,
    };
    std::process::exit(exit_code);
}

async fn run(command: Command, config: &TomlConfig) -> sheet_directory::Result<()> {
    let mut state = config.session_state()?;

    match command {
        Command::Fields => print_fields(&state),
        Command::List => {
            load_into(&mut state, config).await?;
            println!("Records available: {}", state.records().len());
            if let Some(updated) = state.last_update() {
                println!("Last update: {}", updated.format("%Y-%m-%d %H:%M:%S"));
            }
            let required = state.schema().required_key().to_string();
            for record in state.preview() {
                println!("  {}", record.get(&required));
            }
        }
        Command::Search { term } => {
            load_into(&mut state, config).await?;
            state.set_search_term(&term);
            let matches = state.suggestions();
            if matches.is_empty() {
                println!("No matches for '{}'", term);
            }
            let required = state.schema().required_key();
            for i in matches {
                println!("{}", state.records()[i].get(required));
            }
        }
        Command::Show {
            name,
            columns,
            group,
            all,
            json,
        } => {
            load_into(&mut state, config).await?;
            let index = find_record(&mut state, &name)?;
            if all {
                state.select_all();
            } else if let Some(group) = group {
                state.select_group(&group)?;
            } else if !columns.is_empty() {
                state.set_columns(&columns)?;
            }

            let record = state.select_record(index)?.clone();
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", record.get(state.schema().required_key()));
                for (label, value) in state.display_fields(&record) {
                    println!("  {}: {}", label, value);
                }
            }
        }
        Command::Get { name, field } => {
            load_into(&mut state, config).await?;
            let index = find_record(&mut state, &name)?;
            if !state.schema().contains(&field) {
                return Err(LookupError::ValidationError {
                    message: format!("Unknown field '{}'", field),
                });
            }
            let record = &state.records()[index];
            match state.field_value(record, &field) {
                Some(value) => println!("{}", value),
                None => {
                    return Err(LookupError::ValidationError {
                        message: format!("Field '{}' is empty for this record", field),
                    })
                }
            }
        }
        Command::Export { format, columns } => {
            let format: ExportFormat = format.parse()?;
            load_into(&mut state, config).await?;
            if !columns.is_empty() {
                state.set_columns(&columns)?;
            }
            let stdout = std::io::stdout();
            write_records(
                stdout.lock(),
                state.records(),
                state.selected_columns(),
                state.schema(),
                format,
            )?;
        }
    }

    Ok(())
}

async fn load_into(state: &mut SessionState, config: &TomlConfig) -> sheet_directory::Result<()> {
    let loader = loader_from_config(config)?;
    let records = loader.load().await?;
    state.apply_load(Ok(records));
    Ok(())
}

/// Exact (case-insensitive) name match first, else the first suggestion.
fn find_record(state: &mut SessionState, name: &str) -> sheet_directory::Result<usize> {
    if let Some(index) = state.find_by_name(name) {
        return Ok(index);
    }

    state.set_search_term(name);
    state
        .suggestions()
        .first()
        .copied()
        .ok_or_else(|| LookupError::ValidationError {
            message: format!("No record matches '{}'", name),
        })
}

fn print_fields(state: &SessionState) {
    println!("Fields:");
    for field in state.schema().fields() {
        let marker = if field.required { " (required)" } else { "" };
        println!("  {:<16} {}{}", field.key, field.label, marker);
    }
    println!("Column groups:");
    for group in state.groups() {
        println!("  {}: {}", group.name, group.columns.join(", "));
    }
}
