mod tools;

use agent::{Agent, azure::AzureBackend, prompt};
use colored::Colorize;
use db::Database;
use db::sqlite::SqliteDatabase;
use tools::SqlToolkit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataSource {
    Local,
    Remote,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let conf = config::SlateConfig::get_or_default();

    cliclack::intro("Slate: chat with your database")?;

    let source: DataSource = cliclack::select("Choose the DB you want to chat with")
        .item(
            DataSource::Local,
            format!("Use SQLite3 database - {}", conf.database.path.display()),
            "",
        )
        .item(
            DataSource::Remote,
            "Connect to your SQL database",
            "not wired up yet",
        )
        .interact()?;

    if source == DataSource::Remote {
        cliclack::outro_cancel("Remote SQL databases are not supported yet.")?;
        return Ok(());
    }

    let mut azure = conf.azure.clone().resolved();
    if azure.api_key.is_none() {
        let key: String = cliclack::password("Azure OpenAI API key")
            .mask('*')
            .interact()
            .unwrap_or_default();
        if key.trim().is_empty() {
            cliclack::outro("Add the Azure OpenAI API key to start chatting.")?;
            return Ok(());
        }
        azure.api_key = Some(key);
    }
    if azure.endpoint.is_empty() {
        azure.endpoint = cliclack::input("Azure OpenAI endpoint")
            .placeholder("https://<resource>.openai.azure.com")
            .interact()?;
    }

    if !conf.database.path.exists() {
        cliclack::outro_cancel(format!(
            "{} not found. Run `slate-seed` to create it.",
            conf.database.path.display()
        ))?;
        return Ok(());
    }

    let database = SqliteDatabase::open_read_only(&conf.database.path).await?;
    let dialect = database.dialect();
    cliclack::log::info(format!("Using DB: {}", conf.database.path.display()))?;

    let backend = AzureBackend::new(&azure)?;
    let mut sql_agent = Agent::new(Box::new(backend), conf.agent.max_tool_rounds);
    sql_agent.set_system_prompt(prompt::system_prompt(dialect, conf.agent.top_k));
    sql_agent.set_tools(tools::toolkit_tools());

    let mut toolkit = SqlToolkit::new(Box::new(database));

    loop {
        let Ok(question) = cliclack::input("You")
            .placeholder("Ask about the data (Ctrl-C to quit)")
            .interact::<String>()
        else {
            break;
        };

        let spinner = cliclack::spinner();
        spinner.start("Thinking...");

        match sql_agent.run_turn(&question, &mut toolkit).await {
            Ok(answer) => {
                spinner.stop("Assistant".blue());
                println!("{}\n", answer.as_str().blue());
            }
            Err(err) => {
                spinner.error(err.to_string());
            }
        }
    }

    cliclack::outro("Bye!")?;

    Ok(())
}
