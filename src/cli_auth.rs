use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

use oversight_notifications::{SqliteUserStore, UserManager};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the user database, usually `<db_dir>/user.db`.
    #[clap(value_parser = parse_path)]
    pub path: PathBuf,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a user with the given handle and display name.
    AddUser {
        user_handle: String,
        display_name: String,
    },

    /// Sets the password of a user, replacing the previous one.
    SetPassword {
        user_handle: String,
        password: String,
    },

    /// Changes the display name shown as notification sender.
    Rename {
        user_handle: String,
        display_name: String,
    },

    /// Shows a user and whether it can log in.
    Show { user_handle: String },

    /// Lists all users.
    Users,

    /// Shows the path of the current user db.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

fn execute_command(line: String, user_manager: &UserManager, db_path: &str) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            match cli.command {
                InnerCommand::AddUser {
                    user_handle,
                    display_name,
                } => match user_manager.add_user(&user_handle, &display_name) {
                    Ok(user_id) => println!("Created user {} with id {}", user_handle, user_id),
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::SetPassword {
                    user_handle,
                    password,
                } => {
                    if let Err(err) = user_manager.set_password(&user_handle, &password) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    println!("Password updated for {}", user_handle);
                }
                InnerCommand::Rename {
                    user_handle,
                    display_name,
                } => {
                    if let Err(err) = user_manager.rename_user(&user_handle, &display_name) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                }
                InnerCommand::Show { user_handle } => {
                    let user = match user_manager.get_user_by_handle(&user_handle) {
                        Ok(Some(user)) => user,
                        Ok(None) => {
                            return CommandExecutionResult::Error(format!(
                                "User {} not found.",
                                user_handle
                            ))
                        }
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    };
                    println!("{:#?}", user);
                    match user_manager.has_password(&user_handle) {
                        Ok(true) => println!("Password: set"),
                        Ok(false) => println!("Password: not set"),
                        Err(err) => println!("Failed to read credentials: {}", err),
                    }
                }
                InnerCommand::Users => match user_manager.get_all_users() {
                    Ok(users) if users.is_empty() => println!("(no users)"),
                    Ok(users) => {
                        for user in users {
                            println!("  - {} ({})", user.handle, user.display_name);
                        }
                    }
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Where => {
                    println!("{}", db_path);
                }
                InnerCommand::Exit => return CommandExecutionResult::Exit,
            }
        }

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct CommandsHelper {
    commands_names: Vec<String>,
}

impl CommandsHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandsHelper { commands_names }
    }
}

impl Completer for CommandsHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(" ") {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandsHelper {}
impl Validator for CommandsHelper {}
impl Helper for CommandsHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let user_store = SqliteUserStore::new(&cli_args.path)?;
    let user_manager = UserManager::new(Arc::new(user_store));
    let db_path = cli_args.path.display().to_string();

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<CommandsHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(CommandsHelper::new()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &user_manager, &db_path) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
