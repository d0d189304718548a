use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use play_server::user::{SqliteUserStore, UserManager};

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
    /// Path of the user database, inferred when omitted.
    #[clap(value_parser = parse_path)]
    pub path: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a user with the given email.
    AddUser { email: String },

    /// Creates a password authentication for the given user.
    /// Fails if the user already has a password set.
    AddLogin { email: String, password: String },

    /// Change the password of a user, fails if no password was set.
    UpdateLogin { email: String, password: String },

    /// Deletes the password authentication for a given user.
    DeleteLogin { email: String },

    /// Shows authentication information of a given user.
    Show { email: String },

    /// Verifies the password of a given user, it doesn't make any
    /// persistent change, nor it creates any token, it just
    /// compares the password hash.
    CheckPassword { email: String, password: String },

    /// Shows all user emails.
    UserEmails,

    /// Shows the path of the current auth db.
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

fn check_password(user_manager: &UserManager, email: &str, password: &str) -> Result<String> {
    let Some(credentials) = user_manager.get_user_credentials(email)? else {
        anyhow::bail!("User {} not found.", email);
    };
    let Some(password_credentials) = credentials.email_password else {
        anyhow::bail!("User {} has no password set.", email);
    };
    let msg = match password_credentials.verify(password) {
        Ok(true) => "The password provided is correct!".to_string(),
        Ok(false) => "Wrong password.".to_string(),
        Err(err) => format!(
            "Could not verify the password, something went wrong: {}",
            err
        ),
    };
    Ok(msg)
}

fn show_user(user_manager: &UserManager, email: &str) -> Result<()> {
    let user_id = user_manager
        .get_user_id(email)?
        .with_context(|| format!("User {} not found.", email))?;
    println!("User id: {}", user_id);

    println!("\nUser Credentials:");
    println!("{:#?}", user_manager.get_user_credentials(email)?);

    println!("\nAuth Tokens:");
    for token in user_manager.get_user_tokens(email)?.iter() {
        println!("{:#?}", token);
    }
    Ok(())
}

fn execute_command(
    line: String,
    user_manager: &mut UserManager,
    db_path: String,
) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    let cli = match cli {
        Ok(cli) => cli,
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            return CommandExecutionResult::Ok;
        }
    };

    println!("{} {}", PROMPT, &line);
    let result = match cli.command {
        InnerCommand::AddUser { email } => user_manager
            .add_user(&email)
            .map(|id| println!("Created user {} with id {}", email, id)),
        InnerCommand::AddLogin { email, password } => {
            user_manager.create_password_credentials(&email, &password)
        }
        InnerCommand::UpdateLogin { email, password } => {
            user_manager.update_password_credentials(&email, &password)
        }
        InnerCommand::DeleteLogin { email } => user_manager.delete_password_credentials(&email),
        InnerCommand::Show { email } => show_user(user_manager, &email),
        InnerCommand::UserEmails => user_manager
            .get_all_user_emails()
            .map(|emails| println!("{:#?}", emails)),
        InnerCommand::Where => {
            println!("{}", db_path);
            Ok(())
        }
        InnerCommand::CheckPassword { email, password } => {
            check_password(user_manager, &email, &password).map(|msg| println!("{}", msg))
        }
        InnerCommand::Exit => return CommandExecutionResult::Exit,
    };

    match result {
        Ok(()) => CommandExecutionResult::Ok,
        Err(err) => CommandExecutionResult::Error(format!("{}", err)),
    }
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
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

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let auth_store_file_path = match cli_args.path {
        Some(path) => path,
        None => SqliteUserStore::infer_path().with_context(|| {
            "Could not infer UserStore DB file path, please specify it explicitly."
        })?,
    };
    let user_store = SqliteUserStore::new(auth_store_file_path.clone())?;
    let mut user_manager = UserManager::new(Box::new(user_store));

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;

    let helper = MyHelper::new();
    rl.set_helper(Some(helper));
    let _ = rl.clear_screen();

    loop {
        let readline = rl.readline(PROMPT);

        let _ = rl.clear_screen();
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(
                    line,
                    &mut user_manager,
                    auth_store_file_path.display().to_string(),
                ) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {:?}", err);
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
