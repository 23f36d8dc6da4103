use anyhow::Result;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use course_catalog_server::course::CourseManager;
use course_catalog_server::{FullCatalogStore, SqliteCatalogStore, UserManager, UserRole};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

const DEFAULT_DB_FILE_NAME: &str = "catalog.db";

fn get_styles() -> Styles {
    let emphasis = |color| Style::new().bold().fg_color(Some(Color::Ansi(color)));
    Styles::styled()
        .usage(emphasis(AnsiColor::Yellow).underline())
        .header(emphasis(AnsiColor::Yellow).underline())
        .literal(emphasis(AnsiColor::Green))
        .invalid(emphasis(AnsiColor::Red))
        .error(emphasis(AnsiColor::Red))
        .valid(emphasis(AnsiColor::Green))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the catalog database, defaults to catalog.db in the current directory.
    #[clap(value_parser = parse_path)]
    pub path: Option<PathBuf>,
}

#[derive(Parser)]
#[command(styles=get_styles(),name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a course category with the given name.
    AddCategory { name: String },

    /// Shows all categories.
    Categories,

    /// Shows all registered users.
    Users,

    /// Changes the role of a user (student, teacher or admin).
    SetRole { email: String, role: String },

    /// Deletes a user together with the courses they own.
    DeleteUser { email: String },

    /// Shows the path of the current catalog db.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

struct Managers {
    users: UserManager,
    courses: CourseManager,
}

const PROMPT: &str = ">> ";

fn execute_command(line: String, managers: &Managers, db_path: String) -> CommandExecutionResult {
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
                InnerCommand::AddCategory { name } => match managers.courses.add_category(&name) {
                    Ok(category) => {
                        println!("Created category {} ({})", category.name, category.slug)
                    }
                    Err(err) => return CommandExecutionResult::Error(err.user_message()),
                },
                InnerCommand::Categories => match managers.courses.get_categories() {
                    Ok(categories) if categories.is_empty() => println!("(no categories)"),
                    Ok(categories) => {
                        for category in categories.iter() {
                            println!("{:>4}  {:<24} {}", category.id, category.slug, category.name);
                        }
                    }
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Users => match managers.users.get_all_users() {
                    Ok(users) if users.is_empty() => println!("(no users)"),
                    Ok(users) => {
                        for user in users.iter() {
                            println!(
                                "{:>4}  {:<8} {:<32} {}",
                                user.id, user.role, user.email, user.name
                            );
                        }
                    }
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::SetRole { email, role } => {
                    let role_enum = match UserRole::from_str(&role) {
                        Some(r) => r,
                        None => {
                            return CommandExecutionResult::Error(format!(
                                "Invalid role '{}'. Valid roles are: student, teacher, admin",
                                role
                            ));
                        }
                    };
                    match managers.users.set_user_role(&email, role_enum) {
                        Ok(user) => println!("User '{}' is now {}", user.email, user.role),
                        Err(err) => return CommandExecutionResult::Error(err.user_message()),
                    }
                }
                InnerCommand::DeleteUser { email } => {
                    match managers.users.force_delete_user(&email) {
                        Ok(courses) => println!(
                            "Deleted user '{}' and {} owned course(s)",
                            email, courses
                        ),
                        Err(err) => return CommandExecutionResult::Error(err.user_message()),
                    }
                }
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
struct CommandHelper {
    commands_names: Vec<String>,
}

impl CommandHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandHelper { commands_names }
    }
}

impl Completer for CommandHelper {
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

impl Highlighter for CommandHelper {}
impl Validator for CommandHelper {}
impl Helper for CommandHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let db_path = match cli_args.path {
        Some(path) => path,
        None => parse_path(DEFAULT_DB_FILE_NAME)?,
    };
    let store: Arc<dyn FullCatalogStore> = Arc::new(SqliteCatalogStore::new(&db_path)?);
    let managers = Managers {
        users: UserManager::new(store.clone()),
        courses: CourseManager::new(store),
    };

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<CommandHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(CommandHelper::new()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &managers, db_path.display().to_string()) {
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
